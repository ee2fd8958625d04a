//! 客服会话（凭证 + 登录状态）
//!
//! 一个 `AgentSession` 对应一次登录，由同步客户端和上层共享。

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

/// 应用用户类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AppUserType {
    /// 客服端
    #[default]
    Agent,
    /// 访客端（不能调用客服接口）
    Customer,
}

/// 客服角色：1=管理员，其余为普通客服
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "i32", into = "i32")]
pub enum AgentUserType {
    #[default]
    Agent,
    Admin,
}

impl From<i32> for AgentUserType {
    fn from(v: i32) -> Self {
        if v == 1 {
            AgentUserType::Admin
        } else {
            AgentUserType::Agent
        }
    }
}

impl From<AgentUserType> for i32 {
    fn from(v: AgentUserType) -> Self {
        match v {
            AgentUserType::Admin => 1,
            AgentUserType::Agent => 2,
        }
    }
}

/// 客服登录凭证（对应登录接口返回的 data）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCredentials {
    #[serde(rename = "access_token")]
    pub access_token: String,
    #[serde(default)]
    pub business_id: i64,
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub en_user_id: String,
    /// 客服 ID，<= 0 视为未登录
    #[serde(rename = "id", default)]
    pub agent_id: i64,
    #[serde(rename = "agent_type", default)]
    pub user_type: AgentUserType,
    /// 业务配置：非管理员是否隐藏“全部会话”
    #[serde(default)]
    pub hide_all_chat: bool,
}

impl AgentCredentials {
    /// 当前客服是否可以拉取“全部会话”
    pub fn can_view_all_chats(&self) -> bool {
        self.user_type == AgentUserType::Admin || !self.hide_all_chat
    }
}

/// 客服会话
pub struct AgentSession {
    app_user_type: AppUserType,
    credentials: RwLock<Option<AgentCredentials>>,
    login_in_progress: AtomicBool,
}

impl Default for AgentSession {
    fn default() -> Self {
        Self::new(AppUserType::Agent)
    }
}

impl AgentSession {
    pub fn new(app_user_type: AppUserType) -> Self {
        Self {
            app_user_type,
            credentials: RwLock::new(None),
            login_in_progress: AtomicBool::new(false),
        }
    }

    /// 使用已有凭证创建会话
    pub fn with_credentials(credentials: AgentCredentials) -> Self {
        let session = Self::default();
        session.set_credentials(credentials);
        session
    }

    pub fn app_user_type(&self) -> AppUserType {
        self.app_user_type
    }

    pub fn set_credentials(&self, credentials: AgentCredentials) {
        *self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(credentials);
    }

    /// 退出登录时清除凭证
    pub fn clear(&self) {
        *self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// 当前凭证（可能为空）
    pub fn credentials(&self) -> Option<AgentCredentials> {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 可以调用客服接口的凭证：必须是客服端且 agent_id > 0
    pub fn agent_credentials(&self) -> Option<AgentCredentials> {
        if self.app_user_type != AppUserType::Agent {
            return None;
        }
        self.credentials().filter(|c| c.agent_id > 0)
    }

    pub fn is_login_in_progress(&self) -> bool {
        self.login_in_progress.load(Ordering::Acquire)
    }

    pub fn set_login_in_progress(&self, value: bool) {
        self.login_in_progress.store(value, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(agent_id: i64) -> AgentCredentials {
        AgentCredentials {
            access_token: "token-1".into(),
            business_id: 7,
            user_id: 11,
            en_user_id: "en-11".into(),
            agent_id,
            user_type: AgentUserType::Agent,
            hide_all_chat: false,
        }
    }

    #[test]
    fn agent_credentials_require_positive_id() {
        let session = AgentSession::with_credentials(creds(0));
        assert!(session.credentials().is_some());
        assert!(session.agent_credentials().is_none());

        session.set_credentials(creds(42));
        assert_eq!(session.agent_credentials().map(|c| c.agent_id), Some(42));

        session.clear();
        assert!(session.agent_credentials().is_none());
    }

    #[test]
    fn customer_app_never_has_agent_credentials() {
        let session = AgentSession::new(AppUserType::Customer);
        session.set_credentials(creds(42));
        assert!(session.agent_credentials().is_none());
    }

    #[test]
    fn hide_all_chat_only_applies_to_non_admins() {
        let mut c = creds(1);
        c.hide_all_chat = true;
        assert!(!c.can_view_all_chats());
        c.user_type = AgentUserType::Admin;
        assert!(c.can_view_all_chats());
    }

    #[test]
    fn credentials_deserialize_from_login_payload() {
        let c: AgentCredentials = serde_json::from_value(serde_json::json!({
            "access_token": "abc",
            "business_id": 3,
            "user_id": 9,
            "en_user_id": "en9",
            "id": 5,
            "agent_type": 1
        }))
        .unwrap();
        assert_eq!(c.agent_id, 5);
        assert_eq!(c.user_type, AgentUserType::Admin);
        assert!(!c.hide_all_chat);
    }
}
