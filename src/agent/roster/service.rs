//! 客服列表服务层

use crate::agent::conversation::models::SyncClientConfig;
use crate::agent::db::create_sqlite_pool;
use crate::agent::error::SyncError;
use crate::agent::roster::api::RosterApi;
use crate::agent::roster::dao::AgentDao;
use crate::agent::roster::models::{Agent, AgentStatus};
use crate::agent::session::AgentSession;
use crate::agent::transport::{HttpTransport, Params};
use anyhow::Result;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// 客服列表与在线状态管理
pub struct AgentRoster {
    api: RosterApi,
    session: Arc<AgentSession>,
    /// 本地缓存，未配置时只走网络
    dao: Option<AgentDao>,
    device_type: i32,
    lang_code: String,
}

impl AgentRoster {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        session: Arc<AgentSession>,
        dao: Option<AgentDao>,
        device_type: i32,
    ) -> Self {
        Self {
            api: RosterApi::new(transport),
            session,
            dao,
            device_type,
            lang_code: "en".to_string(),
        }
    }

    /// 使用配置中的 `cache_db_url` 打开客服列表缓存
    pub async fn open(
        transport: Arc<dyn HttpTransport>,
        session: Arc<AgentSession>,
        config: &SyncClientConfig,
    ) -> Result<Self> {
        let pool = create_sqlite_pool(&config.cache_db_url).await?;
        Ok(Self::new(
            transport,
            session,
            Some(AgentDao::new(pool)),
            config.device_type,
        ))
    }

    pub fn with_lang_code(mut self, lang_code: impl Into<String>) -> Self {
        self.lang_code = lang_code.into();
        self
    }

    /// 拉取客服列表并写入缓存（缓存失败只记录日志）
    pub async fn get_agents_list(&self) -> Result<Vec<Agent>, SyncError> {
        let creds = self
            .session
            .agent_credentials()
            .ok_or(SyncError::NoSession)?;
        let mut params = Params::new();
        params.insert("access_token".into(), json!(creds.access_token));
        params.insert("business_id".into(), json!(creds.business_id));

        let agents = self.api.get_agents(params).await?;
        if let Some(dao) = &self.dao {
            if let Err(e) = dao.replace_agents(creds.business_id, &agents).await {
                warn!("[Roster] ⚠️ 缓存客服列表失败: {:?}", e);
            }
        }
        Ok(agents)
    }

    /// 读取缓存的客服列表
    pub async fn cached_agents(&self) -> Result<Vec<Agent>> {
        let (Some(dao), Some(creds)) = (&self.dao, self.session.credentials()) else {
            return Ok(Vec::new());
        };
        dao.get_agents(creds.business_id).await
    }

    /// 修改当前客服的在线状态
    pub async fn agent_status_update(&self, status: AgentStatus) -> Result<(), SyncError> {
        let creds = self
            .session
            .agent_credentials()
            .ok_or(SyncError::NoSession)?;
        let mut params = Params::new();
        params.insert("access_token".into(), json!(creds.access_token));
        params.insert("en_user_id".into(), json!(creds.en_user_id));
        params.insert("business_id".into(), json!(creds.business_id));
        params.insert("device_type".into(), json!(self.device_type));
        params.insert("online_status".into(), json!(status.as_str()));
        params.insert("lang_code".into(), json!(self.lang_code));

        self.api.change_status(params).await?;
        info!("[Roster] ✅ 客服状态已更新: {}", status.as_str());

        if let Some(dao) = &self.dao {
            if let Err(e) = dao
                .update_status(creds.business_id, creds.agent_id, status)
                .await
            {
                warn!("[Roster] ⚠️ 更新本地客服状态失败: {:?}", e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::error::ErrorKind;
    use crate::agent::testing::{agent_session, MockTransport};
    use crate::agent::transport::endpoints;

    async fn roster(transport: Arc<MockTransport>, session: Arc<AgentSession>) -> AgentRoster {
        let pool = create_sqlite_pool("sqlite::memory:").await.unwrap();
        AgentRoster::new(transport, session, Some(AgentDao::new(pool)), 2)
    }

    #[tokio::test]
    async fn agents_are_fetched_and_cached() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(json!({
            "statusCode": 200,
            "data": {"agents": [
                {"user_id": 5, "full_name": "Me", "online_status": "AVAILABLE", "agent_type": 1},
                {"user_id": 6, "full_name": "Other", "online_status": "OFFLINE"}
            ]}
        }));
        let r = roster(transport.clone(), agent_session(5)).await;

        let agents = r.get_agents_list().await.unwrap();
        assert_eq!(agents.len(), 2);
        assert_eq!(transport.calls()[0].params["business_id"], 7);

        let cached = r.cached_agents().await.unwrap();
        assert_eq!(cached, agents);
    }

    #[tokio::test]
    async fn status_update_sends_params_and_updates_cache() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(json!({
            "statusCode": 200,
            "data": {"agents": [{"user_id": 5, "online_status": "AVAILABLE"}]}
        }));
        transport.push_json(json!({"statusCode": 200}));
        let r = roster(transport.clone(), agent_session(5)).await;
        r.get_agents_list().await.unwrap();

        r.agent_status_update(AgentStatus::Away).await.unwrap();

        let call = &transport.calls()[1];
        assert_eq!(call.endpoint, endpoints::AGENT_STATUS);
        assert_eq!(call.params["online_status"], "AWAY");
        assert_eq!(call.params["lang_code"], "en");
        assert_eq!(r.cached_agents().await.unwrap()[0].online_status, AgentStatus::Away);
    }

    #[tokio::test]
    async fn open_uses_configured_cache_database() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(json!({
            "statusCode": 200,
            "data": {"agents": [{"user_id": 5, "online_status": "AWAY"}]}
        }));
        let mut config = SyncClientConfig::new("http://localhost");
        config.cache_db_url = "sqlite::memory:".to_string();
        config.device_type = 4;
        let r = AgentRoster::open(transport.clone(), agent_session(5), &config)
            .await
            .unwrap();

        r.get_agents_list().await.unwrap();
        assert_eq!(r.cached_agents().await.unwrap().len(), 1);
        assert_eq!(r.device_type, 4);
    }

    #[tokio::test]
    async fn operations_require_session() {
        let transport = Arc::new(MockTransport::new());
        let r = AgentRoster::new(transport.clone(), Arc::new(AgentSession::default()), None, 2);
        assert_eq!(
            r.get_agents_list().await.unwrap_err().kind(),
            ErrorKind::Composition
        );
        assert!(r.agent_status_update(AgentStatus::Offline).await.is_err());
        assert!(r.cached_agents().await.unwrap().is_empty());
        assert_eq!(transport.call_count(), 0);
    }
}
