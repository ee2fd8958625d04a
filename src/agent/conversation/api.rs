//! 客服会话 HTTP API
//!
//! 负责会话相关的请求发送和响应解析，不持有任何状态

use crate::agent::conversation::models::{BotAction, Conversation, ConversationBatch};
use crate::agent::error::SyncError;
use crate::agent::session::AgentCredentials;
use crate::agent::transport::{endpoints, request_tag, HttpTransport, Params};
use crate::agent::types::parse_envelope;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 会话相关的 HTTP API 客户端
#[derive(Clone)]
pub struct ConversationApi {
    transport: Arc<dyn HttpTransport>,
}

impl ConversationApi {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    async fn post(&self, endpoint: &str, tag: &str, params: Params) -> Result<Value, SyncError> {
        let response = self
            .transport
            .post(endpoint, tag, params)
            .await
            .map_err(SyncError::Network)?;
        parse_envelope(&response, endpoint)?.into_data()
    }

    /// 拉取一页会话列表
    ///
    /// 返回解析成功的会话和服务器返回的原始条目数
    pub async fn get_conversations(
        &self,
        tag: &str,
        params: Params,
    ) -> Result<ConversationBatch, SyncError> {
        debug!("[AgentAPI] 会话列表请求参数: {:?}", params);
        let data = self.post(endpoints::GET_CONVERSATIONS, tag, params).await?;
        let list = data
            .get("conversation_list")
            .and_then(Value::as_array)
            .ok_or_else(|| SyncError::Parse("data 中缺少 conversation_list 数组".to_string()))?;

        let conversations = Conversation::parse_list(list);
        info!(
            "[AgentAPI] ✅ 会话列表响应，条目数: {}，有效会话数: {}",
            list.len(),
            conversations.len()
        );
        debug!(
            "[AgentAPI]   会话ID: {:?}",
            conversations
                .iter()
                .map(|c| c.channel_id)
                .collect::<Vec<_>>()
        );
        Ok(ConversationBatch {
            conversations,
            received_count: list.len(),
        })
    }

    /// 通过授权 token 登录客服账号
    pub async fn login_via_auth(
        &self,
        params: Params,
    ) -> Result<AgentCredentials, SyncError> {
        let data = self
            .post(endpoints::LOGIN_VIA_AUTH, request_tag::CONCURRENT, params)
            .await?;
        serde_json::from_value(data)
            .map_err(|e| SyncError::Parse(format!("登录响应格式错误: {}", e)))
    }

    /// 修改会话状态（关闭 / 重新打开）
    pub async fn mark_conversation(&self, params: Params) -> Result<(), SyncError> {
        let response = self
            .transport
            .post(endpoints::MARK_CONVERSATION, request_tag::CONCURRENT, params)
            .await
            .map_err(SyncError::Network)?;
        parse_envelope(&response, "修改会话状态")?;
        Ok(())
    }

    /// 把会话分配给指定客服
    pub async fn assign_agent(&self, params: Params) -> Result<(), SyncError> {
        let response = self
            .transport
            .post(endpoints::ASSIGN_AGENT, request_tag::CONCURRENT, params)
            .await
            .map_err(SyncError::Network)?;
        parse_envelope(&response, "分配会话")?;
        Ok(())
    }

    /// 获取机器人动作列表
    pub async fn get_bot_actions(&self, params: Params) -> Result<Vec<BotAction>, SyncError> {
        let data = self
            .post(
                endpoints::GET_BOT_ACTIONS,
                request_tag::GET_ALL_CONVERSATION,
                params,
            )
            .await?;
        let items = data
            .as_array()
            .ok_or_else(|| SyncError::Parse("机器人动作 data 不是数组".to_string()))?;
        Ok(items
            .iter()
            .filter_map(|item| match serde_json::from_value(item.clone()) {
                Ok(action) => Some(action),
                Err(e) => {
                    warn!("[AgentAPI]   跳过无效机器人动作: {}", e);
                    None
                }
            })
            .collect())
    }
}
