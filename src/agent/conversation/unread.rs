//! 未读数刷新
//!
//! 会话列表拉取成功后以“发出即不管”的方式触发，不影响主请求结果。

use crate::agent::conversation::store::ConversationStore;
use crate::agent::session::AgentSession;
use crate::agent::transport::{endpoints, request_tag, HttpTransport, Params};
use crate::agent::types::parse_envelope;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 未读数来源
#[async_trait]
pub trait UnreadCountSource: Send + Sync {
    /// 拉取最新未读数并写入本地缓存
    async fn refresh(&self) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct ChannelUnread {
    channel_id: i64,
    #[serde(default)]
    unread_count: i64,
}

/// 基于 HTTP 接口的未读数来源
pub struct UnreadCountApi {
    transport: Arc<dyn HttpTransport>,
    session: Arc<AgentSession>,
    store: Arc<ConversationStore>,
    device_type: i32,
}

impl UnreadCountApi {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        session: Arc<AgentSession>,
        store: Arc<ConversationStore>,
        device_type: i32,
    ) -> Self {
        Self {
            transport,
            session,
            store,
            device_type,
        }
    }
}

#[async_trait]
impl UnreadCountSource for UnreadCountApi {
    async fn refresh(&self) -> Result<()> {
        let creds = self
            .session
            .agent_credentials()
            .ok_or_else(|| anyhow!("没有有效的客服会话"))?;

        let mut params = Params::new();
        params.insert("access_token".into(), json!(creds.access_token));
        params.insert("en_user_id".into(), json!(creds.en_user_id));
        params.insert("device_type".into(), json!(self.device_type));

        let response = self
            .transport
            .post(endpoints::GET_UNREAD_COUNT, request_tag::CONCURRENT, params)
            .await?;
        let data = parse_envelope(&response, "未读数")?.into_data()?;

        let counts: Vec<ChannelUnread> = serde_json::from_value(data)?;
        info!("[Unread] ✅ 未读数响应，会话数: {}", counts.len());
        for c in counts.iter().filter(|c| c.unread_count > 0) {
            debug!(
                "[Unread]   channel_id={}, unread_count={}",
                c.channel_id, c.unread_count
            );
        }
        self.store
            .store_unread_counts(counts.into_iter().map(|c| (c.channel_id, c.unread_count)));
        Ok(())
    }
}

/// 不做任何事的未读数来源
pub struct NoopUnreadCountSource;

#[async_trait]
impl UnreadCountSource for NoopUnreadCountSource {
    async fn refresh(&self) -> Result<()> {
        warn!("[Unread] 未配置未读数来源，跳过刷新");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{agent_session, MockTransport};

    #[tokio::test]
    async fn refresh_fills_store_cache() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(json!({
            "statusCode": 200,
            "data": [
                {"channel_id": 1, "unread_count": 4},
                {"channel_id": 2}
            ]
        }));
        let store = Arc::new(ConversationStore::new());
        let api = UnreadCountApi::new(transport.clone(), agent_session(5), store.clone(), 2);

        api.refresh().await.unwrap();

        assert_eq!(store.stored_unread_count(1), Some(4));
        assert_eq!(store.stored_unread_count(2), Some(0));
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].endpoint, endpoints::GET_UNREAD_COUNT);
        assert_eq!(calls[0].params["en_user_id"], "en-5");
    }

    #[tokio::test]
    async fn refresh_without_session_makes_no_call() {
        let transport = Arc::new(MockTransport::new());
        let api = UnreadCountApi::new(
            transport.clone(),
            Arc::new(AgentSession::default()),
            Arc::new(ConversationStore::new()),
            2,
        );
        assert!(api.refresh().await.is_err());
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn noop_source_always_succeeds() {
        assert!(NoopUnreadCountSource.refresh().await.is_ok());
    }
}
