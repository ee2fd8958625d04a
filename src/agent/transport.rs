//! HTTP 传输层
//!
//! 同步客户端只依赖 `HttpTransport`，默认实现基于 reqwest。

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// 客服端接口路径
pub mod endpoints {
    pub const GET_CONVERSATIONS: &str = "/api/conversation/v2/getConversations";
    pub const LOGIN_VIA_AUTH: &str = "/api/agent/agentLoginViaAuthToken";
    pub const GET_UNREAD_COUNT: &str = "/api/conversation/getUnreadCount";
    pub const MARK_CONVERSATION: &str = "/api/conversation/markConversation";
    pub const ASSIGN_AGENT: &str = "/api/agent/assignAgent";
    pub const GET_AGENTS: &str = "/api/agent/getAgents";
    pub const AGENT_STATUS: &str = "/api/agent/changeStatus";
    pub const GET_BOT_ACTIONS: &str = "/api/agent/getBotActions";
}

/// 请求标识（同一类请求共用一个 tag，原样回传）
pub mod request_tag {
    pub const GET_MY_CONVERSATION: &str = "get_my_conversation";
    pub const GET_ALL_CONVERSATION: &str = "get_all_conversation";
    pub const CONCURRENT: &str = "concurrent";
}

/// 请求参数（JSON 对象）
pub type Params = Map<String, Value>;

/// 原始 HTTP 响应
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP 状态码
    pub status: u16,
    /// 响应体原文
    pub body: String,
    /// 调用方传入的请求标识
    pub tag: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP 传输接口
///
/// 只要求异步返回、回传 tag、允许并发请求。
/// `Err` 只表示网络层失败；HTTP 状态码和响应体由调用方解析。
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post(&self, endpoint: &str, tag: &str, params: Params) -> Result<HttpResponse>;
}

/// 基于 reqwest 的默认传输实现
pub struct ReqwestTransport {
    client: reqwest::Client,
    api_base_url: String,
}

impl ReqwestTransport {
    /// 创建传输层，`timeout` 作用于整个请求
    pub fn new(api_base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::ClientBuilder::new()
            .timeout(timeout)
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                headers
            })
            .build()
            .context("创建 HTTP 客户端失败")?;
        Ok(Self::with_client(client, api_base_url))
    }

    /// 使用外部配置好的 reqwest 客户端
    pub fn with_client(client: reqwest::Client, api_base_url: impl Into<String>) -> Self {
        let api_base_url: String = api_base_url.into();
        Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.api_base_url, endpoint)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(&self, endpoint: &str, tag: &str, params: Params) -> Result<HttpResponse> {
        let operation_id = Uuid::new_v4().to_string();
        let url = self.url(endpoint);

        info!("[AgentAPI] 📡 POST {} (tag: {})", endpoint, tag);
        debug!("[AgentAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("operationID", &operation_id)
            .json(&params)
            .send()
            .await
            .context("请求失败")?;

        let status = response.status().as_u16();
        let body = response.text().await.context("读取响应失败")?;
        debug!("[AgentAPI]   HTTP状态: {}, 响应长度: {}", status, body.len());

        Ok(HttpResponse {
            status,
            body,
            tag: tag.to_string(),
        })
    }
}
