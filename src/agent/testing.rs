//! 单测共用的辅助工具：脚本化的 HTTP 传输层、凭证和会话构造

use crate::agent::conversation::models::Conversation;
use crate::agent::session::{AgentCredentials, AgentSession, AgentUserType};
use crate::agent::transport::{HttpResponse, HttpTransport, Params};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};
use tokio::sync::Semaphore;

static INIT_LOGGER: Once = Once::new();

pub(crate) fn init_test_logger() {
    INIT_LOGGER.call_once(|| {
        use tracing_subscriber::prelude::*;
        use tracing_subscriber::EnvFilter;

        let filter_layer = EnvFilter::new("info,hippo_agent_sdk_rust=debug,sqlx=info");

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_file(true)
            .with_line_number(true)
            .with_target(false)
            .with_test_writer();

        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .init();
    });
}

/// 一次记录下来的请求
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub endpoint: String,
    pub tag: String,
    pub params: Params,
}

/// 按顺序返回预设响应的传输层
///
/// 设置了闸门时，每个请求在返回前要拿到一个许可（`add_permits`）
pub(crate) struct MockTransport {
    replies: Mutex<VecDeque<Result<HttpResponse>>>,
    calls: Mutex<Vec<RecordedCall>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            gate: Mutex::new(None),
        }
    }

    pub fn push_response(&self, status: u16, body: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            body: body.into(),
            tag: String::new(),
        }));
    }

    pub fn push_json(&self, body: Value) {
        self.push_response(200, body.to_string());
    }

    pub fn push_network_error(&self, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(anyhow!(message.to_string())));
    }

    /// 之后的请求都会阻塞，直到闸门放出许可
    pub fn hold(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn post(&self, endpoint: &str, tag: &str, params: Params) -> Result<HttpResponse> {
        self.calls.lock().unwrap().push(RecordedCall {
            endpoint: endpoint.to_string(),
            tag: tag.to_string(),
            params,
        });
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("没有预设的响应: {}", endpoint)));

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }

        reply.map(|mut r| {
            r.tag = tag.to_string();
            r
        })
    }
}

pub(crate) fn agent_credentials(agent_id: i64) -> AgentCredentials {
    AgentCredentials {
        access_token: format!("token-{}", agent_id),
        business_id: 7,
        user_id: 11,
        en_user_id: format!("en-{}", agent_id),
        agent_id,
        user_type: AgentUserType::Agent,
        hide_all_chat: false,
    }
}

pub(crate) fn agent_session(agent_id: i64) -> Arc<AgentSession> {
    Arc::new(AgentSession::with_credentials(agent_credentials(agent_id)))
}

pub(crate) fn conversation(channel_id: i64, unread_count: i64) -> Conversation {
    Conversation {
        channel_id,
        user_id: channel_id * 10,
        label: format!("visitor {}", channel_id),
        last_message: None,
        unread_count,
        channel_status: 1,
        agent_id: None,
        agent_name: None,
        last_updated_at: None,
        extra: Map::new(),
    }
}

/// 会话列表成功响应，channel_id 从 `first_id` 起连续编号，每条未读数为 1
pub(crate) fn conversation_page(first_id: i64, count: usize) -> Value {
    let list: Vec<Value> = (0..count as i64)
        .map(|i| {
            json!({
                "channel_id": first_id + i,
                "label": format!("visitor {}", first_id + i),
                "unread_count": 1,
                "channel_status": 1
            })
        })
        .collect();
    json!({
        "statusCode": 200,
        "message": "Successful",
        "data": { "conversation_list": list }
    })
}
