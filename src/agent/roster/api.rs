//! 客服列表 / 在线状态 HTTP API

use crate::agent::error::SyncError;
use crate::agent::roster::models::Agent;
use crate::agent::transport::{endpoints, request_tag, HttpTransport, Params};
use crate::agent::types::parse_envelope;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// 客服相关的 HTTP API 客户端
#[derive(Clone)]
pub struct RosterApi {
    transport: Arc<dyn HttpTransport>,
}

impl RosterApi {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// 获取当前业务下的所有客服
    pub async fn get_agents(&self, params: Params) -> Result<Vec<Agent>, SyncError> {
        let response = self
            .transport
            .post(endpoints::GET_AGENTS, request_tag::CONCURRENT, params)
            .await
            .map_err(SyncError::Network)?;
        let data = parse_envelope(&response, "客服列表")?.into_data()?;
        let raw = data
            .get("agents")
            .cloned()
            .filter(Value::is_array)
            .ok_or_else(|| SyncError::Parse("data 中缺少 agents 数组".to_string()))?;
        let agents: Vec<Agent> = serde_json::from_value(raw)
            .map_err(|e| SyncError::Parse(format!("客服列表格式错误: {}", e)))?;
        info!("[AgentAPI] ✅ 客服列表响应，客服数: {}", agents.len());
        Ok(agents)
    }

    /// 修改当前客服在线状态
    pub async fn change_status(&self, params: Params) -> Result<(), SyncError> {
        let response = self
            .transport
            .post(endpoints::AGENT_STATUS, request_tag::CONCURRENT, params)
            .await
            .map_err(SyncError::Network)?;
        parse_envelope(&response, "客服状态")?;
        Ok(())
    }
}
