//! 通用响应处理
//!
//! 所有客服接口返回同一种包装：`{"statusCode": 200, "message": "...", "data": {...}}`

use crate::agent::error::SyncError;
use crate::agent::transport::HttpResponse;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, error};

/// 业务成功状态码
pub const STATUS_CODE_SUCCESS: i64 = 200;

/// 统一的响应包装结构体
/// `statusCode` 缺失时以 HTTP 状态码为准
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope {
    #[serde(rename = "statusCode")]
    pub status_code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// 字段为 `null` 时按缺省值处理（配合 `#[serde(default)]` 使用）
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// 通用响应处理：检查 HTTP 状态、解析 JSON、检查业务状态码
///
/// 返回包装结构体，调用方再从 `data` 中取需要的字段
pub fn parse_envelope(
    response: &HttpResponse,
    operation_name: &str,
) -> Result<ApiEnvelope, SyncError> {
    if !response.is_success() {
        error!(
            "[AgentAPI] {}请求失败，HTTP状态: {}, 响应: {}",
            operation_name, response.status, response.body
        );
        return Err(SyncError::HttpStatus {
            status: response.status,
            body: response.body.clone(),
        });
    }

    let envelope: ApiEnvelope = serde_json::from_str(&response.body).map_err(|e| {
        error!(
            "[AgentAPI] {}反序列化失败: {:?}\n原始响应: {}",
            operation_name, e, response.body
        );
        SyncError::MalformedBody(e)
    })?;

    let status_code = envelope
        .status_code
        .unwrap_or_else(|| i64::from(response.status));
    if status_code != STATUS_CODE_SUCCESS {
        error!(
            "[AgentAPI] {}服务器错误，状态码: {}, 错误信息: {}",
            operation_name,
            status_code,
            envelope.message.as_deref().unwrap_or_default()
        );
        return Err(SyncError::Server {
            status_code,
            message: envelope.message.unwrap_or_default(),
        });
    }

    debug!("[AgentAPI] {}请求成功 (tag: {})", operation_name, response.tag);
    Ok(envelope)
}

impl ApiEnvelope {
    /// 取出 `data` 字段，缺失时视为解析失败
    pub fn into_data(self) -> Result<Value, SyncError> {
        self.data
            .filter(|d| !d.is_null())
            .ok_or_else(|| SyncError::Parse("响应中缺少 data 字段".to_string()))
    }
}
