//! 会话同步错误类型

use thiserror::Error;

/// 错误大类，供调用方决定展示方式（重试、重新登录等）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 请求参数无法构建（无会话、非客服账号等），未发起网络请求
    Composition,
    /// 网络错误、HTTP 状态异常、响应体不是合法 JSON、服务器状态码非 200
    Transport,
    /// 响应格式正确但缺少预期字段
    Parse,
}

/// 会话同步过程中可能出现的错误
#[derive(Debug, Error)]
pub enum SyncError {
    /// 没有有效的客服会话
    #[error("没有有效的客服会话，无法构建请求参数")]
    NoSession,

    /// 网络请求失败
    #[error("网络请求失败: {0}")]
    Network(#[source] anyhow::Error),

    /// HTTP 状态码非 2xx
    #[error("HTTP 错误 {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// 响应体不是合法 JSON
    #[error("响应不是合法的 JSON: {0}")]
    MalformedBody(#[from] serde_json::Error),

    /// 服务器在响应体中返回了失败状态
    #[error("服务器错误 {status_code}: {message}")]
    Server { status_code: i64, message: String },

    /// 响应缺少预期字段
    #[error("解析响应失败: {0}")]
    Parse(String),
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::NoSession => ErrorKind::Composition,
            SyncError::Network(_)
            | SyncError::HttpStatus { .. }
            | SyncError::MalformedBody(_)
            | SyncError::Server { .. } => ErrorKind::Transport,
            SyncError::Parse(_) => ErrorKind::Parse,
        }
    }

    /// 是否值得由调用方重试（下拉刷新等）
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(SyncError::NoSession.kind(), ErrorKind::Composition);
        assert_eq!(
            SyncError::Network(anyhow::anyhow!("connection reset")).kind(),
            ErrorKind::Transport
        );
        assert_eq!(
            SyncError::HttpStatus {
                status: 502,
                body: String::new()
            }
            .kind(),
            ErrorKind::Transport
        );
        assert_eq!(
            SyncError::Server {
                status_code: 401,
                message: "expired".into()
            }
            .kind(),
            ErrorKind::Transport
        );
        assert_eq!(SyncError::Parse("x".into()).kind(), ErrorKind::Parse);
    }

    #[test]
    fn malformed_json_is_transport_failure() {
        let err: SyncError = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert!(err.is_retryable());
        assert!(!SyncError::NoSession.is_retryable());
    }
}
