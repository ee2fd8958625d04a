//! 会话列表请求参数构建
//!
//! 纯函数：请求 + 筛选条件 + 凭证 + 配置 → 参数。
//! 没有有效客服凭证时返回 `None`，调用方不得发起网络请求。

use crate::agent::conversation::models::{ChatFilter, SyncClientConfig};
use crate::agent::conversation::types::{FeedKind, PageRequest};
use crate::agent::session::AgentCredentials;
use crate::agent::transport::Params;
use serde_json::{json, Value};

/// 本次请求的行数
pub fn row_count(request: &PageRequest, max_page_size: i64) -> i64 {
    match request.page_end {
        Some(end) if end > request.page_start => end - request.page_start + 1,
        _ => max_page_size,
    }
}

/// 基础参数：token、设备信息、分页
fn base_params(
    request: &PageRequest,
    credentials: &AgentCredentials,
    config: &SyncClientConfig,
) -> Params {
    let mut params = Params::new();
    params.insert("access_token".into(), json!(credentials.access_token));
    params.insert("device_type".into(), json!(config.device_type));
    params.insert("app_version".into(), json!(config.app_version));
    params.insert("page_offset".into(), json!(request.page_start));
    params.insert(
        "row_count".into(),
        json!(row_count(request, config.max_page_size)),
    );
    params
}

/// 叠加筛选条件
fn overlay_filter(params: &mut Params, filter: &ChatFilter) {
    params.insert("channel_status".into(), json!(filter.channel_status));
    if !filter.agent_ids.is_empty() {
        params.insert("agent_ids".into(), json!(filter.agent_ids));
    }
    if !filter.label_ids.is_empty() {
        params.insert("label_list".into(), json!(filter.label_ids));
    }
    if let Some(start) = &filter.start_date {
        params.insert("start_date".into(), json!(start));
    }
    if let Some(end) = &filter.end_date {
        params.insert("end_date".into(), json!(end));
    }
}

/// 会话列表类型标识，搜索请求不设置
fn overlay_feed(params: &mut Params, feed: FeedKind) {
    match feed {
        FeedKind::MyChat => {
            params.insert("fetch_my_chats".into(), Value::Bool(true));
        }
        FeedKind::AllChat => {
            params.insert("fetch_all_chats".into(), Value::Bool(true));
        }
        FeedKind::SearchUser => {}
    }
}

/// 构建会话列表请求参数
pub fn conversation_params(
    request: &PageRequest,
    filter: &ChatFilter,
    credentials: Option<&AgentCredentials>,
    config: &SyncClientConfig,
) -> Option<Params> {
    let credentials = credentials.filter(|c| c.agent_id > 0)?;
    let mut params = base_params(request, credentials, config);
    overlay_filter(&mut params, filter);
    overlay_feed(&mut params, request.feed);
    Some(params)
}

/// 构建按访客搜索的请求参数
pub fn search_user_params(
    unique_keys: &[String],
    filter: &ChatFilter,
    credentials: Option<&AgentCredentials>,
    config: &SyncClientConfig,
) -> Option<Params> {
    let mut params = conversation_params(
        &PageRequest::search_user_default(),
        filter,
        credentials,
        config,
    )?;
    params.insert("search_user_unique_key".into(), json!(unique_keys));
    Some(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::agent_credentials;

    fn config() -> SyncClientConfig {
        let mut c = SyncClientConfig::new("http://localhost");
        c.app_version = "1.0.0".into();
        c
    }

    #[test]
    fn row_count_uses_explicit_range_only_when_it_grows() {
        assert_eq!(row_count(&PageRequest::new(FeedKind::MyChat, 1, None), 20), 20);
        assert_eq!(row_count(&PageRequest::new(FeedKind::MyChat, 21, Some(30)), 20), 10);
        assert_eq!(row_count(&PageRequest::new(FeedKind::MyChat, 5, Some(5)), 20), 20);
        assert_eq!(row_count(&PageRequest::new(FeedKind::MyChat, 5, Some(2)), 20), 20);
    }

    #[test]
    fn my_chat_params_carry_base_filter_and_discriminator() {
        let creds = agent_credentials(3);
        let params = conversation_params(
            &PageRequest::new(FeedKind::MyChat, 21, None),
            &ChatFilter::default(),
            Some(&creds),
            &config(),
        )
        .unwrap();

        assert_eq!(params["access_token"], "token-3");
        assert_eq!(params["device_type"], 2);
        assert_eq!(params["app_version"], "1.0.0");
        assert_eq!(params["page_offset"], 21);
        assert_eq!(params["row_count"], 20);
        assert_eq!(params["channel_status"], json!([1]));
        assert_eq!(params["fetch_my_chats"], true);
        assert!(!params.contains_key("fetch_all_chats"));
        assert!(!params.contains_key("agent_ids"));
    }

    #[test]
    fn all_chat_sets_only_all_chat_flag() {
        let creds = agent_credentials(3);
        let params = conversation_params(
            &PageRequest::all_chat_default(),
            &ChatFilter::default(),
            Some(&creds),
            &config(),
        )
        .unwrap();
        assert_eq!(params["fetch_all_chats"], true);
        assert!(!params.contains_key("fetch_my_chats"));
    }

    #[test]
    fn optional_filter_fields_are_passed_through() {
        let creds = agent_credentials(3);
        let filter = ChatFilter {
            channel_status: vec![1, 2],
            agent_ids: vec![8],
            label_ids: vec![4, 5],
            start_date: Some("2024-01-01".into()),
            end_date: None,
        };
        let params =
            conversation_params(&PageRequest::my_chat_default(), &filter, Some(&creds), &config())
                .unwrap();
        assert_eq!(params["channel_status"], json!([1, 2]));
        assert_eq!(params["agent_ids"], json!([8]));
        assert_eq!(params["label_list"], json!([4, 5]));
        assert_eq!(params["start_date"], "2024-01-01");
        assert!(!params.contains_key("end_date"));
    }

    #[test]
    fn search_sets_unique_keys_and_no_discriminator() {
        let creds = agent_credentials(3);
        let keys = vec!["u-1".to_string(), "u-2".to_string()];
        let params =
            search_user_params(&keys, &ChatFilter::default(), Some(&creds), &config()).unwrap();
        assert_eq!(params["search_user_unique_key"], json!(["u-1", "u-2"]));
        assert!(!params.contains_key("fetch_my_chats"));
        assert!(!params.contains_key("fetch_all_chats"));
    }

    #[test]
    fn no_credentials_fails_composition() {
        let req = PageRequest::my_chat_default();
        assert!(conversation_params(&req, &ChatFilter::default(), None, &config()).is_none());

        let creds = agent_credentials(0);
        assert!(
            conversation_params(&req, &ChatFilter::default(), Some(&creds), &config()).is_none()
        );
    }
}
