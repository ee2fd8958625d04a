//! 会话数据模型与配置

use crate::agent::types::null_as_default;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// 默认每页会话数（同时是 has_more 判定阈值）
pub const MAX_PAGE_SIZE: i64 = 20;

/// iOS 设备类型，与服务端约定
pub const DEVICE_TYPE_DEFAULT: i32 = 2;

/// 客服会话列表中的一条会话
///
/// 只关心 channel_id 和未读数，其他字段按需解析，未识别字段保存在 `extra` 中
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// 会话（频道）ID
    pub channel_id: i64,
    /// 访客用户 ID
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_id: i64,
    /// 显示名称
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    /// 最新消息
    #[serde(default, rename = "message")]
    pub last_message: Option<String>,
    /// 未读消息数
    #[serde(default, deserialize_with = "null_as_default")]
    pub unread_count: i64,
    /// 会话状态：1=进行中, 2=已关闭
    #[serde(default, deserialize_with = "null_as_default")]
    pub channel_status: i32,
    /// 分配的客服 ID
    #[serde(default)]
    pub agent_id: Option<i64>,
    /// 分配的客服名称
    #[serde(default)]
    pub agent_name: Option<String>,
    /// 最后更新时间（服务器字符串格式）
    #[serde(default)]
    pub last_updated_at: Option<String>,
    /// 其余字段原样保留
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Conversation {
    /// 解析服务器返回的会话数组，无法解析的条目跳过
    pub fn parse_list(list: &[Value]) -> Vec<Conversation> {
        list.iter()
            .filter_map(|item| match serde_json::from_value(item.clone()) {
                Ok(conv) => Some(conv),
                Err(e) => {
                    tracing::warn!("[AgentConv]   跳过无效会话条目: {}, data={}", e, item);
                    None
                }
            })
            .collect()
    }
}

/// 一页会话列表的解析结果
///
/// `received_count` 是服务器返回的原始条目数（含无法解析而被跳过的条目）
#[derive(Debug, Clone, Default)]
pub struct ConversationBatch {
    pub conversations: Vec<Conversation>,
    pub received_count: usize,
}

/// 机器人动作（客服可对访客触发）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotAction {
    #[serde(alias = "bot_id", default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(
        alias = "bot_name",
        alias = "title",
        default,
        deserialize_with = "null_as_default"
    )]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 会话状态变更目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
    Open = 1,
    Closed = 2,
}

/// 会话筛选条件（由筛选界面维护，原样作为请求参数）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatFilter {
    /// 会话状态集合，默认只看进行中的会话
    pub channel_status: Vec<i32>,
    #[serde(default)]
    pub agent_ids: Vec<i64>,
    #[serde(default)]
    pub label_ids: Vec<i64>,
    /// 起始日期（yyyy-MM-dd）
    #[serde(default)]
    pub start_date: Option<String>,
    /// 结束日期（yyyy-MM-dd）
    #[serde(default)]
    pub end_date: Option<String>,
}

impl Default for ChatFilter {
    fn default() -> Self {
        Self {
            channel_status: vec![1],
            agent_ids: Vec::new(),
            label_ids: Vec::new(),
            start_date: None,
            end_date: None,
        }
    }
}

/// 会话同步客户端配置
#[derive(Debug, Clone)]
pub struct SyncClientConfig {
    /// API 基础 URL
    pub api_base_url: String,
    /// 设备类型
    pub device_type: i32,
    /// 客户端版本号
    pub app_version: String,
    /// 每页会话数
    pub max_page_size: i64,
    /// HTTP 请求超时（仅默认 reqwest 传输层使用）
    pub request_timeout: Duration,
    /// 客服列表缓存使用的 SQLite URL
    ///
    /// 例如：`sqlite://hippo_agent.db?mode=rwc`
    pub cache_db_url: String,
}

impl SyncClientConfig {
    /// 创建默认配置
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            device_type: DEVICE_TYPE_DEFAULT,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            max_page_size: MAX_PAGE_SIZE,
            request_timeout: Duration::from_secs(30),
            cache_db_url: "sqlite://hippo_agent.db?mode=rwc".to_string(),
        }
    }
}
