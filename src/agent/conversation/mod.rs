//! 会话模块
//!
//! 客服端会话列表的分页同步、本地存储和未读数

pub mod api;
pub mod listener;
pub mod models;
pub mod params;
pub mod service;
pub mod store;
pub mod types;
pub mod unread;

// 重新导出主要类型
pub use api::ConversationApi;
pub use listener::{ConversationListener, EmptyConversationListener};
pub use models::{
    BotAction, ChannelStatus, ChatFilter, Conversation, ConversationBatch, SyncClientConfig,
};
pub use service::ConversationSyncClient;
pub use store::{ConversationStore, FeedState, InFlightGuard};
pub use types::{FeedKind, FeedPage, FetchOutcome, PageRequest};
pub use unread::{NoopUnreadCountSource, UnreadCountApi, UnreadCountSource};
