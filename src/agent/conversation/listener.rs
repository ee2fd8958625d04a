//! 会话监听器回调接口

use crate::agent::conversation::types::FeedKind;
use async_trait::async_trait;

/// 会话监听器回调接口（界面层实现，用于刷新列表和角标）
#[async_trait]
pub trait ConversationListener: Send + Sync {
    /// “我的会话”列表拉取结束（成功或失败）
    async fn on_my_chats_updated(&self);

    /// “全部会话”列表拉取结束（成功或失败）
    async fn on_all_chats_updated(&self);

    /// 总未读消息数变更
    async fn on_total_unread_count_changed(&self, total_unread_count: i64);
}

/// 按列表类型分发更新通知
pub(crate) async fn notify_feed_updated(listener: &dyn ConversationListener, feed: FeedKind) {
    match feed {
        FeedKind::MyChat => listener.on_my_chats_updated().await,
        FeedKind::AllChat => listener.on_all_chats_updated().await,
        FeedKind::SearchUser => {}
    }
}

/// 空实现（默认监听器）
pub struct EmptyConversationListener;

#[async_trait]
impl ConversationListener for EmptyConversationListener {
    async fn on_my_chats_updated(&self) {}
    async fn on_all_chats_updated(&self) {}
    async fn on_total_unread_count_changed(&self, _total_unread_count: i64) {}
}
