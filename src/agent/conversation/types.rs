//! 会话拉取请求与结果

use crate::agent::conversation::models::Conversation;
use crate::agent::transport::request_tag;
use uuid::Uuid;

/// 会话列表类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    /// 我的会话
    MyChat,
    /// 全部会话
    AllChat,
    /// 按访客搜索（不进入本地存储）
    SearchUser,
}

impl FeedKind {
    /// 同一类请求共用的请求标识
    pub fn api_request_tag(self) -> &'static str {
        match self {
            FeedKind::MyChat => request_tag::GET_MY_CONVERSATION,
            FeedKind::AllChat | FeedKind::SearchUser => request_tag::GET_ALL_CONVERSATION,
        }
    }
}

/// 一次会话列表拉取请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub feed: FeedKind,
    /// 起始偏移（从 1 开始）
    pub page_start: i64,
    /// 结束偏移，缺省时使用默认页大小
    pub page_end: Option<i64>,
    /// 是否需要界面显示加载框（透传给调用方）
    pub show_loader: bool,
    /// 请求唯一标识
    pub identifier: String,
}

impl PageRequest {
    pub fn new(feed: FeedKind, page_start: i64, page_end: Option<i64>) -> Self {
        Self {
            feed,
            page_start,
            page_end,
            show_loader: false,
            identifier: Uuid::new_v4().to_string(),
        }
    }

    /// 第一页的默认请求
    pub fn first_page(feed: FeedKind) -> Self {
        Self::new(feed, 1, None)
    }

    pub fn my_chat_default() -> Self {
        Self::first_page(FeedKind::MyChat)
    }

    pub fn all_chat_default() -> Self {
        Self::first_page(FeedKind::AllChat)
    }

    pub fn search_user_default() -> Self {
        Self::first_page(FeedKind::SearchUser)
    }

    /// 是否为刷新（第一页）请求
    pub fn is_fresh_load(&self) -> bool {
        self.page_start == 1
    }
}

/// 一次成功拉取的结果
#[derive(Debug, Clone)]
pub struct FeedPage {
    pub feed: FeedKind,
    pub conversations: Vec<Conversation>,
    pub has_more: bool,
}

/// `fetch_feed` 的结果
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// 同类请求正在进行（未发起网络请求），或请求期间会话已重置，结果未写入
    Dropped,
    /// 请求完成并已合并到本地存储
    Fetched(FeedPage),
}

impl FetchOutcome {
    pub fn is_dropped(&self) -> bool {
        matches!(self, FetchOutcome::Dropped)
    }

    pub fn page(&self) -> Option<&FeedPage> {
        match self {
            FetchOutcome::Fetched(page) => Some(page),
            FetchOutcome::Dropped => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_requests_start_at_first_page_with_unique_ids() {
        let a = PageRequest::my_chat_default();
        let b = PageRequest::my_chat_default();
        assert!(a.is_fresh_load());
        assert_eq!(a.page_end, None);
        assert_ne!(a.identifier, b.identifier);
    }

    #[test]
    fn search_shares_all_chat_tag() {
        assert_eq!(
            FeedKind::SearchUser.api_request_tag(),
            FeedKind::AllChat.api_request_tag()
        );
        assert_ne!(
            FeedKind::MyChat.api_request_tag(),
            FeedKind::AllChat.api_request_tag()
        );
    }
}
