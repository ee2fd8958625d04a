//! 会话本地存储
//!
//! 每个列表（我的会话 / 全部会话）各持有一把锁，锁内包含
//! `in_progress`、`has_more` 和会话列表，列表之间互不阻塞。
//! `reset` 会递增代数，旧代数发起的请求结果不再写入。

use crate::agent::conversation::models::Conversation;
use crate::agent::conversation::types::FeedKind;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// 单个会话列表的状态
#[derive(Debug, Default, Clone)]
pub struct FeedState {
    pub in_progress: bool,
    pub has_more: bool,
    pub items: Vec<Conversation>,
}

/// 会话存储
#[derive(Debug, Default)]
pub struct ConversationStore {
    my_chats: Mutex<FeedState>,
    all_chats: Mutex<FeedState>,
    /// 按 channel_id 缓存的未读数（来自未读数接口）
    unread_counts: Mutex<HashMap<i64, i64>>,
    /// 每次 `reset` 加一
    generation: AtomicU64,
}

/// 进行中的拉取标记，drop 时清除 `in_progress`
///
/// 记录发起时的代数；`reset` 之后该标记失效，既不写入结果也不清除新请求的标记
#[derive(Debug)]
pub struct InFlightGuard {
    store: Arc<ConversationStore>,
    feed: FeedKind,
    generation: u64,
}

impl InFlightGuard {
    /// 发起后是否发生过 `reset`
    pub fn is_current(&self) -> bool {
        self.store.generation() == self.generation
    }

    /// 把一页结果写入本列表；`reset` 之后返回 `false` 且不写入
    ///
    /// `replace` 为真时同时清空按会话缓存的未读数
    pub fn merge_page(
        &self,
        conversations: Vec<Conversation>,
        has_more: bool,
        replace: bool,
    ) -> bool {
        let Some(mut state) = self.store.lock_feed(self.feed) else {
            return false;
        };
        if !self.is_current() {
            return false;
        }
        if replace {
            self.store.clear_all_stored_unread_count();
        }
        apply_page(&mut state, conversations, has_more, replace);
        true
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Some(mut state) = self.store.lock_feed(self.feed) {
            if self.is_current() {
                state.in_progress = false;
            }
        }
    }
}

fn apply_page(
    state: &mut FeedState,
    conversations: Vec<Conversation>,
    has_more: bool,
    replace: bool,
) {
    state.has_more = has_more;
    if replace {
        state.items = conversations;
    } else {
        state.items.extend(conversations);
    }
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 搜索列表不在本地存储
    fn lock_feed(&self, feed: FeedKind) -> Option<MutexGuard<'_, FeedState>> {
        let slot = match feed {
            FeedKind::MyChat => &self.my_chats,
            FeedKind::AllChat => &self.all_chats,
            FeedKind::SearchUser => return None,
        };
        Some(slot.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// 原子地检查并设置 `in_progress`；已有请求进行中时返回 `None`
    pub fn try_begin_fetch(self: &Arc<Self>, feed: FeedKind) -> Option<InFlightGuard> {
        let mut state = self.lock_feed(feed)?;
        if state.in_progress {
            return None;
        }
        state.in_progress = true;
        let generation = self.generation();
        drop(state);
        Some(InFlightGuard {
            store: Arc::clone(self),
            feed,
            generation,
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn is_in_progress(&self, feed: FeedKind) -> bool {
        self.lock_feed(feed).is_some_and(|s| s.in_progress)
    }

    pub fn has_more(&self, feed: FeedKind) -> bool {
        self.lock_feed(feed).is_some_and(|s| s.has_more)
    }

    pub fn items(&self, feed: FeedKind) -> Vec<Conversation> {
        self.lock_feed(feed)
            .map(|s| s.items.clone())
            .unwrap_or_default()
    }

    pub fn len(&self, feed: FeedKind) -> usize {
        self.lock_feed(feed).map_or(0, |s| s.items.len())
    }

    pub fn is_empty(&self, feed: FeedKind) -> bool {
        self.len(feed) == 0
    }

    /// 当前状态快照
    pub fn snapshot(&self, feed: FeedKind) -> FeedState {
        self.lock_feed(feed)
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// 合并一页结果：`replace` 为真时整体替换，否则追加（不去重）
    pub fn merge_page(
        &self,
        feed: FeedKind,
        conversations: Vec<Conversation>,
        has_more: bool,
        replace: bool,
    ) {
        if let Some(mut state) = self.lock_feed(feed) {
            apply_page(&mut state, conversations, has_more, replace);
        }
    }

    pub fn store_unread_counts(&self, counts: impl IntoIterator<Item = (i64, i64)>) {
        let mut cache = self
            .unread_counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        cache.extend(counts);
    }

    pub fn stored_unread_count(&self, channel_id: i64) -> Option<i64> {
        self.unread_counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&channel_id)
            .copied()
    }

    pub fn clear_all_stored_unread_count(&self) {
        self.unread_counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// 总未读数：两个列表按 channel_id 合并，缓存未读数优先
    pub fn total_unread_count(&self) -> i64 {
        let mut per_channel: HashMap<i64, i64> = HashMap::new();
        for feed in [FeedKind::MyChat, FeedKind::AllChat] {
            if let Some(state) = self.lock_feed(feed) {
                for conv in &state.items {
                    per_channel.entry(conv.channel_id).or_insert(conv.unread_count);
                }
            }
        }
        let cache = self
            .unread_counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        per_channel
            .into_iter()
            .map(|(id, count)| cache.get(&id).copied().unwrap_or(count).max(0))
            .sum()
    }

    /// 会话结束时清空列表和缓存，进行中的请求结果作废
    pub fn reset(&self) {
        // 两个列表同时加锁，代数变化和清空对其他线程是一次完成的
        let mut my = self.my_chats.lock().unwrap_or_else(PoisonError::into_inner);
        let mut all = self.all_chats.lock().unwrap_or_else(PoisonError::into_inner);
        self.generation.fetch_add(1, Ordering::AcqRel);
        *my = FeedState::default();
        *all = FeedState::default();
        drop(all);
        drop(my);
        self.clear_all_stored_unread_count();
    }
}
