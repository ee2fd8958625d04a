//! 客服会话同步服务层
//!
//! 两个会话列表（我的会话 / 全部会话）分页拉取，同一列表同时只允许一个请求，
//! 结果合并进 `ConversationStore`，并维护总未读数。

use crate::agent::conversation::api::ConversationApi;
use crate::agent::conversation::listener::{
    notify_feed_updated, ConversationListener, EmptyConversationListener,
};
use crate::agent::conversation::models::{
    BotAction, ChannelStatus, ChatFilter, Conversation, ConversationBatch, SyncClientConfig,
};
use crate::agent::conversation::params::{conversation_params, search_user_params};
use crate::agent::conversation::store::{ConversationStore, InFlightGuard};
use crate::agent::conversation::types::{FeedKind, FeedPage, FetchOutcome, PageRequest};
use crate::agent::conversation::unread::{UnreadCountApi, UnreadCountSource};
use crate::agent::error::SyncError;
use crate::agent::session::AgentSession;
use crate::agent::transport::{request_tag, HttpTransport, Params, ReqwestTransport};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// 会话同步客户端
///
/// 可以随意 clone，内部状态共享。一次登录对应一个实例。
#[derive(Clone)]
pub struct ConversationSyncClient {
    config: Arc<SyncClientConfig>,
    api: ConversationApi,
    session: Arc<AgentSession>,
    store: Arc<ConversationStore>,
    filter: Arc<RwLock<ChatFilter>>,
    unread_source: Arc<dyn UnreadCountSource>,
    listener: Arc<dyn ConversationListener>,
    unread_in_progress: Arc<AtomicBool>,
    last_error: Arc<Mutex<Option<String>>>,
}

impl ConversationSyncClient {
    /// 使用默认 reqwest 传输层创建客户端
    pub fn new(config: SyncClientConfig, session: Arc<AgentSession>) -> anyhow::Result<Self> {
        let transport = ReqwestTransport::new(config.api_base_url.clone(), config.request_timeout)?;
        Ok(Self::with_transport(config, session, Arc::new(transport)))
    }

    /// 使用自定义传输层创建客户端（未读数也走同一个传输层）
    pub fn with_transport(
        config: SyncClientConfig,
        session: Arc<AgentSession>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        info!(
            "[AgentConv] 创建会话同步客户端，API: {}, 每页: {}",
            config.api_base_url, config.max_page_size
        );
        let store = Arc::new(ConversationStore::new());
        let unread_source = Arc::new(UnreadCountApi::new(
            transport.clone(),
            session.clone(),
            store.clone(),
            config.device_type,
        ));
        Self {
            config: Arc::new(config),
            api: ConversationApi::new(transport),
            session,
            store,
            filter: Arc::new(RwLock::new(ChatFilter::default())),
            unread_source,
            listener: Arc::new(EmptyConversationListener),
            unread_in_progress: Arc::new(AtomicBool::new(false)),
            last_error: Arc::new(Mutex::new(None)),
        }
    }

    /// 注册会话监听器
    pub fn with_listener(mut self, listener: Arc<dyn ConversationListener>) -> Self {
        self.listener = listener;
        self
    }

    /// 替换未读数来源
    pub fn with_unread_source(mut self, source: Arc<dyn UnreadCountSource>) -> Self {
        self.unread_source = source;
        self
    }

    pub fn config(&self) -> &SyncClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<AgentSession> {
        &self.session
    }

    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    pub fn filter(&self) -> ChatFilter {
        self.filter
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 更新筛选条件；调用方随后应发起第一页请求刷新列表
    pub fn set_filter(&self, filter: ChatFilter) {
        info!("[AgentConv] 更新筛选条件: {:?}", filter);
        *self.filter.write().unwrap_or_else(PoisonError::into_inner) = filter;
    }

    // ========== 状态查询 ==========

    pub fn is_fetch_in_progress(&self, feed: FeedKind) -> bool {
        self.store.is_in_progress(feed)
    }

    /// 两个会话列表是否有请求进行中
    pub fn is_conversation_fetch_in_progress(&self) -> bool {
        self.is_fetch_in_progress(FeedKind::MyChat) || self.is_fetch_in_progress(FeedKind::AllChat)
    }

    /// 会话列表或登录是否有请求进行中
    pub fn is_any_fetch_in_progress(&self) -> bool {
        self.is_conversation_fetch_in_progress() || self.session.is_login_in_progress()
    }

    pub fn items(&self, feed: FeedKind) -> Vec<Conversation> {
        self.store.items(feed)
    }

    pub fn has_more(&self, feed: FeedKind) -> bool {
        self.store.has_more(feed)
    }

    /// 最近一次失败的描述
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record_error(&self, err: &SyncError) {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(err.to_string());
    }

    fn clear_error(&self) {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// 会话结束时清空本地状态
    pub fn reset(&self) {
        info!("[AgentConv] 重置会话列表状态");
        self.store.reset();
        self.clear_error();
    }

    // ========== 会话列表拉取 ==========

    /// 拉取一页会话
    ///
    /// 同一列表已有请求进行中时直接返回 `FetchOutcome::Dropped`，不发网络请求；
    /// 请求期间调用了 `reset` 时结果被丢弃，同样返回 `Dropped`。
    /// 失败时本地列表保持不变，只记录错误描述，不自动重试。
    pub async fn fetch_feed(&self, request: PageRequest) -> Result<FetchOutcome, SyncError> {
        if request.feed == FeedKind::SearchUser {
            let params = self.compose(&request)?;
            let batch = self
                .fetch_page(&request, params)
                .await
                .inspect_err(|e| self.record_error(e))?;
            let has_more = self.is_full_page(batch.received_count);
            return Ok(FetchOutcome::Fetched(FeedPage {
                feed: request.feed,
                conversations: batch.conversations,
                has_more,
            }));
        }

        let Some(guard) = self.store.try_begin_fetch(request.feed) else {
            debug!(
                "[AgentConv] {:?} 已有请求进行中，丢弃本次请求 (identifier: {})",
                request.feed, request.identifier
            );
            return Ok(FetchOutcome::Dropped);
        };

        let params = self.compose(&request)?;
        let batch = self
            .fetch_page(&request, params)
            .await
            .inspect_err(|e| {
                if guard.is_current() {
                    self.record_error(e);
                }
            })?;

        let Some(page) = self.merge(&guard, &request, batch) else {
            info!(
                "[AgentConv] {:?} 请求期间会话已重置，丢弃结果 (identifier: {})",
                request.feed, request.identifier
            );
            return Ok(FetchOutcome::Dropped);
        };
        drop(guard);

        self.push_total_unread_count().await;
        self.refresh_unread_count();
        Ok(FetchOutcome::Fetched(page))
    }

    /// 拉取下一页（起始位置 = 当前条目数 + 1）
    pub async fn fetch_next_page(&self, feed: FeedKind) -> Result<FetchOutcome, SyncError> {
        let page_start = self.store.len(feed) as i64 + 1;
        self.fetch_feed(PageRequest::new(feed, page_start, None))
            .await
    }

    /// 构建请求参数，没有有效客服会话时记录错误
    fn compose(&self, request: &PageRequest) -> Result<Params, SyncError> {
        let credentials = self.session.agent_credentials();
        conversation_params(request, &self.filter(), credentials.as_ref(), &self.config)
            .ok_or_else(|| {
                warn!(
                    "[AgentConv] ⚠️ 无有效客服会话，放弃拉取 {:?} (page_start: {})",
                    request.feed, request.page_start
                );
                let err = SyncError::NoSession;
                self.record_error(&err);
                err
            })
    }

    async fn fetch_page(
        &self,
        request: &PageRequest,
        params: Params,
    ) -> Result<ConversationBatch, SyncError> {
        info!(
            "[AgentConv] 🔄 拉取 {:?}，page_start: {}, page_end: {:?}",
            request.feed, request.page_start, request.page_end
        );
        self.api
            .get_conversations(request.feed.api_request_tag(), params)
            .await
            .inspect_err(|e| error!("[AgentConv] ❌ 拉取 {:?} 失败: {}", request.feed, e))
    }

    /// 按服务器返回的原始条目数判断是否还有下一页
    fn is_full_page(&self, received_count: usize) -> bool {
        received_count as i64 >= self.config.max_page_size
    }

    /// 合并一页结果到本地存储；请求期间发生过 `reset` 时返回 `None`
    fn merge(
        &self,
        guard: &InFlightGuard,
        request: &PageRequest,
        batch: ConversationBatch,
    ) -> Option<FeedPage> {
        let has_more = self.is_full_page(batch.received_count);
        let fresh = request.is_fresh_load();
        if !guard.merge_page(batch.conversations.clone(), has_more, fresh) {
            return None;
        }
        self.clear_error();

        info!(
            "[AgentConv] ✅ {:?} {}完成，本页: {}/{}, 合计: {}, has_more: {}",
            request.feed,
            if fresh { "刷新" } else { "加载更多" },
            batch.conversations.len(),
            batch.received_count,
            self.store.len(request.feed),
            has_more
        );
        Some(FeedPage {
            feed: request.feed,
            conversations: batch.conversations,
            has_more,
        })
    }

    /// 重新计算总未读数并通知监听器
    pub async fn push_total_unread_count(&self) {
        let total = self.store.total_unread_count();
        debug!("[AgentConv] 📬 总未读数: {}", total);
        self.listener.on_total_unread_count_changed(total).await;
    }

    /// 后台刷新未读数；登录中或已有刷新进行中时跳过
    ///
    /// 必须在 tokio 运行时内调用
    pub fn refresh_unread_count(&self) -> Option<JoinHandle<()>> {
        if self.session.is_login_in_progress() {
            debug!("[Unread] 登录进行中，跳过未读数刷新");
            return None;
        }
        if self.unread_in_progress.swap(true, Ordering::AcqRel) {
            debug!("[Unread] 未读数刷新进行中，跳过");
            return None;
        }
        let client = self.clone();
        Some(tokio::spawn(async move {
            let result = client.unread_source.refresh().await;
            client.unread_in_progress.store(false, Ordering::Release);
            match result {
                Ok(()) => client.push_total_unread_count().await,
                Err(e) => warn!("[Unread] ⚠️ 刷新未读数失败: {}", e),
            }
        }))
    }

    /// 刷新未读数并拉取两个列表的第一页，每个列表完成后通知监听器
    ///
    /// 立即返回，必须在 tokio 运行时内调用
    pub fn get_all_data(&self) -> Vec<JoinHandle<()>> {
        self.refresh_unread_count();

        let mut handles = Vec::new();
        for feed in [FeedKind::MyChat, FeedKind::AllChat] {
            if self.is_fetch_in_progress(feed) {
                debug!("[AgentConv] {:?} 请求进行中，跳过", feed);
                continue;
            }
            if feed == FeedKind::AllChat {
                let Some(creds) = self.session.agent_credentials() else {
                    break;
                };
                if !creds.can_view_all_chats() {
                    info!("[AgentConv] 当前客服无权查看全部会话，跳过");
                    continue;
                }
            }
            let client = self.clone();
            handles.push(tokio::spawn(async move {
                if let Err(e) = client.fetch_feed(PageRequest::first_page(feed)).await {
                    warn!("[AgentConv] {:?} 第一页拉取失败: {}", feed, e);
                }
                notify_feed_updated(client.listener.as_ref(), feed).await;
            }));
        }
        handles
    }

    // ========== 登录与其他客服操作 ==========

    /// 通过授权 token 登录客服，成功后保存凭证并刷新未读数
    pub async fn update_agent_channel(&self, auth_token: &str) -> Result<(), SyncError> {
        info!("[AgentConv] 🔐 客服登录中...");
        let mut params = Params::new();
        params.insert("auth_token".into(), json!(auth_token));
        params.insert("device_type".into(), json!(self.config.device_type));
        params.insert("app_version".into(), json!(self.config.app_version));

        self.session.set_login_in_progress(true);
        let result = self.api.login_via_auth(params).await;
        self.session.set_login_in_progress(false);

        let credentials = result.inspect_err(|e| {
            error!("[AgentConv] ❌ 客服登录失败: {}", e);
            self.record_error(e);
        })?;
        info!(
            "[AgentConv] ✅ 客服登录成功，agent_id: {}, business_id: {}",
            credentials.agent_id, credentials.business_id
        );
        self.session.set_credentials(credentials);
        self.refresh_unread_count();
        Ok(())
    }

    /// 按访客唯一标识搜索会话（不受进行中标记限制，不写入本地列表）
    pub async fn search_user_conversations(
        &self,
        unique_keys: &[String],
    ) -> Result<Vec<Conversation>, SyncError> {
        let credentials = self.session.agent_credentials();
        let params = search_user_params(
            unique_keys,
            &self.filter(),
            credentials.as_ref(),
            &self.config,
        )
        .ok_or(SyncError::NoSession)?;
        debug!("[AgentConv] 搜索访客会话: {:?}", unique_keys);
        self.api
            .get_conversations(request_tag::CONCURRENT, params)
            .await
            .map(|batch| batch.conversations)
    }

    /// 修改会话状态
    pub async fn update_channel_status(
        &self,
        channel_id: i64,
        status: ChannelStatus,
    ) -> Result<(), SyncError> {
        let creds = self
            .session
            .agent_credentials()
            .ok_or(SyncError::NoSession)?;
        let mut params = Params::new();
        params.insert("access_token".into(), json!(creds.access_token));
        params.insert("channel_id".into(), json!(channel_id));
        params.insert("en_user_id".into(), json!(creds.en_user_id));
        params.insert("status".into(), json!(status as i32));
        info!(
            "[AgentConv] 修改会话状态: channel_id={}, status={:?}",
            channel_id, status
        );
        self.api.mark_conversation(params).await
    }

    /// 把会话分配给当前客服
    pub async fn assign_chat_to_me(&self, channel_id: i64) -> Result<(), SyncError> {
        let creds = self
            .session
            .agent_credentials()
            .ok_or(SyncError::NoSession)?;
        let mut params = Params::new();
        params.insert("access_token".into(), json!(creds.access_token));
        params.insert("channel_id".into(), json!(channel_id));
        params.insert("user_id".into(), json!(creds.user_id));
        info!("[AgentConv] 分配会话给自己: channel_id={}", channel_id);
        self.api.assign_agent(params).await.inspect_err(|e| {
            error!("[AgentConv] ❌ 分配会话失败: {}", e);
        })
    }

    /// 获取可对访客触发的机器人动作，失败时返回空列表
    pub async fn get_bot_actions(&self, user_id: i64, channel_id: i64) -> Vec<BotAction> {
        let Some(creds) = self.session.agent_credentials() else {
            return Vec::new();
        };
        let mut params = Params::new();
        params.insert("access_token".into(), json!(creds.access_token));
        params.insert("user_id".into(), json!(user_id));
        params.insert("channel_id".into(), json!(channel_id.to_string()));
        match self.api.get_bot_actions(params).await {
            Ok(actions) => actions,
            Err(e) => {
                warn!("[AgentConv] ⚠️ 获取机器人动作失败: {}", e);
                Vec::new()
            }
        }
    }
}
