//! Hippo 客服 CLI 客户端（测试版）
//!
//! 非交互式 CLI，用于测试会话同步
//! 启动时通过命令行参数指定客服凭证，按页拉取会话列表并输出总未读数

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use hippo_agent_sdk_rust::agent::roster::AgentRoster;
use hippo_agent_sdk_rust::agent::transport::ReqwestTransport;
use hippo_agent_sdk_rust::agent::{AgentCredentials, AgentUserType};
use hippo_agent_sdk_rust::{
    AgentSession, ConversationListener, ConversationSyncClient, FeedKind, PageRequest,
    SyncClientConfig,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FeedArg {
    My,
    All,
}

impl From<FeedArg> for FeedKind {
    fn from(v: FeedArg) -> Self {
        match v {
            FeedArg::My => FeedKind::MyChat,
            FeedArg::All => FeedKind::AllChat,
        }
    }
}

/// Hippo 客服 CLI
#[derive(Parser, Debug)]
#[command(name = "hippo-agent-cli")]
#[command(about = "Hippo 客服 CLI - 用于测试会话列表同步", long_about = None)]
struct Args {
    /// API 基础 URL
    #[arg(long)]
    base_url: String,

    /// 客服 access token
    #[arg(long)]
    access_token: String,

    #[arg(long, default_value = "0")]
    business_id: i64,

    /// 客服 ID（必须 > 0）
    #[arg(long)]
    agent_id: i64,

    /// 客服类型：1=管理员, 2=普通客服
    #[arg(long, default_value = "2")]
    user_type: i32,

    /// 拉取的会话列表
    #[arg(long, value_enum, default_value = "my")]
    feed: FeedArg,

    /// 最多拉取页数
    #[arg(long, default_value = "3")]
    pages: u32,

    /// 日志级别（默认: info,hippo_agent_sdk_rust=debug）
    #[arg(long, default_value = "info,hippo_agent_sdk_rust=debug")]
    log_level: String,

    /// 日志文件（追加写入）
    #[arg(long, default_value = "debug.log")]
    log_file: PathBuf,

    /// 拉取客服列表并写入本地缓存
    #[arg(long)]
    agents: bool,

    /// 客服列表缓存（SQLite URL），默认使用配置中的 cache_db_url
    #[arg(long)]
    db: Option<String>,

    /// 网络类错误的重试次数
    #[arg(long, default_value = "1")]
    retries: u32,
}

/// 初始化日志：控制台带颜色，文件不带；`RUST_LOG` 优先于 `--log-level`
fn init_logger(log_level: &str, log_file: &Path) -> Result<()> {
    use std::fs::OpenOptions;
    use std::io;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("无法创建日志文件 {}", log_file.display()))?;

    let console = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_file(true)
        .with_line_number(true)
        .with_target(false);

    let persisted = tracing_subscriber::fmt::layer()
        .with_writer(file)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(console)
        .with(persisted)
        .init();

    info!("[CLI] 📝 日志输出到控制台和 {}", log_file.display());
    Ok(())
}

struct CliConversationListener;

#[async_trait::async_trait]
impl ConversationListener for CliConversationListener {
    async fn on_my_chats_updated(&self) {
        info!("[CLI/Conversation] 🔄 我的会话已更新");
    }

    async fn on_all_chats_updated(&self) {
        info!("[CLI/Conversation] 🔄 全部会话已更新");
    }

    async fn on_total_unread_count_changed(&self, total: i64) {
        info!("[CLI/Conversation] 📬 总未读数: {}", total);
    }
}

/// 拉取一页；网络类错误按 `retries` 重试，被丢弃时返回 `None`
async fn fetch_with_retry(
    client: &ConversationSyncClient,
    feed: FeedKind,
    first: bool,
    retries: u32,
) -> Option<(usize, bool)> {
    let mut attempt = 0;
    loop {
        let outcome = if first {
            client.fetch_feed(PageRequest::first_page(feed)).await
        } else {
            client.fetch_next_page(feed).await
        };
        match outcome {
            Ok(outcome) => {
                let Some(page) = outcome.page() else {
                    warn!("[CLI] ⚠️ 请求被丢弃");
                    return None;
                };
                for conv in page.conversations.iter().take(5) {
                    info!(
                        "[CLI]   - {} | {} | 未读: {}",
                        conv.channel_id, conv.label, conv.unread_count
                    );
                }
                return Some((page.conversations.len(), page.has_more));
            }
            Err(e) if e.is_retryable() && attempt < retries => {
                attempt += 1;
                warn!("[CLI] ⚠️ 拉取失败，第 {} 次重试: {}", attempt, e);
            }
            Err(e) => {
                error!("[CLI] ❌ 拉取失败 ({:?}): {}", e.kind(), e);
                return None;
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(&args.log_level, &args.log_file)?;

    info!("[CLI] 🚀 Hippo 客服 CLI（测试模式）");
    info!(
        "[CLI] 👤 客服ID: {}, 业务ID: {}, 列表: {:?}",
        args.agent_id, args.business_id, args.feed
    );

    let session = Arc::new(AgentSession::with_credentials(AgentCredentials {
        access_token: args.access_token.clone(),
        business_id: args.business_id,
        user_id: 0,
        en_user_id: String::new(),
        agent_id: args.agent_id,
        user_type: AgentUserType::from(args.user_type),
        hide_all_chat: false,
    }));

    let mut config = SyncClientConfig::new(args.base_url.clone());
    if let Some(db) = &args.db {
        config.cache_db_url = db.clone();
    }
    let transport = Arc::new(ReqwestTransport::new(
        &config.api_base_url,
        config.request_timeout,
    )?);
    let client =
        ConversationSyncClient::with_transport(config.clone(), session.clone(), transport.clone())
            .with_listener(Arc::new(CliConversationListener));

    let feed = FeedKind::from(args.feed);
    for page in 0..args.pages {
        let Some((count, has_more)) =
            fetch_with_retry(&client, feed, page == 0, args.retries).await
        else {
            break;
        };
        info!(
            "[CLI] 📋 第 {} 页: {} 个会话, has_more={}",
            page + 1,
            count,
            has_more
        );
        if !has_more {
            break;
        }
    }

    info!(
        "[CLI] ✅ 共 {} 个会话，总未读数: {}",
        client.items(feed).len(),
        client.store().total_unread_count()
    );

    if args.agents {
        let roster = AgentRoster::open(transport, session, &config).await?;
        match roster.get_agents_list().await {
            Ok(agents) => info!(
                "[CLI] 👥 客服列表已缓存到 {}，共 {} 个",
                config.cache_db_url,
                agents.len()
            ),
            Err(e) => error!("[CLI] ❌ 客服列表拉取失败: {}", e),
        }
    }

    Ok(())
}
