pub mod agent;

// 重新导出常用类型，方便外部使用
pub use agent::{
    conversation::{
        ChatFilter, Conversation, ConversationListener, ConversationSyncClient, FeedKind,
        FetchOutcome, PageRequest, SyncClientConfig,
    },
    roster::{AgentRoster, AgentStatus},
    AgentCredentials, AgentSession, SyncError,
};
