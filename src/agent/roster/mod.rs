//! 客服列表模块
//!
//! 同一业务下的客服列表（带 SQLite 缓存）和当前客服的在线状态

pub mod api;
pub mod dao;
pub mod models;
pub mod service;

pub use api::RosterApi;
pub use dao::AgentDao;
pub use models::{Agent, AgentStatus};
pub use service::AgentRoster;
