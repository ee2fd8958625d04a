//! SQLite 数据库工具：统一创建连接池并初始化表结构

use crate::agent::roster::dao::AgentDao;
use anyhow::{Context, Result};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use tracing::info;

/// 创建 SQLite 连接池并初始化所有表
///
/// 内存数据库每个连接互相独立，只保留一个连接
pub async fn create_sqlite_pool(db_url: &str) -> Result<Pool<Sqlite>> {
    let max_connections = if db_url.contains(":memory:") { 1 } else { 5 };
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(db_url)
        .await
        .context(format!("连接SQLite数据库失败: {}", db_url))?;

    AgentDao::init_db_with_connection(&pool).await?;
    info!("[DB] SQLite 数据库就绪: {}", db_url);
    Ok(pool)
}
