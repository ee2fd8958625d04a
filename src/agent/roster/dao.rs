//! 客服列表缓存（DAO，基于 sqlx）
//!
//! 每次拉取成功后整体替换当前业务下的客服列表，离线时从缓存读取。

use crate::agent::roster::models::{Agent, AgentStatus};
use crate::agent::session::AgentUserType;
use anyhow::{Context, Result};
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info};

/// 客服列表 DAO
#[derive(Clone)]
pub struct AgentDao {
    db: Pool<Sqlite>,
}

impl AgentDao {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    /// 初始化数据库表结构
    pub async fn init_db(&self) -> Result<()> {
        Self::init_db_with_connection(&self.db).await
    }

    /// 使用共享连接初始化数据库表结构（静态方法）
    pub async fn init_db_with_connection(db: &Pool<Sqlite>) -> Result<()> {
        info!("[AgentDAO/DB] 初始化客服列表表结构");
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS local_agents (
                business_id INTEGER NOT NULL,
                agent_id INTEGER NOT NULL,
                full_name TEXT NOT NULL DEFAULT '',
                email TEXT NOT NULL DEFAULT '',
                online_status TEXT NOT NULL DEFAULT 'OFFLINE',
                agent_type INTEGER NOT NULL DEFAULT 2,
                updated_at INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (business_id, agent_id)
            )
            "#,
        )
        .execute(db)
        .await
        .context("创建客服列表表失败")?;
        Ok(())
    }

    /// 整体替换某个业务下的客服列表
    pub async fn replace_agents(&self, business_id: i64, agents: &[Agent]) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        let mut tx = self.db.begin().await.context("开启事务失败")?;

        sqlx::query("DELETE FROM local_agents WHERE business_id = ?")
            .bind(business_id)
            .execute(&mut *tx)
            .await
            .context("清除旧客服列表失败")?;

        for agent in agents {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO local_agents
                    (business_id, agent_id, full_name, email, online_status, agent_type, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(business_id)
            .bind(agent.user_id)
            .bind(&agent.full_name)
            .bind(&agent.email)
            .bind(agent.online_status.as_str())
            .bind(i32::from(agent.agent_type))
            .bind(now)
            .execute(&mut *tx)
            .await
            .context(format!("写入客服失败: {}", agent.user_id))?;
        }

        tx.commit().await.context("提交客服列表事务失败")?;
        debug!(
            "[AgentDAO] 缓存客服列表，business_id: {}, 数量: {}",
            business_id,
            agents.len()
        );
        Ok(())
    }

    /// 读取某个业务下缓存的客服列表
    pub async fn get_agents(&self, business_id: i64) -> Result<Vec<Agent>> {
        let rows = sqlx::query(
            r#"
            SELECT agent_id, full_name, email, online_status, agent_type
            FROM local_agents
            WHERE business_id = ?
            ORDER BY agent_id
            "#,
        )
        .bind(business_id)
        .fetch_all(&self.db)
        .await
        .context("查询客服列表失败")?;

        let agents: Vec<Agent> = rows
            .into_iter()
            .map(|row| {
                let status: String = row.get("online_status");
                let agent_type: i32 = row.get("agent_type");
                Agent {
                    user_id: row.get("agent_id"),
                    full_name: row.get("full_name"),
                    email: row.get("email"),
                    online_status: AgentStatus::parse(&status).unwrap_or_default(),
                    agent_type: AgentUserType::from(agent_type),
                }
            })
            .collect();
        debug!("[AgentDAO] 读取客服列表缓存，共 {} 个", agents.len());
        Ok(agents)
    }

    /// 更新单个客服的在线状态
    pub async fn update_status(
        &self,
        business_id: i64,
        agent_id: i64,
        status: AgentStatus,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE local_agents SET online_status = ?, updated_at = ? WHERE business_id = ? AND agent_id = ?",
        )
        .bind(status.as_str())
        .bind(chrono::Utc::now().timestamp_millis())
        .bind(business_id)
        .bind(agent_id)
        .execute(&self.db)
        .await
        .context("更新客服状态失败")?;
        Ok(())
    }
}
