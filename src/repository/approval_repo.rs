// ==========================================
// 报关预审系统 - 审批状态仓储
// ==========================================
// 红线: Repository 不含业务逻辑; 令牌写入在单事务内完成
// 表: shipment_approvals (每货运一行)
// ==========================================

use crate::approval::{ApprovalStore, MintOutcome};
use crate::db::open_sqlite_connection;
use crate::domain::approval::ApprovalState;
use crate::domain::types::ApprovalSide;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::sync::{Arc, Mutex};

// ==========================================
// ApprovalRepository - 审批状态仓储
// ==========================================
pub struct ApprovalRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ApprovalRepository {
    /// 创建新的 ApprovalRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        repo.ensure_table()?;
        Ok(repo)
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_table()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 确保 shipment_approvals 表存在
    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS shipment_approvals (
                shipment_id INTEGER PRIMARY KEY,
                shipper_approved_at TEXT,
                broker_approved_at TEXT,
                token TEXT,
                token_generated_at TEXT
            );
            "#,
        )?;
        Ok(())
    }

    /// 连接内读取状态（无记录 => 初始状态）
    fn read_state(conn: &Connection, shipment_id: i64) -> RepositoryResult<ApprovalState> {
        let row = conn
            .query_row(
                r#"
                SELECT shipper_approved_at, broker_approved_at, token, token_generated_at
                FROM shipment_approvals WHERE shipment_id = ?1
                "#,
                params![shipment_id],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((shipper_at, broker_at, token, token_at)) = row else {
            return Ok(ApprovalState::new(shipment_id));
        };

        Ok(ApprovalState {
            shipment_id,
            shipper_approved_at: shipper_at.as_deref().map(parse_timestamp),
            broker_approved_at: broker_at.as_deref().map(parse_timestamp),
            token,
            token_generated_at: token_at.as_deref().map(parse_timestamp),
        })
    }
}

#[async_trait]
impl ApprovalStore for ApprovalRepository {
    async fn get_state(&self, shipment_id: i64) -> RepositoryResult<ApprovalState> {
        let conn = self.get_conn()?;
        Self::read_state(&conn, shipment_id)
    }

    async fn record_approval(
        &self,
        shipment_id: i64,
        side: ApprovalSide,
        at: DateTime<Utc>,
    ) -> RepositoryResult<ApprovalState> {
        let column = match side {
            ApprovalSide::Shipper => "shipper_approved_at",
            ApprovalSide::Broker => "broker_approved_at",
        };

        let conn = self.get_conn()?;
        // 单向: 仅当该列仍为空时写入（重复审批不覆盖原时间戳）
        conn.execute(
            &format!(
                r#"
                INSERT INTO shipment_approvals (shipment_id, {column})
                VALUES (?1, ?2)
                ON CONFLICT (shipment_id) DO UPDATE SET
                    {column} = COALESCE({column}, ?2)
                "#
            ),
            params![shipment_id, at.to_rfc3339()],
        )?;

        Self::read_state(&conn, shipment_id)
    }

    async fn mint_token_if_absent(
        &self,
        shipment_id: i64,
        candidate_token: &str,
        at: DateTime<Utc>,
    ) -> RepositoryResult<MintOutcome> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        // 事务内复核: 双审批 + 既有令牌
        let state = Self::read_state(&tx, shipment_id)?;

        if !state.both_complete() {
            tx.rollback()
                .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
            return Ok(MintOutcome::NotEligible);
        }

        if let Some(existing) = state.token {
            tx.rollback()
                .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
            return Ok(MintOutcome::AlreadyIssued(existing));
        }

        tx.execute(
            r#"
            UPDATE shipment_approvals
            SET token = ?2, token_generated_at = ?3
            WHERE shipment_id = ?1 AND token IS NULL
            "#,
            params![shipment_id, candidate_token, at.to_rfc3339()],
        )?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(MintOutcome::Minted(candidate_token.to_string()))
    }
}

/// RFC3339 时间戳解析（入库格式统一）
fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| DateTime::<Utc>::UNIX_EPOCH)
}
