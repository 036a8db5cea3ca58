// ==========================================
// 报关预审系统 - 补单请求仓储
// ==========================================
// 红线: Repository 不含业务逻辑; requested_names 以 JSON 数组存储
// 表: document_requests
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::request::DocumentRequest;
use crate::domain::types::RequestStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::tracker::DocumentRequestStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// DocumentRequestRepository - 补单请求仓储
// ==========================================
pub struct DocumentRequestRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DocumentRequestRepository {
    /// 创建新的 DocumentRequestRepository 实例
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

    /// 确保 document_requests 表存在
    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS document_requests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                shipment_id INTEGER NOT NULL,
                broker_id INTEGER NOT NULL,
                requested_names TEXT NOT NULL,
                message TEXT,
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL,
                fulfilled_at TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_document_requests_shipment
                ON document_requests (shipment_id, status);
            "#,
        )?;
        Ok(())
    }

    /// 行映射
    fn map_row(row: &Row<'_>) -> rusqlite::Result<DocumentRequest> {
        let names_json: String = row.get("requested_names")?;
        let created_at: String = row.get("created_at")?;
        let fulfilled_at: Option<String> = row.get("fulfilled_at")?;
        let status: String = row.get("status")?;

        Ok(DocumentRequest {
            id: row.get("id")?,
            shipment_id: row.get("shipment_id")?,
            broker_id: row.get("broker_id")?,
            requested_names: serde_json::from_str(&names_json).unwrap_or_default(),
            message: row.get("message")?,
            status: RequestStatus::from_str_or_default(&status),
            created_at: parse_timestamp(&created_at),
            fulfilled_at: fulfilled_at.as_deref().map(parse_timestamp),
        })
    }

    fn query_requests(&self, sql: &str, shipment_id: i64) -> RepositoryResult<Vec<DocumentRequest>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params![shipment_id], Self::map_row)?;
        let mut requests = Vec::new();
        for row in rows {
            requests.push(row?);
        }
        Ok(requests)
    }
}

#[async_trait]
impl DocumentRequestStore for DocumentRequestRepository {
    async fn insert(&self, request: &DocumentRequest) -> RepositoryResult<DocumentRequest> {
        let names_json = serde_json::to_string(&request.requested_names)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO document_requests
                (shipment_id, broker_id, requested_names, message, status, created_at, fulfilled_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                request.shipment_id,
                request.broker_id,
                names_json,
                request.message,
                request.status.to_string(),
                request.created_at.to_rfc3339(),
                request.fulfilled_at.map(|t| t.to_rfc3339()),
            ],
        )?;

        let mut created = request.clone();
        created.id = conn.last_insert_rowid();
        Ok(created)
    }

    async fn list_by_shipment(&self, shipment_id: i64) -> RepositoryResult<Vec<DocumentRequest>> {
        self.query_requests(
            r#"
            SELECT * FROM document_requests
            WHERE shipment_id = ?1
            ORDER BY created_at DESC, id DESC
            "#,
            shipment_id,
        )
    }

    async fn list_pending_by_shipment(
        &self,
        shipment_id: i64,
    ) -> RepositoryResult<Vec<DocumentRequest>> {
        self.query_requests(
            r#"
            SELECT * FROM document_requests
            WHERE shipment_id = ?1 AND status = 'pending'
            ORDER BY created_at ASC, id ASC
            "#,
            shipment_id,
        )
    }

    async fn mark_fulfilled(
        &self,
        request_id: i64,
        fulfilled_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        // 单向: 仅 pending 可转 fulfilled
        let affected = conn.execute(
            r#"
            UPDATE document_requests
            SET status = 'fulfilled', fulfilled_at = ?2
            WHERE id = ?1 AND status = 'pending'
            "#,
            params![request_id, fulfilled_at.to_rfc3339()],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "DocumentRequest(pending)".to_string(),
                id: request_id.to_string(),
            });
        }
        Ok(())
    }
}

/// RFC3339 时间戳解析（入库格式统一）
fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| DateTime::<Utc>::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn repo() -> (NamedTempFile, DocumentRequestRepository) {
        let temp = NamedTempFile::new().unwrap();
        let repo = DocumentRequestRepository::new(temp.path().to_str().unwrap()).unwrap();
        (temp, repo)
    }

    fn request(shipment_id: i64, names: &[&str]) -> DocumentRequest {
        DocumentRequest {
            id: 0,
            shipment_id,
            broker_id: 2,
            requested_names: names.iter().map(|n| n.to_string()).collect(),
            message: Some("请补交".to_string()),
            status: RequestStatus::Pending,
            created_at: Utc::now(),
            fulfilled_at: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_roundtrip_names() {
        let (_temp, repo) = repo();
        let created = repo
            .insert(&request(10, &["packing_list.pdf", "invoice.pdf"]))
            .await
            .unwrap();
        assert!(created.id > 0);

        let requests = repo.list_by_shipment(10).await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].requested_names,
            vec!["packing_list.pdf", "invoice.pdf"]
        );
    }

    #[tokio::test]
    async fn test_mark_fulfilled_is_one_way() {
        let (_temp, repo) = repo();
        let created = repo.insert(&request(10, &["a.pdf"])).await.unwrap();

        repo.mark_fulfilled(created.id, Utc::now()).await.unwrap();
        assert!(repo.list_pending_by_shipment(10).await.unwrap().is_empty());

        // 已完成的请求再次核销 => NotFound
        let err = repo.mark_fulfilled(created.id, Utc::now()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }
}
