// ==========================================
// 报关预审系统 - 货运单证仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 表: shipment_documents
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::document::ShipmentDocument;
use crate::engine::stores::DocumentStore;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// ShipmentDocumentRepository - 货运单证仓储
// ==========================================
// 红线: 唯一事实层; 除 uploaded_at 标记与校验回写字段外不可变
pub struct ShipmentDocumentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ShipmentDocumentRepository {
    /// 创建新的 ShipmentDocumentRepository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
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

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 确保 shipment_documents 表存在
    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS shipment_documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                shipment_id INTEGER NOT NULL,
                document_type TEXT NOT NULL,
                file_name TEXT NOT NULL,
                storage_key TEXT NOT NULL,
                file_size INTEGER,
                mime_type TEXT,
                uploaded_by INTEGER,
                uploaded_at TEXT NOT NULL,
                validation_status TEXT,
                validation_notes_json TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_shipment_documents_shipment
                ON shipment_documents (shipment_id, uploaded_at, id);
            "#,
        )?;
        Ok(())
    }

    /// 行映射
    fn map_row(row: &Row<'_>) -> rusqlite::Result<ShipmentDocument> {
        let uploaded_at: String = row.get("uploaded_at")?;
        Ok(ShipmentDocument {
            id: row.get("id")?,
            shipment_id: row.get("shipment_id")?,
            document_type: row.get("document_type")?,
            file_name: row.get("file_name")?,
            storage_key: row.get("storage_key")?,
            file_size: row.get("file_size")?,
            mime_type: row.get("mime_type")?,
            uploaded_by: row.get("uploaded_by")?,
            uploaded_at: parse_timestamp(&uploaded_at),
            validation_status: row.get("validation_status")?,
            validation_notes_json: row.get("validation_notes_json")?,
        })
    }

    /// 新增单证, 返回带 ID 的实体
    pub fn insert(&self, doc: &ShipmentDocument) -> RepositoryResult<ShipmentDocument> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO shipment_documents
                (shipment_id, document_type, file_name, storage_key, file_size,
                 mime_type, uploaded_by, uploaded_at, validation_status, validation_notes_json)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                doc.shipment_id,
                doc.document_type,
                doc.file_name,
                doc.storage_key,
                doc.file_size,
                doc.mime_type,
                doc.uploaded_by,
                doc.uploaded_at.to_rfc3339(),
                doc.validation_status,
                doc.validation_notes_json,
            ],
        )?;

        let mut created = doc.clone();
        created.id = conn.last_insert_rowid();
        Ok(created)
    }

    /// 按 ID 查询
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<ShipmentDocument>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM shipment_documents WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], Self::map_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// 按货运查询全部单证（上传时间 -> ID 升序）
    pub fn list_by_shipment_sync(&self, shipment_id: i64) -> RepositoryResult<Vec<ShipmentDocument>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM shipment_documents
            WHERE shipment_id = ?1
            ORDER BY uploaded_at ASC, id ASC
            "#,
        )?;
        let rows = stmt.query_map(params![shipment_id], Self::map_row)?;
        let mut docs = Vec::new();
        for row in rows {
            docs.push(row?);
        }
        Ok(docs)
    }

    /// 按货运查询全部文件名（补单请求匹配用）
    pub fn list_file_names(&self, shipment_id: i64) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT file_name FROM shipment_documents WHERE shipment_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![shipment_id], |row| row.get::<_, String>(0))?;
        let mut names = Vec::new();
        for row in rows {
            names.push(row?);
        }
        Ok(names)
    }

    /// 刷新"已上传"标记: 将匹配单证的上传时间置为当前时刻
    ///
    /// # 返回
    /// - true: 找到匹配单证并已更新
    /// - false: 无匹配单证
    pub fn mark_as_uploaded(&self, shipment_id: i64, document_name: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE shipment_documents
            SET uploaded_at = ?3
            WHERE shipment_id = ?1 AND file_name = ?2 COLLATE NOCASE
            "#,
            params![shipment_id, document_name, Utc::now().to_rfc3339()],
        )?;
        Ok(affected > 0)
    }

    /// 按 ID 删除
    pub fn delete_by_id(&self, id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM shipment_documents WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    /// 删除货运下全部单证, 返回删除数量
    pub fn delete_by_shipment(&self, shipment_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM shipment_documents WHERE shipment_id = ?1",
            params![shipment_id],
        )?;
        Ok(affected)
    }
}

#[async_trait]
impl DocumentStore for ShipmentDocumentRepository {
    async fn list_by_shipment(&self, shipment_id: i64) -> RepositoryResult<Vec<ShipmentDocument>> {
        self.list_by_shipment_sync(shipment_id)
    }

    async fn write_validation_annotations(
        &self,
        document_id: i64,
        validation_status: &str,
        notes_json: &str,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE shipment_documents
            SET validation_status = ?2, validation_notes_json = ?3
            WHERE id = ?1
            "#,
            params![document_id, validation_status, notes_json],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ShipmentDocument".to_string(),
                id: document_id.to_string(),
            });
        }
        Ok(())
    }
}

/// RFC3339 时间戳解析（入库格式统一, 解析失败取 Unix 纪元兜底）
fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| DateTime::<Utc>::UNIX_EPOCH)
}
