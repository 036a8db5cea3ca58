// ==========================================
// 报关预审系统 - 校验结果仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 表: validation_results (每货运一行, 保存即整体覆盖)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::validation::ValidationResult;
use crate::engine::stores::ValidationResultStore;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// ValidationResultRepository - 校验结果仓储
// ==========================================
// 结果本体序列化为 JSON 存储; status 列冗余出来便于查询
pub struct ValidationResultRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ValidationResultRepository {
    /// 创建新的 ValidationResultRepository 实例
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

    /// 确保 validation_results 表存在
    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS validation_results (
                shipment_id INTEGER PRIMARY KEY,
                status TEXT NOT NULL,
                result_json TEXT NOT NULL,
                computed_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }
}

#[async_trait]
impl ValidationResultStore for ValidationResultRepository {
    async fn get(&self, shipment_id: i64) -> RepositoryResult<Option<ValidationResult>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT result_json FROM validation_results WHERE shipment_id = ?1",
            params![shipment_id],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, result: &ValidationResult) -> RepositoryResult<()> {
        let json = serde_json::to_string(result)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO validation_results (shipment_id, status, result_json, computed_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (shipment_id) DO UPDATE SET
                status = ?2, result_json = ?3, computed_at = ?4
            "#,
            params![
                result.shipment_id,
                result.status.to_string(),
                json,
                result.computed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ValidationStatus;
    use chrono::Utc;
    use tempfile::NamedTempFile;

    fn repo() -> (NamedTempFile, ValidationResultRepository) {
        let temp = NamedTempFile::new().unwrap();
        let repo = ValidationResultRepository::new(temp.path().to_str().unwrap()).unwrap();
        (temp, repo)
    }

    fn result(shipment_id: i64, status: ValidationStatus) -> ValidationResult {
        ValidationResult {
            shipment_id,
            status,
            issues: vec![],
            document_outcomes: vec![],
            score: 100,
            message: "ok".to_string(),
            computed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_get_before_any_run_is_none() {
        let (_temp, repo) = repo();
        assert!(repo.get(10).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites_previous() {
        let (_temp, repo) = repo();
        repo.save(&result(10, ValidationStatus::Passed)).await.unwrap();
        repo.save(&result(10, ValidationStatus::Failed)).await.unwrap();

        let loaded = repo.get(10).await.unwrap().unwrap();
        assert_eq!(loaded.status, ValidationStatus::Failed);
    }

    #[tokio::test]
    async fn test_results_isolated_by_shipment() {
        let (_temp, repo) = repo();
        repo.save(&result(10, ValidationStatus::Passed)).await.unwrap();
        repo.save(&result(11, ValidationStatus::Failed)).await.unwrap();

        assert_eq!(
            repo.get(10).await.unwrap().unwrap().status,
            ValidationStatus::Passed
        );
        assert_eq!(
            repo.get(11).await.unwrap().unwrap().status,
            ValidationStatus::Failed
        );
    }
}
