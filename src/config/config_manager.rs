// ==========================================
// 报关预审系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、默认值管理
// 存储: config_kv 表 (key-value, scope_id='global')
// ==========================================

use crate::config::validation_config_trait::{ConfigError, ValidationConfigReader};
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 配置键常量
pub mod config_keys {
    pub const ANALYZER_TIMEOUT_MS: &str = "analyzer/timeout_ms";
    pub const ANALYZER_MAX_ATTEMPTS: &str = "analyzer/max_attempts";
    pub const ANALYZER_BACKOFF_BASE_MS: &str = "analyzer/backoff_base_ms";
    pub const DOWNLOAD_TIMEOUT_MS: &str = "storage/download_timeout_ms";
    pub const DATASET_SOURCE_PATH: &str = "dataset/source_path";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        let manager = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        manager.ensure_config_table()?;
        Ok(manager)
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        let manager = Self { conn };
        manager.ensure_config_table()?;
        Ok(manager)
    }

    /// 确保 config_kv 表存在
    fn ensure_config_table(&self) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS config_kv (
                scope_id TEXT NOT NULL DEFAULT 'global',
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (scope_id, key)
            );
            "#,
        )?;
        Ok(())
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入配置值（scope_id='global'）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT (scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取配置并按类型解析, 缺失或解析失败时取默认值
    fn get_parsed_or<T: std::str::FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.get_config_value(key)? {
            Some(raw) => Ok(raw.trim().parse::<T>().unwrap_or(default)),
            None => Ok(default),
        }
    }
}

#[async_trait]
impl ValidationConfigReader for ConfigManager {
    async fn get_analyzer_timeout_ms(&self) -> Result<u64, ConfigError> {
        self.get_parsed_or(config_keys::ANALYZER_TIMEOUT_MS, 30_000)
    }

    async fn get_analyzer_max_attempts(&self) -> Result<u32, ConfigError> {
        self.get_parsed_or(config_keys::ANALYZER_MAX_ATTEMPTS, 3)
    }

    async fn get_analyzer_backoff_base_ms(&self) -> Result<u64, ConfigError> {
        self.get_parsed_or(config_keys::ANALYZER_BACKOFF_BASE_MS, 200)
    }

    async fn get_download_timeout_ms(&self) -> Result<u64, ConfigError> {
        self.get_parsed_or(config_keys::DOWNLOAD_TIMEOUT_MS, 15_000)
    }

    async fn get_dataset_source_path(&self) -> Result<Option<String>, ConfigError> {
        self.get_config_value(config_keys::DATASET_SOURCE_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn manager() -> (NamedTempFile, ConfigManager) {
        let temp = NamedTempFile::new().unwrap();
        let manager = ConfigManager::new(temp.path().to_str().unwrap()).unwrap();
        (temp, manager)
    }

    #[tokio::test]
    async fn test_defaults_when_unset() {
        let (_temp, manager) = manager();
        assert_eq!(manager.get_analyzer_timeout_ms().await.unwrap(), 30_000);
        assert_eq!(manager.get_analyzer_max_attempts().await.unwrap(), 3);
        assert!(manager.get_dataset_source_path().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_and_read_back() {
        let (_temp, manager) = manager();
        manager
            .set_config_value(config_keys::ANALYZER_TIMEOUT_MS, "5000")
            .unwrap();
        assert_eq!(manager.get_analyzer_timeout_ms().await.unwrap(), 5_000);

        manager
            .set_config_value(config_keys::DATASET_SOURCE_PATH, "/data/rules.csv")
            .unwrap();
        assert_eq!(
            manager.get_dataset_source_path().await.unwrap().as_deref(),
            Some("/data/rules.csv")
        );
    }

    #[tokio::test]
    async fn test_unparsable_value_falls_back_to_default() {
        let (_temp, manager) = manager();
        manager
            .set_config_value(config_keys::ANALYZER_MAX_ATTEMPTS, "not-a-number")
            .unwrap();
        assert_eq!(manager.get_analyzer_max_attempts().await.unwrap(), 3);
    }
}
