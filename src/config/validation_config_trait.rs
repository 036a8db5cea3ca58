// ==========================================
// 报关预审系统 - 流水线配置读取 Trait
// ==========================================
// 职责: 定义流水线所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

/// 配置错误别名
pub type ConfigError = Box<dyn Error + Send + Sync>;

// ==========================================
// ValidationConfigReader Trait
// ==========================================
// 用途: 流水线所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）/ StaticValidationConfig（测试）
#[async_trait]
pub trait ValidationConfigReader: Send + Sync {
    // ===== AI 解析配置 =====

    /// 获取 AI 解析单次调用超时（毫秒）
    ///
    /// # 默认值
    /// - 30000
    async fn get_analyzer_timeout_ms(&self) -> Result<u64, ConfigError>;

    /// 获取 AI 解析总尝试次数（含首次）
    ///
    /// # 默认值
    /// - 3
    async fn get_analyzer_max_attempts(&self) -> Result<u32, ConfigError>;

    /// 获取重试退避基数（毫秒）
    ///
    /// # 默认值
    /// - 200
    async fn get_analyzer_backoff_base_ms(&self) -> Result<u64, ConfigError>;

    // ===== 对象存储配置 =====

    /// 获取单证下载超时（毫秒）
    ///
    /// # 默认值
    /// - 15000
    async fn get_download_timeout_ms(&self) -> Result<u64, ConfigError>;

    // ===== 合规数据集配置 =====

    /// 获取规则文件路径
    ///
    /// # 返回
    /// - None: 未配置（初始化入口需显式给出路径）
    async fn get_dataset_source_path(&self) -> Result<Option<String>, ConfigError>;
}

// ==========================================
// StaticValidationConfig - 静态配置（测试/简单装配）
// ==========================================
/// 全部取内置默认值的确定性配置
#[derive(Debug, Clone)]
pub struct StaticValidationConfig {
    pub analyzer_timeout_ms: u64,
    pub analyzer_max_attempts: u32,
    pub analyzer_backoff_base_ms: u64,
    pub download_timeout_ms: u64,
    pub dataset_source_path: Option<String>,
}

impl Default for StaticValidationConfig {
    fn default() -> Self {
        Self {
            analyzer_timeout_ms: 30_000,
            analyzer_max_attempts: 3,
            analyzer_backoff_base_ms: 200,
            download_timeout_ms: 15_000,
            dataset_source_path: None,
        }
    }
}

#[async_trait]
impl ValidationConfigReader for StaticValidationConfig {
    async fn get_analyzer_timeout_ms(&self) -> Result<u64, ConfigError> {
        Ok(self.analyzer_timeout_ms)
    }

    async fn get_analyzer_max_attempts(&self) -> Result<u32, ConfigError> {
        Ok(self.analyzer_max_attempts)
    }

    async fn get_analyzer_backoff_base_ms(&self) -> Result<u64, ConfigError> {
        Ok(self.analyzer_backoff_base_ms)
    }

    async fn get_download_timeout_ms(&self) -> Result<u64, ConfigError> {
        Ok(self.download_timeout_ms)
    }

    async fn get_dataset_source_path(&self) -> Result<Option<String>, ConfigError> {
        Ok(self.dataset_source_path.clone())
    }
}
