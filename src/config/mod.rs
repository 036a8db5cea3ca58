// ==========================================
// 报关预审系统 - 配置层
// ==========================================
// 职责: 流水线运行参数管理
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod validation_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use validation_config_trait::{ConfigError, StaticValidationConfig, ValidationConfigReader};
