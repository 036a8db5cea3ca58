// ==========================================
// 报关预审系统 - 合规规则层
// ==========================================
// 依据: Pipeline_Design_v1.0.md - 4.3 ComplianceDataset / RuleMatcher
// ==========================================
// 职责: 规则集加载、进程级快照发布、规则匹配
// 红线: 数据集加载后整体替换; 读取者永不见半加载状态
// ==========================================

pub mod dataset;
pub mod error;
pub mod loader;
pub mod matcher;
pub mod rule;
pub mod store;

// 重导出核心类型
pub use dataset::ComplianceDataset;
pub use error::{DatasetError, DatasetResult};
pub use loader::parse_ruleset;
pub use matcher::{MatchOutcome, RuleMatcher};
pub use rule::{ComplianceRule, ConstraintKind, FieldConstraint, FieldFormat};
pub use store::ComplianceDatasetHandle;
