// ==========================================
// 报关预审系统 - 领域模型层
// ==========================================
// 依据: Pipeline_Design_v1.0.md - 3. 数据模型
// ==========================================
// 职责: 定义领域实体、类型、纯状态机
// 红线: 不含数据访问逻辑, 不含引擎逻辑
// ==========================================

pub mod approval;
pub mod document;
pub mod request;
pub mod types;
pub mod validation;

// 重导出核心类型
pub use approval::ApprovalState;
pub use document::{ExtractedDocument, ShipmentDocument};
pub use request::DocumentRequest;
pub use types::{
    ApprovalSide, IssueKind, IssueSeverity, RequestStatus, SourceType, ValidationStatus,
};
pub use validation::{DocumentOutcome, ValidationIssue, ValidationResult};
