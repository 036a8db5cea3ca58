// ==========================================
// 报关预审系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口, 屏蔽数据库细节
// 约束: 所有查询使用参数化, 防止 SQL 注入
// ==========================================

pub mod approval_repo;
pub mod document_repo;
pub mod error;
pub mod request_repo;
pub mod validation_repo;

// 重导出核心仓储
pub use approval_repo::ApprovalRepository;
pub use document_repo::ShipmentDocumentRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use request_repo::DocumentRequestRepository;
pub use validation_repo::ValidationResultRepository;
