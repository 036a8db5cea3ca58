// ==========================================
// 报关预审系统 - 流水线引擎层
// ==========================================
// 依据: Pipeline_Design_v1.0.md - 4.4 ValidationEngine
// ==========================================
// 职责: 编排 提取 -> AI 解析 -> 规则匹配 -> 结果聚合
// 红线: Engine 不拼 SQL; 单证级失败收敛为问题而非异常
// ==========================================

pub mod error;
pub mod events;
pub mod stores;
pub mod validation_engine;

// 重导出核心类型
pub use error::{EngineResult, ValidationError};
pub use events::{
    NoOpEventPublisher, OptionalEventPublisher, ValidationEvent, ValidationEventPublisher,
};
pub use stores::{DocumentStore, ValidationResultStore};
pub use validation_engine::ValidationEngine;
