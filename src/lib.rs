// ==========================================
// 报关预审系统 - 核心库
// ==========================================
// 技术栈: Rust + Tokio + SQLite
// 系统定位: 合规校验流水线 (报关行保留最终裁决权)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 校验流水线编排
pub mod engine;

// 提取层 - 单证内容提取
pub mod extractor;

// AI 解析层 - 字段解析能力边界
pub mod analyzer;

// 合规层 - 规则集与匹配
pub mod compliance;

// 审批层 - 双审批与令牌签发
pub mod approval;

// 补单层 - 补单请求跟踪
pub mod tracker;

// 对象存储层 - 键值字节 I/O
pub mod storage;

// 配置层 - 运行参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    ApprovalSide, ApprovalState, DocumentOutcome, DocumentRequest, ExtractedDocument, IssueKind,
    IssueSeverity, RequestStatus, ShipmentDocument, SourceType, ValidationIssue, ValidationResult,
    ValidationStatus,
};

// 引擎
pub use engine::{
    NoOpEventPublisher, OptionalEventPublisher, ValidationEngine, ValidationError,
    ValidationEvent, ValidationEventPublisher,
};

// 合规
pub use compliance::{ComplianceDataset, ComplianceDatasetHandle, ComplianceRule, RuleMatcher};

// AI 解析
pub use analyzer::{
    AiFieldExtractor, AnalyzerError, HeuristicFieldAnalyzer, RemoteFieldAnalyzer,
    StubFieldAnalyzer,
};

// 提取
pub use extractor::{ContentExtractor, ExtractError};

// 审批与补单
pub use approval::ApprovalTokenIssuer;
pub use tracker::DocumentRequestTracker;

// 对象存储
pub use storage::{BlobStorage, LocalBlobStorage, MemoryBlobStorage};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "报关预审系统";

// ==========================================
// 预编译检查
// ==========================================
