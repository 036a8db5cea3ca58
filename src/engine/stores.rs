// ==========================================
// 报关预审系统 - 流水线持久化契约
// ==========================================
// 职责: 定义流水线所需的持久化 trait，实现依赖倒置
// 说明: 流水线层定义 trait，仓储层实现适配器
// 红线: trait 只表达数据访问, 不含业务逻辑
// ==========================================

use crate::domain::document::ShipmentDocument;
use crate::domain::validation::ValidationResult;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// DocumentStore Trait
// ==========================================
// 实现者: ShipmentDocumentRepository（shipment_documents 表）
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 按货运取全部单证
    ///
    /// # 返回
    /// 按 上传时间 -> 单证 ID 升序排列（校验结果顺序的基础）
    async fn list_by_shipment(&self, shipment_id: i64) -> RepositoryResult<Vec<ShipmentDocument>>;

    /// 校验结果回写单证级标注
    ///
    /// # 参数
    /// - document_id: 单证 ID
    /// - validation_status: 单证级状态 (pass / warning / fail)
    /// - notes_json: 结果摘要 JSON
    async fn write_validation_annotations(
        &self,
        document_id: i64,
        validation_status: &str,
        notes_json: &str,
    ) -> RepositoryResult<()>;
}

// ==========================================
// ValidationResultStore Trait
// ==========================================
// 实现者: ValidationResultRepository（validation_results 表）
#[async_trait]
pub trait ValidationResultStore: Send + Sync {
    /// 读取货运的缓存校验结果
    ///
    /// # 返回
    /// - Ok(None): 从未运行过（不是错误）
    async fn get(&self, shipment_id: i64) -> RepositoryResult<Option<ValidationResult>>;

    /// 保存校验结果（整体覆盖同一货运的先前结果）
    async fn save(&self, result: &ValidationResult) -> RepositoryResult<()>;
}
