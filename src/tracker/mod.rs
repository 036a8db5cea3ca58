// ==========================================
// 报关预审系统 - 补单请求层
// ==========================================
// 依据: Pipeline_Design_v1.0.md - 4.6 DocumentRequestTracker
// ==========================================
// 职责: 报关行补单请求的创建与"上传即核销"
// 完成策略: 所有请求名称都已上传才转 fulfilled（ALL 策略）
// ==========================================

pub mod request_tracker;

pub use request_tracker::DocumentRequestTracker;

use crate::domain::request::DocumentRequest;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

// ==========================================
// DocumentRequestStore Trait
// ==========================================
// 实现者: DocumentRequestRepository（document_requests 表）
#[async_trait]
pub trait DocumentRequestStore: Send + Sync {
    /// 新增请求, 返回带 ID 的实体
    async fn insert(&self, request: &DocumentRequest) -> RepositoryResult<DocumentRequest>;

    /// 按货运取全部请求（创建时间降序）
    async fn list_by_shipment(&self, shipment_id: i64) -> RepositoryResult<Vec<DocumentRequest>>;

    /// 按货运取 pending 状态请求（创建时间升序, 核销遍历用）
    async fn list_pending_by_shipment(
        &self,
        shipment_id: i64,
    ) -> RepositoryResult<Vec<DocumentRequest>>;

    /// 标记请求完成（单向; 已完成的请求不再改写）
    async fn mark_fulfilled(
        &self,
        request_id: i64,
        fulfilled_at: DateTime<Utc>,
    ) -> RepositoryResult<()>;
}
