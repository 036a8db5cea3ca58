// ==========================================
// 报关预审系统 - 补单请求跟踪器
// ==========================================
// 依据: Pipeline_Design_v1.0.md - 4.6 DocumentRequestTracker
// 红线: requested_names 创建后不可变; 状态单向 pending -> fulfilled
// 完成策略: ALL, 所有请求名称都已有对应上传才核销整条请求
// ==========================================

use crate::domain::request::DocumentRequest;
use crate::domain::types::RequestStatus;
use crate::engine::events::{OptionalEventPublisher, ValidationEvent};
use crate::engine::stores::DocumentStore;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::tracker::DocumentRequestStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument};

// ==========================================
// DocumentRequestTracker - 补单请求跟踪器
// ==========================================
pub struct DocumentRequestTracker {
    requests: Arc<dyn DocumentRequestStore>,
    documents: Arc<dyn DocumentStore>,
    events: OptionalEventPublisher,
}

impl DocumentRequestTracker {
    /// 创建新的跟踪器实例
    pub fn new(
        requests: Arc<dyn DocumentRequestStore>,
        documents: Arc<dyn DocumentStore>,
        events: OptionalEventPublisher,
    ) -> Self {
        Self {
            requests,
            documents,
            events,
        }
    }

    /// 创建补单请求（初始状态 pending）
    ///
    /// # 参数
    /// - requested_names: 请求的单证名称集合（去空白, 不可为空集）
    #[instrument(skip(self, message), fields(shipment_id, broker_id))]
    pub async fn create_request(
        &self,
        shipment_id: i64,
        broker_id: i64,
        requested_names: Vec<String>,
        message: Option<String>,
    ) -> RepositoryResult<DocumentRequest> {
        let names: Vec<String> = requested_names
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();

        if names.is_empty() {
            return Err(RepositoryError::ValidationError(
                "补单请求至少需要一个单证名称".to_string(),
            ));
        }

        let request = DocumentRequest {
            id: 0,
            shipment_id,
            broker_id,
            requested_names: names,
            message,
            status: RequestStatus::Pending,
            created_at: Utc::now(),
            fulfilled_at: None,
        };

        let created = self.requests.insert(&request).await?;
        info!(
            request_id = created.id,
            name_count = created.requested_names.len(),
            "补单请求已创建"
        );
        Ok(created)
    }

    /// 按货运取全部请求
    pub async fn list_requests(&self, shipment_id: i64) -> RepositoryResult<Vec<DocumentRequest>> {
        self.requests.list_by_shipment(shipment_id).await
    }

    /// 上传即核销: 单证上传信号到达时检查本货运的 pending 请求
    ///
    /// 匹配: 单证名大小写不敏感精确匹配
    /// 完成: 请求的所有名称都已有对应上传（ALL 策略, 按当前上传集累计判定）
    ///
    /// # 返回
    /// 本次转为 fulfilled 的请求 ID 列表
    #[instrument(skip(self), fields(shipment_id, document_name))]
    pub async fn fulfill_on_upload(
        &self,
        shipment_id: i64,
        document_name: &str,
    ) -> RepositoryResult<Vec<i64>> {
        let pending = self.requests.list_pending_by_shipment(shipment_id).await?;
        if pending.is_empty() {
            return Ok(vec![]);
        }

        // 当前上传集; 上传信号可能先于落库可见, 把本次名称并入
        let mut uploaded_names: Vec<String> = self
            .documents
            .list_by_shipment(shipment_id)
            .await?
            .into_iter()
            .map(|doc| doc.file_name)
            .collect();
        uploaded_names.push(document_name.to_string());

        let mut fulfilled = Vec::new();
        for request in pending {
            // 本次上传与请求无关则跳过（避免无谓的全集比对）
            if !request.matches_name(document_name) {
                continue;
            }

            if !request.is_satisfied_by(&uploaded_names) {
                debug!(
                    request_id = request.id,
                    "请求部分满足, 保持 pending（ALL 策略）"
                );
                continue;
            }

            self.requests
                .mark_fulfilled(request.id, Utc::now())
                .await?;
            self.events
                .publish_best_effort(ValidationEvent::DocumentRequestFulfilled {
                    shipment_id,
                    request_id: request.id,
                });
            info!(request_id = request.id, "补单请求已核销");
            fulfilled.push(request.id);
        }

        Ok(fulfilled)
    }
}
