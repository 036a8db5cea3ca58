// ==========================================
// 报关预审系统 - 流水线事件发布
// ==========================================
// 职责: 定义语义事件发布 trait，实现依赖倒置
// 说明: 流水线层定义 trait，通知适配层实现
// 红线: 事件为即发即忘; 发布失败不得影响主流程结果
// ==========================================

use crate::domain::types::ValidationStatus;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 流水线事件类型
// ==========================================

/// 流水线语义事件
///
/// 由通知适配层转换为用户可见消息; 本层只负责产生离散类型化事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationEvent {
    /// 校验完成
    ValidationCompleted {
        shipment_id: i64,
        status: ValidationStatus,
        issue_count: usize,
    },
    /// 预审令牌已签发
    TokenIssued { shipment_id: i64 },
    /// 补单请求已完成
    DocumentRequestFulfilled {
        shipment_id: i64,
        request_id: i64,
    },
}

impl ValidationEvent {
    /// 事件类型标识
    pub fn kind(&self) -> &str {
        match self {
            ValidationEvent::ValidationCompleted { .. } => "ValidationCompleted",
            ValidationEvent::TokenIssued { .. } => "TokenIssued",
            ValidationEvent::DocumentRequestFulfilled { .. } => "DocumentRequestFulfilled",
        }
    }

    /// 事件归属货运 ID
    pub fn shipment_id(&self) -> i64 {
        match self {
            ValidationEvent::ValidationCompleted { shipment_id, .. } => *shipment_id,
            ValidationEvent::TokenIssued { shipment_id } => *shipment_id,
            ValidationEvent::DocumentRequestFulfilled { shipment_id, .. } => *shipment_id,
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 流水线事件发布者 Trait
///
/// 流水线层定义, 通知层实现
/// 通过 trait 实现依赖倒置, 流水线不依赖任何通知传输
pub trait ValidationEventPublisher: Send + Sync {
    /// 发布流水线事件
    ///
    /// # 返回
    /// - `Ok(())`: 已接收（投递由实现方负责）
    /// - `Err`: 发布失败
    fn publish(&self, event: ValidationEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
///
/// 用于不需要事件发布的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl ValidationEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: ValidationEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - shipment_id={}, kind={}",
            event.shipment_id(),
            event.kind()
        );
        Ok(())
    }
}

/// 可选的事件发布者包装
///
/// 简化 Option<Arc<dyn ValidationEventPublisher>> 的使用
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn ValidationEventPublisher>>,
}

impl OptionalEventPublisher {
    /// 创建带发布者的实例
    pub fn with_publisher(publisher: Arc<dyn ValidationEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    /// 创建空实例（不发布事件）
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（如果有发布者）; 失败只记日志, 不向上传播
    pub fn publish_best_effort(&self, event: ValidationEvent) {
        let Some(publisher) = &self.inner else {
            tracing::debug!(
                "OptionalEventPublisher: 未配置发布者，跳过事件 - shipment_id={}, kind={}",
                event.shipment_id(),
                event.kind()
            );
            return;
        };

        if let Err(e) = publisher.publish(event) {
            tracing::warn!(error = %e, "事件发布失败（忽略, 不影响主流程）");
        }
    }

    /// 检查是否配置了发布者
    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}
