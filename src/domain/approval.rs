// ==========================================
// 报关预审系统 - 双审批状态机
// ==========================================
// 依据: Pipeline_Design_v1.0.md - 4.5 ApprovalTokenIssuer
// 红线: 两侧审批单向完成, 不可撤销; 令牌最多签发一次
// ==========================================
// 说明: 转换函数为纯函数, 不依赖 I/O, 可单独测试;
//       持久化与并发控制由 ApprovalStore / TokenIssuer 负责
// ==========================================

use crate::domain::types::ApprovalSide;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ApprovalState - 货运级双审批状态
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalState {
    /// 货运 ID
    pub shipment_id: i64,
    /// 发货方审批完成时间（None = 未完成）
    pub shipper_approved_at: Option<DateTime<Utc>>,
    /// 报关行审批完成时间（None = 未完成）
    pub broker_approved_at: Option<DateTime<Utc>>,
    /// 已签发令牌（None = 未签发）
    pub token: Option<String>,
    /// 令牌签发时间
    pub token_generated_at: Option<DateTime<Utc>>,
}

impl ApprovalState {
    /// 创建初始状态（两侧均未审批）
    pub fn new(shipment_id: i64) -> Self {
        Self {
            shipment_id,
            ..Default::default()
        }
    }

    /// 指定侧是否已完成审批
    pub fn is_approved(&self, side: ApprovalSide) -> bool {
        match side {
            ApprovalSide::Shipper => self.shipper_approved_at.is_some(),
            ApprovalSide::Broker => self.broker_approved_at.is_some(),
        }
    }

    /// 双侧是否均已完成
    pub fn both_complete(&self) -> bool {
        self.shipper_approved_at.is_some() && self.broker_approved_at.is_some()
    }

    /// 记录一侧审批完成（单向, 幂等）
    ///
    /// 已完成的一侧保留原时间戳, 重复审批不覆盖
    pub fn with_approval(mut self, side: ApprovalSide, at: DateTime<Utc>) -> Self {
        match side {
            ApprovalSide::Shipper => {
                self.shipper_approved_at.get_or_insert(at);
            }
            ApprovalSide::Broker => {
                self.broker_approved_at.get_or_insert(at);
            }
        }
        self
    }

    /// 记录令牌签发（仅在未签发时生效）
    pub fn with_token(mut self, token: String, at: DateTime<Utc>) -> Self {
        if self.token.is_none() {
            self.token = Some(token);
            self.token_generated_at = Some(at);
        }
        self
    }
}
