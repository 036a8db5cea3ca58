// ==========================================
// 报关预审系统 - 审批令牌层
// ==========================================
// 依据: Pipeline_Design_v1.0.md - 4.5 ApprovalTokenIssuer
// ==========================================
// 职责: 双审批状态推进与预审令牌精确一次签发
// 红线: 令牌签发写入为单原子步骤; 并发首次观察者不得各自铸造
// ==========================================

pub mod token_issuer;

pub use token_issuer::ApprovalTokenIssuer;

use crate::domain::approval::ApprovalState;
use crate::domain::types::ApprovalSide;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

// ==========================================
// 令牌铸造结论
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MintOutcome {
    /// 本次新铸造
    Minted(String),
    /// 先前已签发, 返回既有令牌
    AlreadyIssued(String),
    /// 双审批未齐, 不可签发
    NotEligible,
}

// ==========================================
// ApprovalStore Trait
// ==========================================
// 实现者: ApprovalRepository（shipment_approvals 表）
// 红线: mint_token_if_absent 必须在单事务内复核状态并写入
#[async_trait]
pub trait ApprovalStore: Send + Sync {
    /// 读取货运审批状态（无记录 => 初始状态）
    async fn get_state(&self, shipment_id: i64) -> RepositoryResult<ApprovalState>;

    /// 记录一侧审批完成（单向, 幂等）, 返回更新后状态
    async fn record_approval(
        &self,
        shipment_id: i64,
        side: ApprovalSide,
        at: DateTime<Utc>,
    ) -> RepositoryResult<ApprovalState>;

    /// 原子签发令牌
    ///
    /// 在单事务内复核双审批与既有令牌:
    /// - 双审批未齐 => NotEligible
    /// - 已有令牌 => AlreadyIssued(既有令牌)
    /// - 否则写入候选令牌 => Minted(候选令牌)
    async fn mint_token_if_absent(
        &self,
        shipment_id: i64,
        candidate_token: &str,
        at: DateTime<Utc>,
    ) -> RepositoryResult<MintOutcome>;
}
