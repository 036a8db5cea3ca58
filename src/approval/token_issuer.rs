// ==========================================
// 报关预审系统 - 预审令牌签发器
// ==========================================
// 依据: Pipeline_Design_v1.0.md - 4.5 ApprovalTokenIssuer
// 红线: 双审批齐备才签发; 每货运精确一次; 重复调用返回同一令牌
// ==========================================
// 原子性: 铸造在 ApprovalStore 的单事务内复核与写入,
//         并发首次观察者中只有一个 Minted, 其余拿到 AlreadyIssued
// ==========================================

use crate::approval::{ApprovalStore, MintOutcome};
use crate::domain::approval::ApprovalState;
use crate::domain::types::ApprovalSide;
use crate::engine::events::{OptionalEventPublisher, ValidationEvent};
use crate::repository::error::RepositoryResult;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// 令牌长度（字符）
const TOKEN_LEN: usize = 20;

// ==========================================
// ApprovalTokenIssuer - 令牌签发器
// ==========================================
pub struct ApprovalTokenIssuer {
    store: Arc<dyn ApprovalStore>,
    events: OptionalEventPublisher,
}

impl ApprovalTokenIssuer {
    /// 创建新的签发器实例
    pub fn new(store: Arc<dyn ApprovalStore>, events: OptionalEventPublisher) -> Self {
        Self { store, events }
    }

    /// 读取货运审批状态
    pub async fn get_state(&self, shipment_id: i64) -> RepositoryResult<ApprovalState> {
        self.store.get_state(shipment_id).await
    }

    /// 记录一侧审批完成（单向, 幂等）
    #[instrument(skip(self), fields(shipment_id, side = %side))]
    pub async fn record_approval(
        &self,
        shipment_id: i64,
        side: ApprovalSide,
    ) -> RepositoryResult<ApprovalState> {
        let state = self
            .store
            .record_approval(shipment_id, side, Utc::now())
            .await?;
        info!(
            shipment_id,
            both_complete = state.both_complete(),
            "审批记录完成"
        );
        Ok(state)
    }

    /// 双审批齐备时签发预审令牌
    ///
    /// # 返回
    /// - (false, None): 双审批未齐, 不签发
    /// - (true, Some(token)): 已签发; 重复调用返回同一令牌（幂等）
    #[instrument(skip(self), fields(shipment_id))]
    pub async fn generate_token_if_both_approvals_complete(
        &self,
        shipment_id: i64,
    ) -> RepositoryResult<(bool, Option<String>)> {
        // 候选令牌先生成; 事务内若发现既有令牌则弃用候选
        let candidate = generate_token();

        match self
            .store
            .mint_token_if_absent(shipment_id, &candidate, Utc::now())
            .await?
        {
            MintOutcome::NotEligible => {
                info!(shipment_id, "双审批未齐, 不签发令牌");
                Ok((false, None))
            }
            MintOutcome::AlreadyIssued(token) => {
                info!(shipment_id, "令牌已存在, 返回既有令牌");
                Ok((true, Some(token)))
            }
            MintOutcome::Minted(token) => {
                info!(shipment_id, "预审令牌签发成功");
                self.events
                    .publish_best_effort(ValidationEvent::TokenIssued { shipment_id });
                Ok((true, Some(token)))
            }
        }
    }
}

/// 生成候选令牌: v4 UUID 十六进制大写, 取前 20 位
fn generate_token() -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .to_ascii_uppercase()
        .chars()
        .take(TOKEN_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_generate_token_unique() {
        assert_ne!(generate_token(), generate_token());
    }
}
