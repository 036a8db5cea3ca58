// ==========================================
// 审批令牌测试
// ==========================================
// 职责: 验证双审批门控、精确一次签发与幂等返回
// ==========================================


#[cfg(test)]
mod approval_token_test {
    use crate::test_helpers::TestEnv;
    use customs_preclear::approval::ApprovalTokenIssuer;
    use customs_preclear::domain::types::ApprovalSide;
    use customs_preclear::engine::OptionalEventPublisher;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn issuer(env: &TestEnv) -> ApprovalTokenIssuer {
        ApprovalTokenIssuer::new(env.approvals.clone(), OptionalEventPublisher::none())
    }

    // ==========================================
    // 门控: 单侧审批不签发
    // ==========================================

    #[tokio::test]
    async fn test_no_approval_returns_none() {
        let env = TestEnv::new();
        let issuer = issuer(&env);

        let (ok, token) = issuer
            .generate_token_if_both_approvals_complete(10)
            .await
            .unwrap();
        assert!(!ok);
        assert!(token.is_none());
    }

    #[tokio::test]
    async fn test_single_side_returns_none() {
        let env = TestEnv::new();
        let issuer = issuer(&env);

        issuer
            .record_approval(10, ApprovalSide::Shipper)
            .await
            .unwrap();
        let (ok, token) = issuer
            .generate_token_if_both_approvals_complete(10)
            .await
            .unwrap();
        assert!(!ok);
        assert!(token.is_none());

        // 另一侧也单独验证
        issuer
            .record_approval(11, ApprovalSide::Broker)
            .await
            .unwrap();
        let (ok, token) = issuer
            .generate_token_if_both_approvals_complete(11)
            .await
            .unwrap();
        assert!(!ok);
        assert!(token.is_none());
    }

    // ==========================================
    // 双审批齐备: 签发且幂等
    // ==========================================

    #[tokio::test]
    async fn test_both_complete_issues_token_idempotently() {
        let env = TestEnv::new();
        let issuer = issuer(&env);

        issuer
            .record_approval(10, ApprovalSide::Shipper)
            .await
            .unwrap();
        issuer
            .record_approval(10, ApprovalSide::Broker)
            .await
            .unwrap();

        let (ok1, token1) = issuer
            .generate_token_if_both_approvals_complete(10)
            .await
            .unwrap();
        assert!(ok1);
        let token1 = token1.unwrap();
        assert_eq!(token1.len(), 20);

        // 第二次调用返回同一令牌
        let (ok2, token2) = issuer
            .generate_token_if_both_approvals_complete(10)
            .await
            .unwrap();
        assert!(ok2);
        assert_eq!(token2.unwrap(), token1);

        // 状态中持久化的也是同一令牌
        let state = issuer.get_state(10).await.unwrap();
        assert_eq!(state.token.as_deref(), Some(token1.as_str()));
        assert!(state.token_generated_at.is_some());
    }

    // ==========================================
    // 审批单向性: 重复审批不覆盖时间戳
    // ==========================================

    #[tokio::test]
    async fn test_repeated_approval_keeps_first_timestamp() {
        let env = TestEnv::new();
        let issuer = issuer(&env);

        let first = issuer
            .record_approval(10, ApprovalSide::Shipper)
            .await
            .unwrap();
        let second = issuer
            .record_approval(10, ApprovalSide::Shipper)
            .await
            .unwrap();
        assert_eq!(first.shipper_approved_at, second.shipper_approved_at);
    }

    // ==========================================
    // 并发首次观察者: 不得各自铸造
    // ==========================================

    #[tokio::test]
    async fn test_concurrent_callers_get_same_token() {
        let env = TestEnv::new();
        let issuer = Arc::new(issuer(&env));

        issuer
            .record_approval(10, ApprovalSide::Shipper)
            .await
            .unwrap();
        issuer
            .record_approval(10, ApprovalSide::Broker)
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let issuer = issuer.clone();
            handles.push(tokio::spawn(async move {
                issuer
                    .generate_token_if_both_approvals_complete(10)
                    .await
                    .unwrap()
            }));
        }

        let mut tokens = HashSet::new();
        for handle in handles {
            let (ok, token) = handle.await.unwrap();
            assert!(ok);
            tokens.insert(token.unwrap());
        }
        // 全部调用者拿到同一令牌
        assert_eq!(tokens.len(), 1);
    }

    // ==========================================
    // 货运间隔离: 各自签发各自的令牌
    // ==========================================

    #[tokio::test]
    async fn test_tokens_isolated_per_shipment() {
        let env = TestEnv::new();
        let issuer = issuer(&env);

        for shipment_id in [10, 11] {
            issuer
                .record_approval(shipment_id, ApprovalSide::Shipper)
                .await
                .unwrap();
            issuer
                .record_approval(shipment_id, ApprovalSide::Broker)
                .await
                .unwrap();
        }

        let (_, token_a) = issuer
            .generate_token_if_both_approvals_complete(10)
            .await
            .unwrap();
        let (_, token_b) = issuer
            .generate_token_if_both_approvals_complete(11)
            .await
            .unwrap();
        assert_ne!(token_a.unwrap(), token_b.unwrap());
    }
}
