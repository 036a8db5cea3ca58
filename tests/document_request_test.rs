// ==========================================
// 补单请求测试
// ==========================================
// 职责: 验证补单请求创建与"上传即核销"（ALL 策略）
// ==========================================


#[cfg(test)]
mod document_request_test {
    use crate::test_helpers::TestEnv;
    use customs_preclear::domain::types::RequestStatus;
    use customs_preclear::engine::OptionalEventPublisher;
    use customs_preclear::tracker::DocumentRequestTracker;

    fn tracker(env: &TestEnv) -> DocumentRequestTracker {
        DocumentRequestTracker::new(
            env.requests.clone(),
            env.documents.clone(),
            OptionalEventPublisher::none(),
        )
    }

    // ==========================================
    // 场景 D: 请求单一单证, 上传后 pending -> fulfilled
    // ==========================================

    #[tokio::test]
    async fn test_scenario_d_single_name_fulfilled_on_upload() {
        let env = TestEnv::new();
        let tracker = tracker(&env);

        let request = tracker
            .create_request(
                10,
                2,
                vec!["packing_list.pdf".to_string()],
                Some("请补交装箱单".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(request.status, RequestStatus::Pending);

        // 发货方上传匹配单证
        env.seed_text_document(10, "packing list", "packing_list.pdf", "packing list body", 0)
            .await;
        let fulfilled = tracker
            .fulfill_on_upload(10, "packing_list.pdf")
            .await
            .unwrap();
        assert_eq!(fulfilled, vec![request.id]);

        let requests = tracker.list_requests(10).await.unwrap();
        assert_eq!(requests[0].status, RequestStatus::Fulfilled);
        assert!(requests[0].fulfilled_at.is_some());
    }

    // ==========================================
    // 名称匹配大小写不敏感
    // ==========================================

    #[tokio::test]
    async fn test_fulfillment_match_is_case_insensitive() {
        let env = TestEnv::new();
        let tracker = tracker(&env);

        let request = tracker
            .create_request(10, 2, vec!["Packing_List.PDF".to_string()], None)
            .await
            .unwrap();

        env.seed_text_document(10, "packing list", "packing_list.pdf", "body", 0)
            .await;
        let fulfilled = tracker
            .fulfill_on_upload(10, "packing_list.pdf")
            .await
            .unwrap();
        assert_eq!(fulfilled, vec![request.id]);
    }

    // ==========================================
    // ALL 策略: 多名称请求须全部上传才核销
    // ==========================================

    #[tokio::test]
    async fn test_multi_name_request_requires_all_uploads() {
        let env = TestEnv::new();
        let tracker = tracker(&env);

        let request = tracker
            .create_request(
                10,
                2,
                vec!["packing_list.pdf".to_string(), "invoice.pdf".to_string()],
                None,
            )
            .await
            .unwrap();

        // 只上传其一 => 保持 pending
        env.seed_text_document(10, "packing list", "packing_list.pdf", "body", 0)
            .await;
        let fulfilled = tracker
            .fulfill_on_upload(10, "packing_list.pdf")
            .await
            .unwrap();
        assert!(fulfilled.is_empty());
        assert_eq!(
            tracker.list_requests(10).await.unwrap()[0].status,
            RequestStatus::Pending
        );

        // 上传第二份 => 核销
        env.seed_text_document(10, "invoice", "invoice.pdf", "body", 1)
            .await;
        let fulfilled = tracker.fulfill_on_upload(10, "invoice.pdf").await.unwrap();
        assert_eq!(fulfilled, vec![request.id]);
        assert_eq!(
            tracker.list_requests(10).await.unwrap()[0].status,
            RequestStatus::Fulfilled
        );
    }

    // ==========================================
    // 不相关上传不影响请求
    // ==========================================

    #[tokio::test]
    async fn test_unrelated_upload_leaves_request_pending() {
        let env = TestEnv::new();
        let tracker = tracker(&env);

        tracker
            .create_request(10, 2, vec!["packing_list.pdf".to_string()], None)
            .await
            .unwrap();

        env.seed_text_document(10, "invoice", "something_else.pdf", "body", 0)
            .await;
        let fulfilled = tracker
            .fulfill_on_upload(10, "something_else.pdf")
            .await
            .unwrap();
        assert!(fulfilled.is_empty());
    }

    // ==========================================
    // 货运间隔离: 其他货运的上传不核销本货运请求
    // ==========================================

    #[tokio::test]
    async fn test_fulfillment_isolated_per_shipment() {
        let env = TestEnv::new();
        let tracker = tracker(&env);

        tracker
            .create_request(10, 2, vec!["packing_list.pdf".to_string()], None)
            .await
            .unwrap();

        // 同名单证上传到另一货运
        env.seed_text_document(11, "packing list", "packing_list.pdf", "body", 0)
            .await;
        let fulfilled = tracker
            .fulfill_on_upload(11, "packing_list.pdf")
            .await
            .unwrap();
        assert!(fulfilled.is_empty());
        assert_eq!(
            tracker.list_requests(10).await.unwrap()[0].status,
            RequestStatus::Pending
        );
    }

    // ==========================================
    // 一次上传可核销多条请求
    // ==========================================

    #[tokio::test]
    async fn test_one_upload_can_fulfill_multiple_requests() {
        let env = TestEnv::new();
        let tracker = tracker(&env);

        let first = tracker
            .create_request(10, 2, vec!["invoice.pdf".to_string()], None)
            .await
            .unwrap();
        let second = tracker
            .create_request(10, 3, vec!["invoice.pdf".to_string()], None)
            .await
            .unwrap();

        env.seed_text_document(10, "invoice", "invoice.pdf", "body", 0)
            .await;
        let fulfilled = tracker.fulfill_on_upload(10, "invoice.pdf").await.unwrap();
        assert_eq!(fulfilled.len(), 2);
        assert!(fulfilled.contains(&first.id));
        assert!(fulfilled.contains(&second.id));
    }

    // ==========================================
    // 空名称集拒绝创建
    // ==========================================

    #[tokio::test]
    async fn test_empty_names_rejected() {
        let env = TestEnv::new();
        let tracker = tracker(&env);

        let result = tracker
            .create_request(10, 2, vec!["  ".to_string()], None)
            .await;
        assert!(result.is_err());
    }
}
