// ==========================================
// 校验引擎集成测试
// ==========================================
// 职责: 验证货运级校验主流程与状态推导
// ==========================================


#[cfg(test)]
mod validation_engine_test {
    use crate::test_helpers::{invoice_ruleset_csv, TestEnv, RULESET_HEADER};
    use customs_preclear::analyzer::StubFieldAnalyzer;
    use customs_preclear::domain::types::{IssueKind, IssueSeverity, ValidationStatus};
    use customs_preclear::engine::ValidationError;
    use std::sync::Arc;

    // ==========================================
    // 场景 A: 发票单证 + AI 返回发票号 => passed
    // ==========================================

    #[tokio::test]
    async fn test_scenario_a_invoice_with_field_passes() {
        let env = TestEnv::new();
        env.load_ruleset(&invoice_ruleset_csv()).await;
        env.seed_text_document(10, "invoice", "invoice.txt", "Commercial invoice for electronics", 0)
            .await;

        let engine = env.engine_with(Arc::new(StubFieldAnalyzer::with_fields(&[(
            "invoice_number",
            "INV-1",
        )])));

        let result = engine.validate_shipment_documents(10).await.unwrap();
        assert_eq!(result.status, ValidationStatus::Passed);
        assert!(result.issues.is_empty());
        assert_eq!(result.score, 100);
        assert_eq!(result.document_outcomes.len(), 1);
        assert!(result.document_outcomes[0].rules_evaluated);
    }

    // ==========================================
    // 场景 B: AI 返回空映射 => failed + 缺字段问题
    // ==========================================

    #[tokio::test]
    async fn test_scenario_b_empty_fields_fails() {
        let env = TestEnv::new();
        env.load_ruleset(&invoice_ruleset_csv()).await;
        env.seed_text_document(10, "invoice", "invoice.txt", "Commercial invoice for electronics", 0)
            .await;

        let engine = env.engine_with(Arc::new(StubFieldAnalyzer::empty()));

        let result = engine.validate_shipment_documents(10).await.unwrap();
        assert_eq!(result.status, ValidationStatus::Failed);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].severity, IssueSeverity::Failed);
        assert_eq!(result.issues[0].kind, IssueKind::MissingField);
        assert_eq!(result.issues[0].field.as_deref(), Some("invoice_number"));
    }

    // ==========================================
    // 场景 C: AI 超时 => needs_review + ProviderFailure
    // ==========================================

    #[tokio::test]
    async fn test_scenario_c_analyzer_timeout_needs_review() {
        let env = TestEnv::new();
        env.load_ruleset(&invoice_ruleset_csv()).await;
        env.seed_text_document(10, "invoice", "invoice.txt", "Commercial invoice", 0)
            .await;

        let engine = env.engine_with(Arc::new(StubFieldAnalyzer::hanging()));

        let result = engine.validate_shipment_documents(10).await.unwrap();
        assert_eq!(result.status, ValidationStatus::NeedsReview);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].kind, IssueKind::ProviderFailure);
        assert!(!result.document_outcomes[0].rules_evaluated);
    }

    // ==========================================
    // 场景 E: 数据集未初始化 => 错误且不落缓存
    // ==========================================

    #[tokio::test]
    async fn test_scenario_e_dataset_uninitialized() {
        let env = TestEnv::new();
        env.seed_text_document(10, "invoice", "invoice.txt", "Commercial invoice", 0)
            .await;

        let engine = env.engine_with(Arc::new(StubFieldAnalyzer::empty()));

        let err = engine.validate_shipment_documents(10).await.unwrap_err();
        assert!(matches!(err, ValidationError::DatasetUninitialized));
        // 未写任何结果
        assert!(engine.get_validation_result(10).await.unwrap().is_none());
    }

    // ==========================================
    // 零单证 => not_run（仍落缓存）
    // ==========================================

    #[tokio::test]
    async fn test_zero_documents_is_not_run() {
        let env = TestEnv::new();
        env.load_ruleset(&invoice_ruleset_csv()).await;

        let engine = env.engine_with(Arc::new(StubFieldAnalyzer::empty()));

        let result = engine.validate_shipment_documents(10).await.unwrap();
        assert_eq!(result.status, ValidationStatus::NotRun);
        assert!(result.issues.is_empty());

        let cached = engine.get_validation_result(10).await.unwrap().unwrap();
        assert_eq!(cached.status, ValidationStatus::NotRun);
    }

    // ==========================================
    // 幂等性: 输入不变 => 问题列表字节级一致
    // ==========================================

    #[tokio::test]
    async fn test_rerun_is_byte_identical() {
        let env = TestEnv::new();
        let csv = format!(
            "{}R1,invoice,,,,invoice_number;hs_code,,,,,,\nR2,invoice,,,,,weight,,0,100,,\n",
            RULESET_HEADER
        );
        env.load_ruleset(&csv).await;
        env.seed_text_document(10, "invoice", "a.txt", "first document", 0)
            .await;
        env.seed_text_document(10, "invoice", "b.txt", "second document", 1)
            .await;

        let engine = env.engine_with(Arc::new(StubFieldAnalyzer::with_fields(&[(
            "weight", "250.0",
        )])));

        let first = engine.validate_shipment_documents(10).await.unwrap();
        let second = engine.validate_shipment_documents(10).await.unwrap();

        let first_issues = serde_json::to_string(&first.issues).unwrap();
        let second_issues = serde_json::to_string(&second.issues).unwrap();
        assert_eq!(first_issues, second_issues);
        assert_eq!(first.document_outcomes, second.document_outcomes);
        assert_eq!(first.status, second.status);
    }

    // ==========================================
    // 问题顺序: 单证上传顺序优先于完成时间
    // ==========================================

    #[tokio::test]
    async fn test_issue_order_follows_upload_order() {
        let env = TestEnv::new();
        env.load_ruleset(&invoice_ruleset_csv()).await;
        let doc_a = env
            .seed_text_document(10, "invoice", "a.txt", "doc a", 0)
            .await;
        let doc_b = env
            .seed_text_document(10, "invoice", "b.txt", "doc b", 1)
            .await;

        let engine = env.engine_with(Arc::new(StubFieldAnalyzer::empty()));
        let result = engine.validate_shipment_documents(10).await.unwrap();

        let issue_docs: Vec<i64> = result.issues.iter().map(|i| i.document_id).collect();
        assert_eq!(issue_docs, vec![doc_a.id, doc_b.id]);
    }

    // ==========================================
    // 单证级隔离: 一份损坏不拖垮整船
    // ==========================================

    #[tokio::test]
    async fn test_one_corrupt_document_does_not_abort_run() {
        let env = TestEnv::new();
        env.load_ruleset(&invoice_ruleset_csv()).await;
        // 合法发票
        env.seed_text_document(10, "invoice", "good.txt", "Commercial invoice", 0)
            .await;
        // 申报 json 但内容损坏
        env.seed_text_document(10, "invoice", "bad.json", "{not json", 1)
            .await;

        let engine = env.engine_with(Arc::new(StubFieldAnalyzer::with_fields(&[(
            "invoice_number",
            "INV-1",
        )])));

        let result = engine.validate_shipment_documents(10).await.unwrap();
        // 好单证通过, 坏单证产生提取失败问题 => 整体 needs_review
        assert_eq!(result.status, ValidationStatus::NeedsReview);
        assert_eq!(result.document_outcomes.len(), 2);
        assert!(result.document_outcomes[0].rules_evaluated);
        assert!(!result.document_outcomes[1].rules_evaluated);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].kind, IssueKind::ExtractionFailure);
    }

    // ==========================================
    // 无适用规则: 通过但 rules_evaluated=false
    // ==========================================

    #[tokio::test]
    async fn test_no_applicable_rules_passes_with_flag() {
        let env = TestEnv::new();
        env.load_ruleset(&invoice_ruleset_csv()).await;
        env.seed_text_document(10, "certificate", "cert.txt", "certificate body", 0)
            .await;

        let engine = env.engine_with(Arc::new(StubFieldAnalyzer::empty()));
        let result = engine.validate_shipment_documents(10).await.unwrap();

        assert_eq!(result.status, ValidationStatus::Passed);
        assert!(result.issues.is_empty());
        assert!(!result.document_outcomes[0].rules_evaluated);
    }

    // ==========================================
    // 非瞬时 AI 错误: 单证标记 ProviderFailure, 其余继续
    // ==========================================

    #[tokio::test]
    async fn test_non_transient_provider_error_marks_needs_review() {
        let env = TestEnv::new();
        env.load_ruleset(&invoice_ruleset_csv()).await;
        env.seed_text_document(10, "invoice", "invoice.txt", "Commercial invoice", 0)
            .await;

        let stub = Arc::new(StubFieldAnalyzer::failing("鉴权失败", false));
        let engine = env.engine_with(stub.clone());

        let result = engine.validate_shipment_documents(10).await.unwrap();
        assert_eq!(result.status, ValidationStatus::NeedsReview);
        assert_eq!(result.issues[0].kind, IssueKind::ProviderFailure);
        // 非瞬时错误不重试
        assert_eq!(stub.call_count(), 1);
    }

    // ==========================================
    // 缓存读写: 保存整体覆盖
    // ==========================================

    #[tokio::test]
    async fn test_cache_overwritten_by_new_run() {
        let env = TestEnv::new();
        env.load_ruleset(&invoice_ruleset_csv()).await;
        env.seed_text_document(10, "invoice", "invoice.txt", "Commercial invoice", 0)
            .await;

        // 第一次: AI 无字段 => failed
        let failing = env.engine_with(Arc::new(StubFieldAnalyzer::empty()));
        let first = failing.validate_shipment_documents(10).await.unwrap();
        assert_eq!(first.status, ValidationStatus::Failed);

        // 第二次: 字段齐备 => passed, 缓存被覆盖
        let passing = env.engine_with(Arc::new(StubFieldAnalyzer::with_fields(&[(
            "invoice_number",
            "INV-1",
        )])));
        passing.validate_shipment_documents(10).await.unwrap();

        let cached = passing.get_validation_result(10).await.unwrap().unwrap();
        assert_eq!(cached.status, ValidationStatus::Passed);
    }

    // ==========================================
    // 只读投影: 不触碰缓存
    // ==========================================

    #[tokio::test]
    async fn test_extract_projection_does_not_write_cache() {
        let env = TestEnv::new();
        env.load_ruleset(&invoice_ruleset_csv()).await;
        env.seed_text_document(10, "invoice", "invoice.txt", "Invoice # 1234567", 0)
            .await;

        let engine = env.engine_with(Arc::new(StubFieldAnalyzer::with_fields(&[(
            "hs_code", "850440",
        )])));

        let extracted = engine.extract_shipment_documents(10, 1).await.unwrap();
        assert_eq!(extracted.len(), 1);
        // 结构化候选（行嗅探）与 AI 结果合并
        assert_eq!(
            extracted[0].parsed_fields.get("invoice_number").map(String::as_str),
            Some("1234567")
        );
        assert_eq!(
            extracted[0].parsed_fields.get("hs_code").map(String::as_str),
            Some("850440")
        );

        // 投影不写缓存
        assert!(engine.get_validation_result(10).await.unwrap().is_none());
    }

    // ==========================================
    // 单证级回写: 校验后单证带状态标注
    // ==========================================

    #[tokio::test]
    async fn test_document_annotations_written_back() {
        let env = TestEnv::new();
        env.load_ruleset(&invoice_ruleset_csv()).await;
        let doc = env
            .seed_text_document(10, "invoice", "invoice.txt", "Commercial invoice", 0)
            .await;

        let engine = env.engine_with(Arc::new(StubFieldAnalyzer::empty()));
        engine.validate_shipment_documents(10).await.unwrap();

        let reloaded = env.documents.find_by_id(doc.id).unwrap().unwrap();
        assert_eq!(reloaded.validation_status.as_deref(), Some("fail"));
        assert!(reloaded.validation_notes_json.is_some());
    }
}
