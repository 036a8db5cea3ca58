// ==========================================
// 报关预审系统 - 校验引擎编排器
// ==========================================
// 依据: Pipeline_Design_v1.0.md - 4.4 ValidationEngine
// 用途: 协调 内容提取 -> AI 解析 -> 规则匹配 -> 结果聚合 主流程
// ==========================================
// 红线:
// - 单证级失败收敛为问题, 不中断整船校验
// - 同一货运同时最多一次运行（冲突即拒绝）
// - 结果只在流程末尾一次性写入; 中途取消不留半成品
// - 问题顺序 = 单证上传顺序 -> 规则评估顺序
// ==========================================

use crate::analyzer::{extract_fields_with_retry, AiFieldExtractor, RetryPolicy};
use crate::compliance::dataset::ComplianceDataset;
use crate::compliance::matcher::RuleMatcher;
use crate::compliance::store::ComplianceDatasetHandle;
use crate::config::validation_config_trait::ValidationConfigReader;
use crate::domain::document::{ExtractedDocument, ShipmentDocument};
use crate::domain::types::{IssueKind, IssueSeverity, ValidationStatus};
use crate::domain::validation::{DocumentOutcome, ValidationIssue, ValidationResult};
use crate::engine::error::{EngineResult, ValidationError};
use crate::engine::events::{OptionalEventPublisher, ValidationEvent};
use crate::engine::stores::{DocumentStore, ValidationResultStore};
use crate::extractor::content_extractor::ContentExtractor;
use crate::storage::BlobStorage;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

// ==========================================
// DocumentReport - 单证处理结论（聚合中间态）
// ==========================================
struct DocumentReport {
    outcome: DocumentOutcome,
    issues: Vec<ValidationIssue>,
    /// 提取/AI 解析环节失败（needs_review 的判定依据）
    pipeline_failure: bool,
}

// ==========================================
// RunGuard - 货运级运行占位（RAII 释放）
// ==========================================
// 红线: 按货运 ID 去重, 不是全局锁; 不同货运完全并行
struct RunGuard<'a> {
    in_flight: &'a Mutex<HashSet<i64>>,
    shipment_id: i64,
}

impl<'a> RunGuard<'a> {
    fn try_acquire(in_flight: &'a Mutex<HashSet<i64>>, shipment_id: i64) -> Option<Self> {
        let mut set = in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !set.insert(shipment_id) {
            return None;
        }
        Some(Self {
            in_flight,
            shipment_id,
        })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let mut set = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        set.remove(&self.shipment_id);
    }
}

// ==========================================
// ValidationEngine - 校验引擎
// ==========================================
pub struct ValidationEngine {
    documents: Arc<dyn DocumentStore>,
    results: Arc<dyn ValidationResultStore>,
    storage: Arc<dyn BlobStorage>,
    analyzer: Arc<dyn AiFieldExtractor>,
    dataset: Arc<ComplianceDatasetHandle>,
    config: Arc<dyn ValidationConfigReader>,
    extractor: ContentExtractor,
    matcher: RuleMatcher,
    events: OptionalEventPublisher,
    /// 进行中的货运校验集合（并发去重用）
    in_flight: Mutex<HashSet<i64>>,
}

impl ValidationEngine {
    /// 创建新的校验引擎实例
    ///
    /// # 参数
    /// - documents / results: 持久化契约
    /// - storage: 对象存储
    /// - analyzer: AI 字段解析提供方
    /// - dataset: 合规数据集句柄
    /// - config: 配置读取器
    /// - events: 事件发布（可为空）
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        results: Arc<dyn ValidationResultStore>,
        storage: Arc<dyn BlobStorage>,
        analyzer: Arc<dyn AiFieldExtractor>,
        dataset: Arc<ComplianceDatasetHandle>,
        config: Arc<dyn ValidationConfigReader>,
        events: OptionalEventPublisher,
    ) -> Self {
        Self {
            documents,
            results,
            storage,
            analyzer,
            dataset,
            config,
            extractor: ContentExtractor::new(),
            matcher: RuleMatcher::new(),
            events,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// 执行货运级合规校验
    ///
    /// # 流程
    /// 1. 取当前合规数据集快照（整次运行使用同一快照）
    /// 2. 货运级并发去重（冲突即拒绝）
    /// 3. 逐单证并发执行 下载 -> 提取 -> AI 解析 -> 规则匹配
    /// 4. 聚合为单一 ValidationResult 并一次性写入缓存
    ///
    /// # 返回
    /// - Ok(ValidationResult): 本次运行结果（已落缓存）
    /// - Err(DatasetUninitialized): 数据集未初始化, 未写任何结果
    /// - Err(ConcurrentRunConflict): 同货运已有运行在途
    #[instrument(skip(self), fields(shipment_id))]
    pub async fn validate_shipment_documents(
        &self,
        shipment_id: i64,
    ) -> EngineResult<ValidationResult> {
        // ==========================================
        // 步骤1: 数据集快照
        // ==========================================
        let dataset = self.dataset.snapshot_required()?;

        // ==========================================
        // 步骤2: 并发去重（拒绝策略）
        // ==========================================
        let _guard = RunGuard::try_acquire(&self.in_flight, shipment_id)
            .ok_or(ValidationError::ConcurrentRunConflict(shipment_id))?;

        info!(
            shipment_id,
            rule_count = dataset.len(),
            "开始执行货运合规校验"
        );

        // ==========================================
        // 步骤3: 取单证集（上传顺序）
        // ==========================================
        let documents = self.documents.list_by_shipment(shipment_id).await?;

        if documents.is_empty() {
            debug!(shipment_id, "货运无单证, 结果记为 not_run");
            let result = ValidationResult {
                shipment_id,
                status: ValidationStatus::NotRun,
                issues: vec![],
                document_outcomes: vec![],
                score: 0,
                message: "货运尚无单证, 请先上传基础单证".to_string(),
                computed_at: Utc::now(),
            };
            self.results.save(&result).await?;
            self.publish_completed(&result);
            return Ok(result);
        }

        // ==========================================
        // 步骤4: 读取运行参数
        // ==========================================
        let analyzer_timeout = Duration::from_millis(
            self.config
                .get_analyzer_timeout_ms()
                .await
                .map_err(|e| ValidationError::InternalError(e.to_string()))?,
        );
        let download_timeout = Duration::from_millis(
            self.config
                .get_download_timeout_ms()
                .await
                .map_err(|e| ValidationError::InternalError(e.to_string()))?,
        );
        let retry_policy = RetryPolicy {
            max_attempts: self
                .config
                .get_analyzer_max_attempts()
                .await
                .map_err(|e| ValidationError::InternalError(e.to_string()))?,
            backoff_base_ms: self
                .config
                .get_analyzer_backoff_base_ms()
                .await
                .map_err(|e| ValidationError::InternalError(e.to_string()))?,
        };

        // ==========================================
        // 步骤5: 逐单证并发处理（join_all 保持输入顺序）
        // ==========================================
        debug!(
            shipment_id,
            document_count = documents.len(),
            "开始逐单证处理"
        );
        let reports = futures::future::join_all(documents.iter().map(|doc| {
            self.process_document(doc, &dataset, analyzer_timeout, download_timeout, retry_policy)
        }))
        .await;

        // ==========================================
        // 步骤6: 聚合（单证上传顺序 -> 规则评估顺序）
        // ==========================================
        let mut issues = Vec::new();
        let mut document_outcomes = Vec::new();
        let mut any_pipeline_failure = false;
        for report in reports {
            issues.extend(report.issues);
            document_outcomes.push(report.outcome);
            any_pipeline_failure |= report.pipeline_failure;
        }

        let any_failed = issues
            .iter()
            .any(|i| i.severity == IssueSeverity::Failed);

        let (status, message) = if any_failed {
            (
                ValidationStatus::Failed,
                format!("校验未通过, 共 {} 个问题, 请修正后重新提交单证", issues.len()),
            )
        } else if any_pipeline_failure {
            (
                ValidationStatus::NeedsReview,
                "部分单证无法自动解析, 需人工复核".to_string(),
            )
        } else {
            (
                ValidationStatus::Passed,
                "全部单证校验通过, 可发起报关行复核".to_string(),
            )
        };

        let result = ValidationResult {
            shipment_id,
            status,
            score: ValidationResult::compute_score(&issues),
            issues,
            document_outcomes,
            message,
            computed_at: Utc::now(),
        };

        // ==========================================
        // 步骤7: 一次性写入缓存
        // ==========================================
        // 唯一写入点: 运行在此之前被取消时, 缓存保持先前结果不变
        self.results.save(&result).await?;

        // ==========================================
        // 步骤8: 单证级回写（尽力而为, 失败只记日志）
        // ==========================================
        self.write_back_annotations(&result).await;

        // ==========================================
        // 步骤9: 事件发布
        // ==========================================
        self.publish_completed(&result);

        info!(
            shipment_id,
            status = %result.status,
            issue_count = result.issues.len(),
            score = result.score,
            "货运合规校验完成"
        );
        Ok(result)
    }

    /// 处理单份单证: 下载 -> 提取 -> AI 解析 -> 规则匹配
    ///
    /// 所有失败收敛为单证级问题, 不向上抛出
    async fn process_document(
        &self,
        doc: &ShipmentDocument,
        dataset: &ComplianceDataset,
        analyzer_timeout: Duration,
        download_timeout: Duration,
        retry_policy: RetryPolicy,
    ) -> DocumentReport {
        // ===== 下载 =====
        let bytes = match tokio::time::timeout(
            download_timeout,
            self.storage.download(&doc.storage_key),
        )
        .await
        {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => {
                warn!(document_id = doc.id, error = %e, "单证下载失败");
                return Self::extraction_failure_report(doc, format!("单证下载失败: {}", e));
            }
            Err(_) => {
                warn!(document_id = doc.id, "单证下载超时");
                return Self::extraction_failure_report(doc, "单证下载超时".to_string());
            }
        };

        // ===== 内容提取 =====
        let content = match self.extractor.extract(&bytes, doc.source_type()) {
            Ok(content) => content,
            Err(e) => {
                warn!(document_id = doc.id, error = %e, "单证内容提取失败");
                return Self::extraction_failure_report(doc, e.issue_message());
            }
        };

        // ===== AI 字段解析（超时 + 有界重试） =====
        let ai_fields = match extract_fields_with_retry(
            &self.analyzer,
            &content.text,
            &doc.document_type,
            analyzer_timeout,
            retry_policy,
        )
        .await
        {
            Ok(fields) => fields,
            Err(e) => {
                warn!(document_id = doc.id, error = %e, "AI 字段解析失败");
                return DocumentReport {
                    outcome: DocumentOutcome {
                        document_id: doc.id,
                        document_type: doc.document_type.clone(),
                        rules_evaluated: false,
                        issue_count: 1,
                    },
                    issues: vec![ValidationIssue::pipeline_issue(
                        doc.id,
                        IssueKind::ProviderFailure,
                        format!("AI 字段解析失败: {}", e),
                    )],
                    pipeline_failure: true,
                };
            }
        };

        // ===== 字段合并: 结构化候选优先, AI 补缺 =====
        let fields = merge_fields(content.field_candidates, ai_fields);

        // ===== 规则匹配 =====
        let outcome = self
            .matcher
            .match_document(&fields, &doc.document_type, dataset, doc.id);

        DocumentReport {
            outcome: DocumentOutcome {
                document_id: doc.id,
                document_type: doc.document_type.clone(),
                rules_evaluated: outcome.rules_evaluated,
                issue_count: outcome.issues.len(),
            },
            issues: outcome.issues,
            pipeline_failure: false,
        }
    }

    /// 提取失败的单证结论
    fn extraction_failure_report(doc: &ShipmentDocument, message: String) -> DocumentReport {
        DocumentReport {
            outcome: DocumentOutcome {
                document_id: doc.id,
                document_type: doc.document_type.clone(),
                rules_evaluated: false,
                issue_count: 1,
            },
            issues: vec![ValidationIssue::pipeline_issue(
                doc.id,
                IssueKind::ExtractionFailure,
                message,
            )],
            pipeline_failure: true,
        }
    }

    /// 只读投影: 提取货运全部单证, 不计算也不写 ValidationResult
    ///
    /// 用途: 预览/调试; 与缓存结果互不影响
    #[instrument(skip(self), fields(shipment_id, shipper_id))]
    pub async fn extract_shipment_documents(
        &self,
        shipment_id: i64,
        shipper_id: i64,
    ) -> EngineResult<Vec<ExtractedDocument>> {
        let documents = self.documents.list_by_shipment(shipment_id).await?;
        info!(
            shipment_id,
            shipper_id,
            document_count = documents.len(),
            "开始只读提取货运单证"
        );

        let analyzer_timeout = Duration::from_millis(
            self.config
                .get_analyzer_timeout_ms()
                .await
                .map_err(|e| ValidationError::InternalError(e.to_string()))?,
        );
        let download_timeout = Duration::from_millis(
            self.config
                .get_download_timeout_ms()
                .await
                .map_err(|e| ValidationError::InternalError(e.to_string()))?,
        );
        let retry_policy = RetryPolicy {
            max_attempts: self
                .config
                .get_analyzer_max_attempts()
                .await
                .map_err(|e| ValidationError::InternalError(e.to_string()))?,
            backoff_base_ms: self
                .config
                .get_analyzer_backoff_base_ms()
                .await
                .map_err(|e| ValidationError::InternalError(e.to_string()))?,
        };

        let mut extracted = Vec::new();
        for doc in &documents {
            let bytes = match tokio::time::timeout(
                download_timeout,
                self.storage.download(&doc.storage_key),
            )
            .await
            {
                Ok(Ok(bytes)) => bytes,
                Ok(Err(e)) => {
                    warn!(document_id = doc.id, error = %e, "单证下载失败, 跳过");
                    continue;
                }
                Err(_) => {
                    warn!(document_id = doc.id, "单证下载超时, 跳过");
                    continue;
                }
            };

            let content = match self.extractor.extract(&bytes, doc.source_type()) {
                Ok(content) => content,
                Err(e) => {
                    warn!(document_id = doc.id, error = %e, "单证内容提取失败, 跳过");
                    continue;
                }
            };

            let ai_fields = match extract_fields_with_retry(
                &self.analyzer,
                &content.text,
                &doc.document_type,
                analyzer_timeout,
                retry_policy,
            )
            .await
            {
                Ok(fields) => fields,
                Err(e) => {
                    warn!(document_id = doc.id, error = %e, "AI 字段解析失败, 仅保留结构化候选");
                    BTreeMap::new()
                }
            };

            extracted.push(ExtractedDocument {
                shipment_id: doc.shipment_id,
                document_id: doc.id,
                document_type: doc.document_type.clone(),
                file_name: doc.file_name.clone(),
                source_type: doc.source_type(),
                parsed_fields: merge_fields(content.field_candidates, ai_fields),
                extracted_content: content.text,
                extracted_at: Utc::now(),
            });
        }

        info!(
            shipment_id,
            extracted_count = extracted.len(),
            "只读提取完成"
        );
        Ok(extracted)
    }

    /// 读取货运的缓存校验结果（从未运行 => Ok(None)）
    pub async fn get_validation_result(
        &self,
        shipment_id: i64,
    ) -> EngineResult<Option<ValidationResult>> {
        Ok(self.results.get(shipment_id).await?)
    }

    /// 保存校验结果（整体覆盖同货运的先前结果）
    pub async fn save_validation_result(&self, result: &ValidationResult) -> EngineResult<()> {
        Ok(self.results.save(result).await?)
    }

    /// 单证级回写（尽力而为）
    async fn write_back_annotations(&self, result: &ValidationResult) {
        for outcome in &result.document_outcomes {
            let doc_issues: Vec<&ValidationIssue> = result
                .issues
                .iter()
                .filter(|i| i.document_id == outcome.document_id)
                .collect();

            let status = if doc_issues
                .iter()
                .any(|i| i.severity == IssueSeverity::Failed)
            {
                "fail"
            } else if !doc_issues.is_empty() {
                "warning"
            } else {
                "pass"
            };

            let notes = serde_json::json!({
                "status": status,
                "issue_count": outcome.issue_count,
                "rules_evaluated": outcome.rules_evaluated,
                "computed_at": result.computed_at.to_rfc3339(),
            })
            .to_string();

            if let Err(e) = self
                .documents
                .write_validation_annotations(outcome.document_id, status, &notes)
                .await
            {
                warn!(
                    document_id = outcome.document_id,
                    error = %e,
                    "单证校验状态回写失败（忽略）"
                );
            }
        }
    }

    /// 发布"校验完成"事件
    fn publish_completed(&self, result: &ValidationResult) {
        self.events
            .publish_best_effort(ValidationEvent::ValidationCompleted {
                shipment_id: result.shipment_id,
                status: result.status,
                issue_count: result.issues.len(),
            });
    }
}

/// 字段合并: 结构化候选优先, AI 结果只填空位
fn merge_fields(
    mut base: BTreeMap<String, String>,
    ai_fields: BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    for (key, value) in ai_fields {
        if value.trim().is_empty() {
            continue;
        }
        base.entry(key).or_insert(value);
    }
    base
}
