// ==========================================
// 报关预审系统 - 合规数据集发布句柄
// ==========================================
// 依据: Pipeline_Design_v1.0.md - 5. 共享资源策略
// 红线: 只有初始化路径可写; 写入方式为"加载后整体替换", 不做原地修改
// 生命周期: uninitialized -> loaded -> reloaded*
// ==========================================

use crate::compliance::dataset::ComplianceDataset;
use crate::compliance::error::{DatasetError, DatasetResult};
use crate::compliance::loader::parse_ruleset;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{error, info, instrument};

// ==========================================
// ComplianceDatasetHandle - 进程级数据集句柄
// ==========================================
// 读取者克隆 Arc 快照, 整个校验运行期间使用同一快照;
// 并发替换不影响已取走的快照
#[derive(Default)]
pub struct ComplianceDatasetHandle {
    current: RwLock<Option<Arc<ComplianceDataset>>>,
}

impl ComplianceDatasetHandle {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
        }
    }

    /// 取当前快照（未初始化 => None）
    pub fn snapshot(&self) -> Option<Arc<ComplianceDataset>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// 取当前快照, 未初始化时返回 Uninitialized 错误
    pub fn snapshot_required(&self) -> DatasetResult<Arc<ComplianceDataset>> {
        self.snapshot().ok_or(DatasetError::Uninitialized)
    }

    /// 发布新快照（整体替换）
    fn publish(&self, dataset: Arc<ComplianceDataset>) {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(dataset);
    }

    /// 从规则文件初始化/重载合规数据集
    ///
    /// 全量解析成功才替换; 解析失败时先前的数据集保持生效并返回错误
    ///
    /// # 参数
    /// - source_path: 规则 CSV 文件路径
    ///
    /// # 返回
    /// - Ok(Arc<ComplianceDataset>): 新发布的快照
    /// - Err(DatasetError): 读取/解析失败（不影响现有快照）
    #[instrument(skip(self, source_path), fields(source = %source_path.as_ref().display()))]
    pub async fn initialize_from_path(
        &self,
        source_path: impl AsRef<Path>,
    ) -> DatasetResult<Arc<ComplianceDataset>> {
        let source_path = source_path.as_ref();
        let source = source_path.display().to_string();

        let bytes = tokio::fs::read(source_path).await.map_err(|e| {
            error!(error = %e, "规则文件读取失败");
            DatasetError::SourceReadError(format!("{}: {}", source, e))
        })?;

        let dataset = match parse_ruleset(&bytes, &source) {
            Ok(dataset) => Arc::new(dataset),
            Err(e) => {
                error!(error = %e, "规则集解析失败, 保留先前数据集");
                return Err(e);
            }
        };

        self.publish(dataset.clone());
        info!(
            rule_count = dataset.len(),
            "合规数据集已发布"
        );
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::rule::ComplianceRule;

    fn dataset(tag: &str, rule_count: usize) -> Arc<ComplianceDataset> {
        let rules = (0..rule_count)
            .map(|i| ComplianceRule {
                rule_id: format!("{}-{}", tag, i),
                document_type: "invoice".to_string(),
                origin_country: None,
                destination_country: None,
                hs_code_prefix: None,
                required_fields: vec![],
                constraints: vec![],
                message: None,
            })
            .collect();
        Arc::new(ComplianceDataset::new(rules, tag.to_string()))
    }

    #[test]
    fn test_uninitialized_snapshot_is_none() {
        let handle = ComplianceDatasetHandle::new();
        assert!(handle.snapshot().is_none());
        assert!(matches!(
            handle.snapshot_required(),
            Err(DatasetError::Uninitialized)
        ));
    }

    #[test]
    fn test_publish_replaces_whole_snapshot() {
        let handle = ComplianceDatasetHandle::new();
        handle.publish(dataset("A", 2));

        let first = handle.snapshot().unwrap();
        assert_eq!(first.len(), 2);

        handle.publish(dataset("B", 5));
        // 已取走的快照不受替换影响
        assert_eq!(first.len(), 2);
        assert_eq!(handle.snapshot().unwrap().len(), 5);
    }
}
