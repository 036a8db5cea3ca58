// ==========================================
// 报关预审系统 - 补单请求实体
// ==========================================
// 依据: Pipeline_Design_v1.0.md - 4.6 DocumentRequestTracker
// 红线: requested_names 创建后不可变; 状态单向 pending -> fulfilled
// ==========================================

use crate::domain::types::RequestStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// DocumentRequest - 报关行补单请求
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRequest {
    /// 请求 ID（自增主键）
    pub id: i64,
    /// 所属货运 ID
    pub shipment_id: i64,
    /// 发起请求的报关行 ID
    pub broker_id: i64,
    /// 请求的单证名称集合（创建后不可变）
    pub requested_names: Vec<String>,
    /// 报关行附言
    pub message: Option<String>,
    /// 请求状态
    pub status: RequestStatus,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 完成时间
    pub fulfilled_at: Option<DateTime<Utc>>,
}

impl DocumentRequest {
    /// 判定上传的单证名是否命中本请求中的某个名称
    ///
    /// 匹配规则: 名称大小写不敏感精确匹配
    pub fn matches_name(&self, document_name: &str) -> bool {
        self.requested_names
            .iter()
            .any(|n| n.eq_ignore_ascii_case(document_name))
    }

    /// 判定请求是否可由给定的已上传单证名集合完成
    ///
    /// 完成策略: 所有请求名称都必须有对应上传（ALL 策略）
    pub fn is_satisfied_by(&self, uploaded_names: &[String]) -> bool {
        !self.requested_names.is_empty()
            && self.requested_names.iter().all(|requested| {
                uploaded_names
                    .iter()
                    .any(|uploaded| uploaded.eq_ignore_ascii_case(requested))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(names: &[&str]) -> DocumentRequest {
        DocumentRequest {
            id: 1,
            shipment_id: 10,
            broker_id: 2,
            requested_names: names.iter().map(|n| n.to_string()).collect(),
            message: None,
            status: RequestStatus::Pending,
            created_at: Utc::now(),
            fulfilled_at: None,
        }
    }

    #[test]
    fn test_matches_name_case_insensitive() {
        let req = request(&["packing_list.pdf"]);
        assert!(req.matches_name("Packing_List.PDF"));
        assert!(!req.matches_name("invoice.pdf"));
    }

    #[test]
    fn test_satisfied_requires_all_names() {
        let req = request(&["packing_list.pdf", "invoice.pdf"]);
        assert!(!req.is_satisfied_by(&["packing_list.pdf".to_string()]));
        assert!(req.is_satisfied_by(&[
            "INVOICE.PDF".to_string(),
            "packing_list.pdf".to_string(),
        ]));
    }

    #[test]
    fn test_empty_request_never_satisfied() {
        let req = request(&[]);
        assert!(!req.is_satisfied_by(&["anything.pdf".to_string()]));
    }
}
