// ==========================================
// 报关预审系统 - 命令行入口
// ==========================================
// 用途: 运维/开发工具, 初始化合规数据集并对指定货运执行一次校验
// 用法: customs-preclear <db_path> <ruleset_csv> <shipment_id>
// ==========================================

use customs_preclear::analyzer::HeuristicFieldAnalyzer;
use customs_preclear::compliance::ComplianceDatasetHandle;
use customs_preclear::config::ConfigManager;
use customs_preclear::engine::{OptionalEventPublisher, ValidationEngine};
use customs_preclear::logging;
use customs_preclear::repository::{ShipmentDocumentRepository, ValidationResultRepository};
use customs_preclear::storage::LocalBlobStorage;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 4 {
        eprintln!("用法: {} <db_path> <ruleset_csv> <shipment_id>", args[0]);
        return ExitCode::from(2);
    }
    let db_path = &args[1];
    let ruleset_path = &args[2];
    let shipment_id: i64 = match args[3].parse() {
        Ok(id) => id,
        Err(_) => {
            eprintln!("shipment_id 必须为整数: {}", args[3]);
            return ExitCode::from(2);
        }
    };

    match run(db_path, ruleset_path, shipment_id).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "校验执行失败");
            ExitCode::FAILURE
        }
    }
}

async fn run(
    db_path: &str,
    ruleset_path: &str,
    shipment_id: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(db_path, ruleset_path, shipment_id, "报关预审校验启动");

    // ===== 装配 =====
    let documents = Arc::new(ShipmentDocumentRepository::new(db_path)?);
    let results = Arc::new(ValidationResultRepository::new(db_path)?);
    let config = Arc::new(ConfigManager::new(db_path)?);
    let storage = Arc::new(LocalBlobStorage::in_default_data_dir());
    let analyzer = Arc::new(HeuristicFieldAnalyzer::new());
    let dataset = Arc::new(ComplianceDatasetHandle::new());

    // ===== 初始化合规数据集 =====
    let snapshot = dataset.initialize_from_path(ruleset_path).await?;
    info!(rule_count = snapshot.len(), "合规数据集初始化完成");

    // ===== 执行校验 =====
    let engine = ValidationEngine::new(
        documents,
        results,
        storage,
        analyzer,
        dataset,
        config,
        OptionalEventPublisher::none(),
    );

    let result = engine.validate_shipment_documents(shipment_id).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
