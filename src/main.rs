use verifier_harness::chain::RpcClient;
use verifier_harness::circuit::CircuitRegistry;
use verifier_harness::config::HarnessConfig;
use verifier_harness::driver::{Driver, RunSummary};
use verifier_harness::prover::Snarkjs;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "verifier_harness=info".into()),
        )
        .init();

    let config = HarnessConfig::from_env().unwrap_or_else(|e| {
        tracing::error!("Invalid configuration: {}", e);
        std::process::exit(2);
    });

    tracing::info!("Project root: {}", config.project_root.display());
    tracing::info!("Dev node: {}", config.rpc_url);

    let registry = CircuitRegistry::new(&config.project_root);
    let backend = Snarkjs::new(config.snarkjs_bin.as_str());
    let chain = RpcClient::new(
        &config.rpc_url,
        &config.project_root,
        config.receipt_poll_interval,
    );

    let driver = Driver::new(&backend, &chain, &registry, config.group_timeout);
    let reports = driver.run_all().await;

    let mut current_group = None;
    for report in &reports {
        if current_group != Some(report.group.as_str()) {
            println!("{}", report.group);
            current_group = Some(report.group.as_str());
        }
        println!("{}", report);
    }

    let summary = RunSummary::from_reports(&reports);
    println!();
    println!("  {} passing", summary.passed);
    if !summary.success() {
        println!("  {} failing", summary.failed);
        std::process::exit(1);
    }
}
