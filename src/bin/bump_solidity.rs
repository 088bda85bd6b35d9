use verifier_harness::circuit::CircuitRegistry;
use verifier_harness::config::HarnessConfig;
use verifier_harness::patch::patch;

fn main() {
    // Quiet on success unless RUST_LOG says otherwise
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let config = HarnessConfig::from_env().unwrap_or_else(|e| {
        tracing::error!("Invalid configuration: {}", e);
        std::process::exit(2);
    });

    let registry = CircuitRegistry::new(&config.project_root);
    for target in registry.patch_targets() {
        if let Err(e) = patch(&target) {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    }
}
