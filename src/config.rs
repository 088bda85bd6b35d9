use std::path::PathBuf;
use std::time::Duration;

/// Runtime settings, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub project_root: PathBuf,
    pub rpc_url: String,
    pub snarkjs_bin: String,
    pub group_timeout: Duration,
    pub receipt_poll_interval: Duration,
}

impl HarnessConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let parse_u64 = |key: &str, default: u64| -> Result<u64, String> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| format!("Invalid {}={:?}: {}", key, raw, e)),
                None => Ok(default),
            }
        };

        Ok(Self {
            project_root: PathBuf::from(lookup("PROJECT_ROOT").unwrap_or_else(|| ".".to_string())),
            rpc_url: lookup("RPC_URL").unwrap_or_else(|| "http://127.0.0.1:8545".to_string()),
            snarkjs_bin: lookup("SNARKJS_BIN").unwrap_or_else(|| "snarkjs".to_string()),
            group_timeout: Duration::from_secs(parse_u64("GROUP_TIMEOUT_SECS", 100_000)?),
            receipt_poll_interval: Duration::from_millis(parse_u64("RECEIPT_POLL_MS", 200)?),
        })
    }
}
