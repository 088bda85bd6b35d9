use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::Address;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Contract deployment and read-only calls against a development chain.
#[allow(async_fn_in_trait)]
pub trait VerifierChain {
    /// Deploy a fresh instance of the named contract and wait for its receipt.
    async fn deploy(&self, contract_name: &str) -> Result<Address, String>;

    /// Execute a read-only call and return the raw return data.
    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, String>;
}

/// Extract the creation bytecode from a compiled contract artifact.
/// The JSON has a top-level `bytecode` field holding `0x`-prefixed hex.
pub(crate) fn load_bytecode_from_json(path: &Path) -> Result<String, String> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read contract artifact at {}: {}", path.display(), e))?;
    let json: serde_json::Value = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse contract artifact at {}: {}", path.display(), e))?;
    let bytecode = json["bytecode"]
        .as_str()
        .ok_or_else(|| format!("No 'bytecode' field in contract artifact at {}", path.display()))?;
    if bytecode.trim_start_matches("0x").is_empty() {
        return Err(format!(
            "Contract artifact at {} has empty bytecode (abstract contract or interface?)",
            path.display()
        ));
    }
    Ok(bytecode.to_string())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionReceipt {
    status: Option<String>,
    contract_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<serde_json::Value>,
    error: Option<RpcError>,
}

/// Ethereum JSON-RPC client for a node with unlocked accounts.
pub struct RpcClient {
    url: String,
    http: reqwest::Client,
    artifacts_dir: PathBuf,
    poll_interval: Duration,
    next_id: AtomicU64,
}

impl RpcClient {
    /// `project_root` is where compiled artifacts live, under
    /// `artifacts/contracts/<Name>.sol/<Name>.json`.
    pub fn new(url: &str, project_root: &Path, poll_interval: Duration) -> Self {
        Self {
            url: url.to_string(),
            http: reqwest::Client::new(),
            artifacts_dir: project_root.join("artifacts").join("contracts"),
            poll_interval,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn artifact_path(&self, contract_name: &str) -> PathBuf {
        self.artifacts_dir
            .join(format!("{}.sol", contract_name))
            .join(format!("{}.json", contract_name))
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, String> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });

        let response: RpcResponse = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("RPC {} to {} failed: {}", method, self.url, e))?
            .json()
            .await
            .map_err(|e| format!("RPC {} returned an invalid response: {}", method, e))?;

        if let Some(err) = response.error {
            return Err(format!("RPC {} error {}: {}", method, err.code, err.message));
        }

        serde_json::from_value(response.result.unwrap_or(serde_json::Value::Null))
            .map_err(|e| format!("RPC {} returned an unexpected result: {}", method, e))
    }

    async fn default_account(&self) -> Result<String, String> {
        let accounts: Vec<String> = self.request("eth_accounts", serde_json::json!([])).await?;
        accounts
            .into_iter()
            .next()
            .ok_or_else(|| "Node has no unlocked accounts".to_string())
    }

    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<TransactionReceipt, String> {
        loop {
            let receipt: Option<TransactionReceipt> = self
                .request("eth_getTransactionReceipt", serde_json::json!([tx_hash]))
                .await?;
            if let Some(receipt) = receipt {
                return Ok(receipt);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

impl VerifierChain for RpcClient {
    async fn deploy(&self, contract_name: &str) -> Result<Address, String> {
        let bytecode = load_bytecode_from_json(&self.artifact_path(contract_name))?;
        let from = self.default_account().await?;

        tracing::info!("Deploying {} from {}", contract_name, from);

        let tx_hash: String = self
            .request(
                "eth_sendTransaction",
                serde_json::json!([{ "from": from, "data": bytecode }]),
            )
            .await?;
        let receipt = self.wait_for_receipt(&tx_hash).await?;

        if receipt.status.as_deref() == Some("0x0") {
            return Err(format!("Deployment of {} reverted (tx {})", contract_name, tx_hash));
        }
        let address = receipt
            .contract_address
            .ok_or_else(|| format!("Receipt for {} has no contract address", tx_hash))?;
        let address = Address::from_str(&address)
            .map_err(|e| format!("Invalid contract address {:?}: {}", address, e))?;

        tracing::info!("{} deployed at {}", contract_name, address);
        Ok(address)
    }

    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, String> {
        let result: String = self
            .request(
                "eth_call",
                serde_json::json!([
                    { "to": to.to_string(), "data": format!("0x{}", hex::encode(&data)) },
                    "latest"
                ]),
            )
            .await?;
        hex::decode(result.trim_start_matches("0x"))
            .map_err(|e| format!("eth_call returned invalid hex: {}", e))
    }
}
