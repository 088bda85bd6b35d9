use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use ark_bn254::Fr;
use tokio::process::Command;

use crate::field::parse_field;
use crate::types::{CallData, CircuitInputs, ProofArtifact, ProvingSystem};

/// Witness computation and proving, as provided by the external toolchain.
#[allow(async_fn_in_trait)]
pub trait CircuitBackend {
    /// Evaluate the circuit and return the full witness vector.
    async fn compute_witness(&self, wasm: &Path, inputs: &CircuitInputs) -> Result<Vec<Fr>, String>;

    /// Compute a witness and prove it in one step.
    async fn full_prove(
        &self,
        system: ProvingSystem,
        inputs: &CircuitInputs,
        wasm: &Path,
        zkey: &Path,
    ) -> Result<ProofArtifact, String>;

    /// Convert a proof into the verifier contract's call arguments.
    async fn export_call_data(
        &self,
        system: ProvingSystem,
        artifact: &ProofArtifact,
    ) -> Result<CallData, String>;
}

static SCRATCH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Per-call working directory, removed on drop.
struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    fn new(label: &str) -> Result<Self, String> {
        let path = std::env::temp_dir().join(format!(
            "verifier_harness_{}_{}_{}",
            label,
            std::process::id(),
            SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::create_dir_all(&path)
            .map_err(|e| format!("Failed to create scratch dir {}: {}", path.display(), e))?;
        Ok(Self { path })
    }

    fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    fn write_json<T: serde::Serialize>(&self, name: &str, value: &T) -> Result<PathBuf, String> {
        let path = self.join(name);
        let contents = serde_json::to_string(value)
            .map_err(|e| format!("Failed to serialize {}: {}", name, e))?;
        std::fs::write(&path, contents)
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
        Ok(path)
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<T, String> {
        let path = self.join(name);
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.path).ok();
    }
}

/// Parse an exported witness: a JSON array of decimal strings (or numbers).
pub(crate) fn parse_witness_json(value: &serde_json::Value) -> Result<Vec<Fr>, String> {
    let entries = value
        .as_array()
        .ok_or_else(|| "Witness JSON is not an array".to_string())?;
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let raw = match entry {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                other => return Err(format!("Witness entry {} is not a number: {}", i, other)),
            };
            parse_field(&raw).map_err(|e| format!("Witness entry {}: {}", i, e))
        })
        .collect()
}

/// Drives the `snarkjs` command line tool.
pub struct Snarkjs {
    bin: String,
}

impl Snarkjs {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    async fn run(&self, args: &[&str]) -> Result<String, String> {
        tracing::debug!("Running {} {}", self.bin, args.join(" "));

        let output = Command::new(&self.bin)
            .args(args)
            .output()
            .await
            .map_err(|e| format!("Failed to run {}: {}", self.bin, e))?;

        if !output.status.success() {
            return Err(format!(
                "{} {} failed ({}): {}",
                self.bin,
                args.first().copied().unwrap_or_default(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| format!("{} produced non-UTF-8 output: {}", self.bin, e))
    }
}

fn path_arg(path: &Path) -> Result<&str, String> {
    path.to_str()
        .ok_or_else(|| format!("Path is not valid UTF-8: {}", path.display()))
}

impl CircuitBackend for Snarkjs {
    async fn compute_witness(&self, wasm: &Path, inputs: &CircuitInputs) -> Result<Vec<Fr>, String> {
        let scratch = ScratchDir::new("witness")?;
        let input = scratch.write_json("input.json", inputs)?;
        let wtns = scratch.join("witness.wtns");
        let json = scratch.join("witness.json");

        tracing::info!("Computing witness with {}", wasm.display());

        self.run(&["wtns", "calculate", path_arg(wasm)?, path_arg(&input)?, path_arg(&wtns)?])
            .await?;
        self.run(&["wtns", "export", "json", path_arg(&wtns)?, path_arg(&json)?])
            .await?;

        let value: serde_json::Value = scratch.read_json("witness.json")?;
        let witness = parse_witness_json(&value)?;
        tracing::info!("Witness computed: {} values", witness.len());
        Ok(witness)
    }

    async fn full_prove(
        &self,
        system: ProvingSystem,
        inputs: &CircuitInputs,
        wasm: &Path,
        zkey: &Path,
    ) -> Result<ProofArtifact, String> {
        let scratch = ScratchDir::new("prove")?;
        let input = scratch.write_json("input.json", inputs)?;
        let proof = scratch.join("proof.json");
        let public = scratch.join("public.json");

        tracing::info!(
            "Generating {} proof with {} and {}",
            system,
            wasm.display(),
            zkey.display()
        );

        self.run(&[
            system.as_str(),
            "fullprove",
            path_arg(&input)?,
            path_arg(wasm)?,
            path_arg(zkey)?,
            path_arg(&proof)?,
            path_arg(&public)?,
        ])
        .await?;

        let artifact = ProofArtifact {
            proof: scratch.read_json("proof.json")?,
            public_signals: scratch.read_json("public.json")?,
        };
        tracing::info!(
            "{} proof generated: {} public signals",
            system,
            artifact.public_signals.len()
        );
        Ok(artifact)
    }

    async fn export_call_data(
        &self,
        system: ProvingSystem,
        artifact: &ProofArtifact,
    ) -> Result<CallData, String> {
        let scratch = ScratchDir::new("calldata")?;
        let proof = scratch.write_json("proof.json", &artifact.proof)?;
        let public = scratch.write_json("public.json", &artifact.public_signals)?;

        let raw = self
            .run(&[
                "zkey",
                "export",
                "soliditycalldata",
                path_arg(&public)?,
                path_arg(&proof)?,
            ])
            .await?;

        CallData::parse(system, raw.trim())
    }
}
