use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::patch::{ContractPattern, PatchTarget};
use crate::types::{circuit_inputs, CircuitInfo, ProvingSystem};

/// Registry of the circuit scenarios, in execution order.
pub struct CircuitRegistry {
    root: PathBuf,
    circuits: Vec<CircuitInfo>,
}

/// Scenario definitions for the three verifier contracts.
fn circuit_metadata() -> Vec<CircuitInfo> {
    vec![
        CircuitInfo {
            id: "hello_world_groth16".to_string(),
            display_name: "HelloWorld".to_string(),
            proving_system: ProvingSystem::Groth16,
            verifier_contract: "HelloWorldVerifier".to_string(),
            wasm_path: "contracts/circuits/HelloWorld/HelloWorld_js/HelloWorld.wasm".to_string(),
            zkey_path: "contracts/circuits/HelloWorld/circuit_final.zkey".to_string(),
            inputs: circuit_inputs(&[("a", 2), ("b", 3)]),
            expected_witness: vec![1, 6],
            product_label: "2x3".to_string(),
        },
        CircuitInfo {
            id: "multiplier3_groth16".to_string(),
            display_name: "Multiplier3 with Groth16".to_string(),
            proving_system: ProvingSystem::Groth16,
            verifier_contract: "Multiplier3Verifier".to_string(),
            wasm_path: "contracts/circuits/Multiplier3/Multiplier3_js/Multiplier3.wasm".to_string(),
            zkey_path: "contracts/circuits/Multiplier3/circuit_final.zkey".to_string(),
            inputs: circuit_inputs(&[("a", 2), ("b", 3), ("c", 3)]),
            expected_witness: vec![1, 18, 2, 3, 3, 6],
            product_label: "2x3x3".to_string(),
        },
        CircuitInfo {
            id: "multiplier3_plonk".to_string(),
            display_name: "Multiplier3 with PLONK".to_string(),
            proving_system: ProvingSystem::Plonk,
            verifier_contract: "Multiplier3PlonkVerifier".to_string(),
            wasm_path: "contracts/circuits/Multiplier3_plonk/Multiplier3_js/Multiplier3.wasm"
                .to_string(),
            zkey_path: "contracts/circuits/Multiplier3_plonk/circuit_final.zkey".to_string(),
            inputs: circuit_inputs(&[("a", 2), ("b", 3), ("c", 3)]),
            expected_witness: vec![1, 18, 2, 3, 3, 6],
            product_label: "2x3x3".to_string(),
        },
    ]
}

impl CircuitRegistry {
    /// Build the registry for a project rooted at `root`.
    ///
    /// Expected layout:
    /// ```text
    /// root/
    ///   contracts/<Verifier>.sol
    ///   contracts/circuits/<Circuit>/<Circuit>_js/<Circuit>.wasm
    ///   contracts/circuits/<Circuit>/circuit_final.zkey
    /// ```
    ///
    /// Missing proving artifacts are logged but do not fail construction; the
    /// affected cases fail when they run.
    pub fn new(root: &Path) -> Arc<Self> {
        let registry = Self {
            root: root.to_path_buf(),
            circuits: circuit_metadata(),
        };

        for circuit in &registry.circuits {
            for path in [registry.wasm_path(circuit), registry.zkey_path(circuit)] {
                if !path.exists() {
                    tracing::warn!(
                        "Artifact for {} not found: {}",
                        circuit.id,
                        path.display()
                    );
                }
            }
        }

        tracing::info!("Circuit registry initialized: {} circuits", registry.len());
        Arc::new(registry)
    }

    /// Directory holding the verifier contract sources.
    pub fn contracts_dir(&self) -> PathBuf {
        self.root.join("contracts")
    }

    pub fn wasm_path(&self, circuit: &CircuitInfo) -> PathBuf {
        self.root.join(&circuit.wasm_path)
    }

    pub fn zkey_path(&self, circuit: &CircuitInfo) -> PathBuf {
        self.root.join(&circuit.zkey_path)
    }

    /// Get circuit metadata by ID.
    pub fn get(&self, circuit_id: &str) -> Result<&CircuitInfo, String> {
        self.circuits
            .iter()
            .find(|c| c.id == circuit_id)
            .ok_or_else(|| format!("Circuit not found: {}", circuit_id))
    }

    /// All circuits in execution order.
    pub fn list_circuits(&self) -> &[CircuitInfo] {
        &self.circuits
    }

    /// One patch target per verifier contract.
    pub fn patch_targets(&self) -> Vec<PatchTarget> {
        let contracts_dir = self.contracts_dir();
        self.circuits
            .iter()
            .map(|c| {
                let pattern = match c.proving_system {
                    ProvingSystem::Groth16 => ContractPattern::Verifier,
                    ProvingSystem::Plonk => ContractPattern::PlonkVerifier,
                };
                PatchTarget::new(&contracts_dir, pattern, &c.verifier_contract)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.circuits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.circuits.is_empty()
    }
}
