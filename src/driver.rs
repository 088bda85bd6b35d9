use std::fmt;
use std::time::{Duration, Instant};

use crate::chain::VerifierChain;
use crate::circuit::CircuitRegistry;
use crate::field::{field_eq, to_decimal, BN254_SCALAR_PRIME};
use crate::prover::CircuitBackend;
use crate::types::{CallData, CircuitInfo};
use crate::verifier::VerifierContract;

/// The three checks run against every circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseKind {
    WitnessCorrect,
    ValidProofAccepted,
    InvalidProofRejected,
}

impl CaseKind {
    pub const ALL: [CaseKind; 3] = [
        CaseKind::WitnessCorrect,
        CaseKind::ValidProofAccepted,
        CaseKind::InvalidProofRejected,
    ];

    pub fn description(&self) -> &'static str {
        match self {
            CaseKind::WitnessCorrect => "Circuit should multiply the inputs correctly",
            CaseKind::ValidProofAccepted => "Should return true for correct proof",
            CaseKind::InvalidProofRejected => "Should return false for invalid proof",
        }
    }
}

/// Outcome of one case.
#[derive(Debug)]
pub struct CaseReport {
    pub group: String,
    pub case: CaseKind,
    pub outcome: Result<(), String>,
    pub elapsed: Duration,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        self.outcome.is_ok()
    }
}

impl fmt::Display for CaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Ok(()) => write!(
                f,
                "  ok   {} :: {} ({} ms)",
                self.group,
                self.case.description(),
                self.elapsed.as_millis()
            ),
            Err(e) => write!(
                f,
                "  FAIL {} :: {}\n       {}",
                self.group,
                self.case.description(),
                e
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn from_reports(reports: &[CaseReport]) -> Self {
        let passed = reports.iter().filter(|r| r.passed()).count();
        Self {
            passed,
            failed: reports.len() - passed,
        }
    }

    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Runs every circuit scenario sequentially against a backend and a chain.
pub struct Driver<'a, B, C> {
    backend: &'a B,
    chain: &'a C,
    registry: &'a CircuitRegistry,
    group_timeout: Duration,
}

impl<'a, B: CircuitBackend, C: VerifierChain> Driver<'a, B, C> {
    pub fn new(
        backend: &'a B,
        chain: &'a C,
        registry: &'a CircuitRegistry,
        group_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            chain,
            registry,
            group_timeout,
        }
    }

    /// Run all groups in registry order.
    pub async fn run_all(&self) -> Vec<CaseReport> {
        let mut reports = Vec::new();
        for circuit in self.registry.list_circuits() {
            reports.extend(self.run_group(circuit).await);
        }
        reports
    }

    /// Run the three cases of one circuit under a shared deadline. Once the
    /// deadline passes, the in-flight case and every remaining case fail.
    pub async fn run_group(&self, circuit: &CircuitInfo) -> Vec<CaseReport> {
        tracing::info!("Running group {} ({})", circuit.display_name, circuit.proving_system);

        let deadline = tokio::time::Instant::now() + self.group_timeout;
        let mut reports = Vec::with_capacity(CaseKind::ALL.len());

        for case in CaseKind::ALL {
            let started = Instant::now();
            let outcome = if tokio::time::Instant::now() >= deadline {
                Err(self.timeout_message())
            } else {
                match tokio::time::timeout_at(deadline, self.run_case(circuit, case)).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(self.timeout_message()),
                }
            };

            match &outcome {
                Ok(()) => tracing::info!("{} :: {} passed", circuit.display_name, case.description()),
                Err(e) => tracing::warn!(
                    "{} :: {} failed: {}",
                    circuit.display_name,
                    case.description(),
                    e
                ),
            }

            reports.push(CaseReport {
                group: circuit.display_name.clone(),
                case,
                outcome,
                elapsed: started.elapsed(),
            });
        }
        reports
    }

    fn timeout_message(&self) -> String {
        format!("Timed out after {}s", self.group_timeout.as_secs_f64())
    }

    /// Deploy a fresh verifier and run one case against it.
    async fn run_case(&self, circuit: &CircuitInfo, case: CaseKind) -> Result<(), String> {
        let verifier = VerifierContract::deploy(self.chain, &circuit.verifier_contract).await?;
        tracing::debug!("Fresh {} at {}", circuit.verifier_contract, verifier.address());
        match case {
            CaseKind::WitnessCorrect => self.check_witness(circuit).await,
            CaseKind::ValidProofAccepted => self.check_valid_proof(circuit, &verifier).await,
            CaseKind::InvalidProofRejected => self.check_invalid_proof(circuit, &verifier).await,
        }
    }

    async fn check_witness(&self, circuit: &CircuitInfo) -> Result<(), String> {
        let witness = self
            .backend
            .compute_witness(&self.registry.wasm_path(circuit), &circuit.inputs)
            .await?;
        tracing::debug!(
            "Comparing {} witness values modulo {}",
            circuit.expected_witness.len(),
            BN254_SCALAR_PRIME
        );

        if witness.len() < circuit.expected_witness.len() {
            return Err(format!(
                "Witness has {} values, expected at least {}",
                witness.len(),
                circuit.expected_witness.len()
            ));
        }

        for (i, (actual, expected)) in witness.iter().zip(&circuit.expected_witness).enumerate() {
            if !field_eq(actual, *expected) {
                return Err(format!(
                    "witness[{}]: expected {}, got {}",
                    i,
                    expected,
                    to_decimal(actual)
                ));
            }
        }
        Ok(())
    }

    async fn check_valid_proof(
        &self,
        circuit: &CircuitInfo,
        verifier: &VerifierContract<'_, C>,
    ) -> Result<(), String> {
        let artifact = self
            .backend
            .full_prove(
                circuit.proving_system,
                &circuit.inputs,
                &self.registry.wasm_path(circuit),
                &self.registry.zkey_path(circuit),
            )
            .await?;

        if let Some(first) = artifact.public_signals.first() {
            tracing::info!("{} = {}", circuit.product_label, first);
        }

        let call = self
            .backend
            .export_call_data(circuit.proving_system, &artifact)
            .await?;
        if call.system() != circuit.proving_system {
            return Err(format!(
                "Call data is for {}, verifier expects {}",
                call.system(),
                circuit.proving_system
            ));
        }
        if call.public_inputs().len() != artifact.public_signals.len() {
            return Err(format!(
                "Call data carries {} public inputs, proof has {} public signals",
                call.public_inputs().len(),
                artifact.public_signals.len()
            ));
        }

        if verifier.verify_proof(&call).await? {
            Ok(())
        } else {
            Err("verifyProof returned false for a valid proof".to_string())
        }
    }

    async fn check_invalid_proof(
        &self,
        circuit: &CircuitInfo,
        verifier: &VerifierContract<'_, C>,
    ) -> Result<(), String> {
        let call = CallData::invalid(circuit.proving_system);
        if verifier.verify_proof(&call).await? {
            Err("verifyProof returned true for an all-zero proof".to_string())
        } else {
            Ok(())
        }
    }
}
