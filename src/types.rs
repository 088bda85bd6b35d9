use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use alloy_primitives::{keccak256, Bytes, U256};
use alloy_sol_types::{sol, sol_data, SolCall, SolType};
use serde::{Deserialize, Serialize};

sol! {
    interface IPlonkVerifier {
        function verifyProof(bytes proof, uint256[] inputs) external view returns (bool);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvingSystem {
    Groth16,
    Plonk,
}

impl ProvingSystem {
    /// Subcommand name used by the prover CLI.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProvingSystem::Groth16 => "groth16",
            ProvingSystem::Plonk => "plonk",
        }
    }
}

impl fmt::Display for ProvingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvingSystem::Groth16 => f.write_str("Groth16"),
            ProvingSystem::Plonk => f.write_str("PLONK"),
        }
    }
}

/// Named circuit inputs, serialized as the prover's `input.json`.
pub type CircuitInputs = BTreeMap<String, String>;

/// Build a [`CircuitInputs`] map from `(name, value)` pairs.
pub fn circuit_inputs(pairs: &[(&str, u64)]) -> CircuitInputs {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

/// Proof plus public signals as produced by a full-prove call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofArtifact {
    pub proof: serde_json::Value,
    pub public_signals: Vec<String>,
}

/// Arguments of a verifier's `verifyProof` method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallData {
    Groth16 {
        a: [U256; 2],
        b: [[U256; 2]; 2],
        c: [U256; 2],
        public_inputs: Vec<U256>,
    },
    Plonk {
        proof: Bytes,
        public_inputs: Vec<U256>,
    },
}

/// Parse the comma-separated export as the elements of one JSON array.
fn export_elements(raw: &str) -> Result<Vec<serde_json::Value>, String> {
    serde_json::from_str(&format!("[{}]", raw.trim()))
        .map_err(|e| format!("Call data export is not a JSON list: {}", e))
}

fn word(value: &serde_json::Value) -> Result<U256, String> {
    let s = value
        .as_str()
        .ok_or_else(|| format!("Call data value is not a string: {}", value))?;
    U256::from_str(s.trim()).map_err(|e| format!("Invalid call data integer {:?}: {}", s, e))
}

fn word_list(value: &serde_json::Value, what: &str) -> Result<Vec<U256>, String> {
    value
        .as_array()
        .ok_or_else(|| format!("{} is not a list: {}", what, value))?
        .iter()
        .map(word)
        .collect()
}

fn word_pair(value: &serde_json::Value, what: &str) -> Result<[U256; 2], String> {
    match word_list(value, what)?.as_slice() {
        [x, y] => Ok([*x, *y]),
        other => Err(format!("{} has {} values, expected 2", what, other.len())),
    }
}

impl CallData {
    /// Parse the prover's Solidity call data export.
    ///
    /// Groth16 exports read `["a0","a1"],[["b00","b01"],["b10","b11"]],["c0","c1"],[inputs...]`;
    /// PLONK exports read `0x<proof bytes>,[inputs...]`. Any other layout is an error.
    pub fn parse(system: ProvingSystem, raw: &str) -> Result<Self, String> {
        match system {
            ProvingSystem::Groth16 => {
                let groups = export_elements(raw)?;
                let [a, b, c, inputs] = groups.as_slice() else {
                    return Err(format!(
                        "Groth16 call data has {} groups, expected 4 (a, b, c, inputs)",
                        groups.len()
                    ));
                };
                let b = match b.as_array().map(Vec::as_slice) {
                    Some([b0, b1]) => [word_pair(b0, "Groth16 b[0]")?, word_pair(b1, "Groth16 b[1]")?],
                    _ => return Err(format!("Groth16 b is not a 2x2 list: {}", b)),
                };
                Ok(CallData::Groth16 {
                    a: word_pair(a, "Groth16 a")?,
                    b,
                    c: word_pair(c, "Groth16 c")?,
                    public_inputs: word_list(inputs, "Groth16 public inputs")?,
                })
            }
            ProvingSystem::Plonk => {
                // The proof blob is exported as bare hex; quote it so the
                // whole export reads as a JSON list.
                let raw = raw.trim();
                let quoted = match raw.split_once(',') {
                    Some((proof, rest)) if proof.trim().starts_with("0x") => {
                        format!("\"{}\",{}", proof.trim(), rest)
                    }
                    Some(_) => raw.to_string(),
                    None => return Err("PLONK call data has no public input list".to_string()),
                };
                let groups = export_elements(&quoted)?;
                let [proof, inputs] = groups.as_slice() else {
                    return Err(format!(
                        "PLONK call data has {} groups, expected 2 (proof, inputs)",
                        groups.len()
                    ));
                };
                let proof = proof.as_str().ok_or_else(|| {
                    "PLONK proof is not a hex blob (uint256[24] proof layout is not supported)"
                        .to_string()
                })?;
                let proof = hex::decode(proof.trim_start_matches("0x"))
                    .map_err(|e| format!("Invalid PLONK proof hex: {}", e))?;
                Ok(CallData::Plonk {
                    proof: Bytes::from(proof),
                    public_inputs: word_list(inputs, "PLONK public inputs")?,
                })
            }
        }
    }

    /// Structurally valid but meaningless arguments: zero group elements or a
    /// zero placeholder proof, with a single zero public input.
    pub fn invalid(system: ProvingSystem) -> Self {
        match system {
            ProvingSystem::Groth16 => CallData::Groth16 {
                a: [U256::ZERO; 2],
                b: [[U256::ZERO; 2]; 2],
                c: [U256::ZERO; 2],
                public_inputs: vec![U256::ZERO],
            },
            ProvingSystem::Plonk => CallData::Plonk {
                proof: Bytes::from(vec![0u8]),
                public_inputs: vec![U256::ZERO],
            },
        }
    }

    pub fn system(&self) -> ProvingSystem {
        match self {
            CallData::Groth16 { .. } => ProvingSystem::Groth16,
            CallData::Plonk { .. } => ProvingSystem::Plonk,
        }
    }

    pub fn public_inputs(&self) -> &[U256] {
        match self {
            CallData::Groth16 { public_inputs, .. } | CallData::Plonk { public_inputs, .. } => {
                public_inputs
            }
        }
    }

    /// Flattened decimal-string form of the numeric arguments. The PLONK
    /// proof blob is rendered as `0x` hex.
    pub fn decimal_args(&self) -> Vec<String> {
        match self {
            CallData::Groth16 {
                a,
                b,
                c,
                public_inputs,
            } => a
                .iter()
                .chain(b.iter().flatten())
                .chain(c.iter())
                .chain(public_inputs.iter())
                .map(|w| w.to_string())
                .collect(),
            CallData::Plonk {
                proof,
                public_inputs,
            } => std::iter::once(format!("0x{}", hex::encode(proof)))
                .chain(public_inputs.iter().map(|w| w.to_string()))
                .collect(),
        }
    }

    /// Solidity signature of the matching `verifyProof` overload.
    pub fn signature(&self) -> String {
        match self {
            CallData::Groth16 { public_inputs, .. } => format!(
                "verifyProof(uint256[2],uint256[2][2],uint256[2],uint256[{}])",
                public_inputs.len()
            ),
            CallData::Plonk { .. } => IPlonkVerifier::verifyProofCall::SIGNATURE.to_string(),
        }
    }

    /// ABI-encoded `verifyProof` call, selector included.
    pub fn abi_encode(&self) -> Vec<u8> {
        match self {
            // All Groth16 arguments are static arrays, so the head is the
            // concatenation of every word in declaration order.
            CallData::Groth16 {
                a,
                b,
                c,
                public_inputs,
            } => {
                let selector = keccak256(self.signature().as_bytes());
                let mut data = selector[..4].to_vec();
                for word in a
                    .iter()
                    .chain(b.iter().flatten())
                    .chain(c.iter())
                    .chain(public_inputs.iter())
                {
                    data.extend_from_slice(&word.to_be_bytes::<32>());
                }
                data
            }
            CallData::Plonk {
                proof,
                public_inputs,
            } => IPlonkVerifier::verifyProofCall {
                proof: proof.clone(),
                inputs: public_inputs.clone(),
            }
            .abi_encode(),
        }
    }
}

/// Decode the boolean returned by `verifyProof`.
pub fn decode_bool_return(data: &[u8]) -> Result<bool, String> {
    if data.is_empty() {
        return Err("verifyProof returned no data".to_string());
    }
    <sol_data::Bool as SolType>::abi_decode(data, true)
        .map_err(|e| format!("Failed to decode verifyProof result: {}", e))
}

/// Static description of one circuit scenario.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CircuitInfo {
    pub id: String,
    pub display_name: String,
    pub proving_system: ProvingSystem,
    pub verifier_contract: String,
    pub wasm_path: String,
    pub zkey_path: String,
    pub inputs: CircuitInputs,
    pub expected_witness: Vec<u64>,
    /// Label for the first public signal in logs, e.g. `2x3`.
    pub product_label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    sol! {
        interface IGroth16Verifier {
            function verifyProof(uint256[2] a, uint256[2][2] b, uint256[2] c, uint256[1] input)
                external view returns (bool);
        }
    }

    const GROTH16_EXPORT: &str = r#"["0x01", "0x02"],[["0x03", "0x04"],["0x05", "0x06"]],["0x07", "0x08"],["0x0000000000000000000000000000000000000000000000000000000000000006"]"#;

    const PLONK_EXPORT: &str = r#"0xdeadbeef,["0x0000000000000000000000000000000000000000000000000000000000000012"]"#;

    fn u(n: u64) -> U256 {
        U256::from(n)
    }

    #[test]
    fn test_proving_system_names() {
        assert_eq!(ProvingSystem::Groth16.as_str(), "groth16");
        assert_eq!(ProvingSystem::Plonk.as_str(), "plonk");
        assert_eq!(ProvingSystem::Plonk.to_string(), "PLONK");
        assert_eq!(serde_json::to_value(ProvingSystem::Groth16).unwrap(), "groth16");
    }

    #[test]
    fn test_circuit_inputs_serialize() {
        let inputs = circuit_inputs(&[("b", 3), ("a", 2)]);
        let json = serde_json::to_string(&inputs).unwrap();
        assert_eq!(json, r#"{"a":"2","b":"3"}"#);
    }

    #[test]
    fn test_proof_artifact_roundtrip_field_names() {
        let artifact = ProofArtifact {
            proof: serde_json::json!({"protocol": "groth16"}),
            public_signals: vec!["6".to_string()],
        };
        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["publicSignals"][0], "6");
        assert_eq!(json["proof"]["protocol"], "groth16");
    }

    #[test]
    fn test_parse_groth16_export() {
        let call = CallData::parse(ProvingSystem::Groth16, GROTH16_EXPORT).unwrap();
        assert_eq!(
            call,
            CallData::Groth16 {
                a: [u(1), u(2)],
                b: [[u(3), u(4)], [u(5), u(6)]],
                c: [u(7), u(8)],
                public_inputs: vec![u(6)],
            }
        );
        assert_eq!(call.system(), ProvingSystem::Groth16);
    }

    #[test]
    fn test_parse_groth16_export_too_short() {
        let result = CallData::parse(ProvingSystem::Groth16, r#"["0x01", "0x02"]"#);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("expected 4"));
    }

    #[test]
    fn test_parse_groth16_export_bad_integer() {
        let raw = GROTH16_EXPORT.replace("0x07", "0xzz");
        let result = CallData::parse(ProvingSystem::Groth16, &raw);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Invalid call data integer"));
    }

    #[test]
    fn test_parse_groth16_export_flat_list_rejected() {
        // nine integers, but not in the a/b/c/inputs layout
        let raw = r#"["0x01","0x02","0x03","0x04","0x05","0x06","0x07","0x08","0x06"]"#;
        let result = CallData::parse(ProvingSystem::Groth16, raw);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("expected 4"));
    }

    #[test]
    fn test_parse_groth16_export_wrong_group_shape() {
        let raw = r#"["0x01","0x02","0x03"],[["0x03","0x04"],["0x05","0x06"]],["0x07","0x08"],["0x06"]"#;
        let result = CallData::parse(ProvingSystem::Groth16, raw);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Groth16 a has 3 values"));

        let raw = r#"["0x01","0x02"],["0x03","0x04","0x05","0x06"],["0x07","0x08"],["0x06"]"#;
        let result = CallData::parse(ProvingSystem::Groth16, raw);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("not a 2x2 list"));
    }

    #[test]
    fn test_parse_plonk_word_array_export_rejected() {
        let words: Vec<String> = (1..=24).map(|i| format!("\"0x{:064x}\"", i)).collect();
        let raw = format!("[{}],[\"0x{:064x}\"]", words.join(","), 18);
        let result = CallData::parse(ProvingSystem::Plonk, &raw);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("uint256[24] proof layout is not supported"));
    }

    #[test]
    fn test_parse_plonk_export_extra_group_rejected() {
        let result = CallData::parse(ProvingSystem::Plonk, r#"0xdeadbeef,["0x01"],["0x02"]"#);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("expected 2"));
    }

    #[test]
    fn test_parse_plonk_export() {
        let call = CallData::parse(ProvingSystem::Plonk, PLONK_EXPORT).unwrap();
        assert_eq!(
            call,
            CallData::Plonk {
                proof: Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]),
                public_inputs: vec![u(18)],
            }
        );
    }

    #[test]
    fn test_parse_plonk_export_multiple_inputs() {
        let call = CallData::parse(ProvingSystem::Plonk, r#"0x00ff,["0x01","0x02", "0x03"]"#).unwrap();
        assert_eq!(call.public_inputs(), &[u(1), u(2), u(3)]);
    }

    #[test]
    fn test_parse_plonk_export_without_inputs() {
        let result = CallData::parse(ProvingSystem::Plonk, "0xdeadbeef");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("no public input list"));
    }

    #[test]
    fn test_decimal_args() {
        let call = CallData::parse(ProvingSystem::Groth16, GROTH16_EXPORT).unwrap();
        assert_eq!(call.decimal_args(), vec!["1", "2", "3", "4", "5", "6", "7", "8", "6"]);

        let call = CallData::parse(ProvingSystem::Plonk, PLONK_EXPORT).unwrap();
        assert_eq!(call.decimal_args(), vec!["0xdeadbeef", "18"]);
    }

    #[test]
    fn test_invalid_call_data_is_all_zero() {
        let call = CallData::invalid(ProvingSystem::Groth16);
        assert!(call.decimal_args().iter().all(|a| a == "0"));
        assert_eq!(call.public_inputs().len(), 1);

        let call = CallData::invalid(ProvingSystem::Plonk);
        assert_eq!(call.decimal_args(), vec!["0x00", "0"]);
    }

    #[test]
    fn test_groth16_encoding_matches_sol_abi() {
        let call = CallData::parse(ProvingSystem::Groth16, GROTH16_EXPORT).unwrap();
        let expected = IGroth16Verifier::verifyProofCall {
            a: [u(1), u(2)],
            b: [[u(3), u(4)], [u(5), u(6)]],
            c: [u(7), u(8)],
            input: [u(6)],
        }
        .abi_encode();
        assert_eq!(call.abi_encode(), expected);
        assert_eq!(call.signature(), IGroth16Verifier::verifyProofCall::SIGNATURE);
    }

    #[test]
    fn test_groth16_encoding_length() {
        let call = CallData::invalid(ProvingSystem::Groth16);
        assert_eq!(call.abi_encode().len(), 4 + 9 * 32);
    }

    #[test]
    fn test_plonk_encoding_selector() {
        let call = CallData::invalid(ProvingSystem::Plonk);
        let data = call.abi_encode();
        assert_eq!(&data[..4], &IPlonkVerifier::verifyProofCall::SELECTOR[..]);
        assert_eq!(call.signature(), "verifyProof(bytes,uint256[])");
    }

    #[test]
    fn test_decode_bool_return() {
        let mut word = [0u8; 32];
        assert!(!decode_bool_return(&word).unwrap());
        word[31] = 1;
        assert!(decode_bool_return(&word).unwrap());
    }

    #[test]
    fn test_decode_bool_return_empty() {
        let result = decode_bool_return(&[]);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("no data"));
    }
}
