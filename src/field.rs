use std::str::FromStr;

use ark_bn254::Fr;
use ark_ff::PrimeField;

/// Order of the BN254 scalar field. Witness values and public signals are
/// compared after reduction modulo this prime.
pub const BN254_SCALAR_PRIME: &str =
    "21888242871839275222246405745257275088548364400416034343698204186575808495617";

/// Parse a decimal string into a field element, reducing modulo the prime.
/// Negative values wrap around.
pub fn parse_field(value: &str) -> Result<Fr, String> {
    Fr::from_str(value.trim()).map_err(|_| format!("Not a decimal field element: {:?}", value))
}

/// Field equality between a computed value and a small expected integer.
pub fn field_eq(actual: &Fr, expected: u64) -> bool {
    *actual == Fr::from(expected)
}

/// Canonical decimal representation of a field element.
pub fn to_decimal(value: &Fr) -> String {
    value.into_bigint().to_string()
}
