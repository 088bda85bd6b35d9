pub mod chain;
pub mod circuit;
pub mod config;
pub mod driver;
pub mod field;
pub mod patch;
pub mod prover;
pub mod types;
pub mod verifier;
