use alloy_primitives::Address;

use crate::chain::VerifierChain;
use crate::types::{decode_bool_return, CallData};

/// A deployed verifier contract instance.
pub struct VerifierContract<'a, C> {
    chain: &'a C,
    name: String,
    address: Address,
}

impl<'a, C: VerifierChain> VerifierContract<'a, C> {
    /// Deploy a fresh instance of `name`.
    pub async fn deploy(chain: &'a C, name: &str) -> Result<Self, String> {
        let address = chain
            .deploy(name)
            .await
            .map_err(|e| format!("Failed to deploy {}: {}", name, e))?;
        Ok(Self {
            chain,
            name: name.to_string(),
            address,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Call `verifyProof` with the given arguments.
    pub async fn verify_proof(&self, call: &CallData) -> Result<bool, String> {
        tracing::debug!(
            "{}.{} at {} with [{}]",
            self.name,
            call.signature(),
            self.address,
            call.decimal_args().join(", ")
        );

        let data = self
            .chain
            .call(self.address, call.abi_encode())
            .await
            .map_err(|e| format!("{}.verifyProof call failed: {}", self.name, e))?;
        let valid = decode_bool_return(&data)?;

        tracing::info!("Verification result for {}: {}", self.name, valid);
        Ok(valid)
    }
}
