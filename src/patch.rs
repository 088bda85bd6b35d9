use std::path::{Path, PathBuf};

use regex::{NoExpand, Regex};

/// Compiler directive written into every patched verifier.
pub const TARGET_PRAGMA: &str = "pragma solidity ^0.8.0";

const PRAGMA_PATTERN: &str = r"\bpragma\s+solidity\s+\^\d+\.\d+\.\d+";

/// Contract declaration emitted by the verifier generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractPattern {
    /// `contract Verifier` (Groth16 template)
    Verifier,
    /// `contract PlonkVerifier` (PLONK template)
    PlonkVerifier,
}

impl ContractPattern {
    pub fn generated_name(&self) -> &'static str {
        match self {
            ContractPattern::Verifier => "Verifier",
            ContractPattern::PlonkVerifier => "PlonkVerifier",
        }
    }
}

/// One verifier source file to rename and version-pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchTarget {
    pub path: PathBuf,
    pub pattern: ContractPattern,
    pub desired_name: String,
}

impl PatchTarget {
    /// Target for `<contracts_dir>/<desired_name>.sol`.
    pub fn new(contracts_dir: &Path, pattern: ContractPattern, desired_name: &str) -> Self {
        Self {
            path: contracts_dir.join(format!("{}.sol", desired_name)),
            pattern,
            desired_name: desired_name.to_string(),
        }
    }
}

fn validate_contract_name(name: &str) -> Result<(), String> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(format!("Not a valid contract name: {:?}", name))
    }
}

fn declaration_regex(name: &str) -> Result<Regex, String> {
    Regex::new(&format!(r"\bcontract\s+{}\b", regex::escape(name)))
        .map_err(|e| format!("Invalid declaration pattern for {}: {}", name, e))
}

fn replace_single(re: &Regex, text: &str, replacement: &str, what: &str) -> Result<String, String> {
    let count = re.find_iter(text).count();
    if count != 1 {
        return Err(format!("Expected exactly one {} match, found {}", what, count));
    }
    Ok(re.replace(text, NoExpand(replacement)).into_owned())
}

/// Pin the version pragma and rename the contract declaration in `source`.
///
/// Each pattern must match exactly once. Re-running on already patched text
/// is a no-op: the pinned pragma matches its own pattern, and a declaration
/// already carrying `desired_name` is accepted in place of the generated one.
pub fn patch_source(
    source: &str,
    pattern: ContractPattern,
    desired_name: &str,
) -> Result<String, String> {
    validate_contract_name(desired_name)?;

    let pragma = Regex::new(PRAGMA_PATTERN)
        .map_err(|e| format!("Invalid pragma pattern: {}", e))?;
    let pinned = replace_single(&pragma, source, TARGET_PRAGMA, "version pragma")?;

    let generated = declaration_regex(pattern.generated_name())?;
    let declaration = format!("contract {}", desired_name);
    match generated.find_iter(&pinned).count() {
        1 => Ok(generated.replace(&pinned, NoExpand(&declaration)).into_owned()),
        0 if declaration_regex(desired_name)?.find_iter(&pinned).count() == 1 => Ok(pinned),
        n => Err(format!(
            "Expected exactly one `contract {}` declaration, found {}",
            pattern.generated_name(),
            n
        )),
    }
}

/// Patch a verifier source file in place.
///
/// The file is overwritten without an atomic rename; a failed write after a
/// successful read can leave it truncated.
pub fn patch(target: &PatchTarget) -> Result<(), String> {
    let path = &target.path;
    let source = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read contract source at {}: {}", path.display(), e))?;

    let patched = patch_source(&source, target.pattern, &target.desired_name)
        .map_err(|e| format!("Failed to patch {}: {}", path.display(), e))?;

    std::fs::write(path, patched)
        .map_err(|e| format!("Failed to write contract source at {}: {}", path.display(), e))?;

    tracing::debug!(
        "Patched {}: {} -> {}",
        path.display(),
        target.pattern.generated_name(),
        target.desired_name
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROTH16_SOURCE: &str = "//\n// Copyright 2017 Christian Reitwiessner\n//\npragma solidity ^0.7.0;\nlibrary Pairing {\n    struct G1Point { uint X; uint Y; }\n}\ncontract Verifier {\n    using Pairing for *;\n    function verifyProof() public view returns (bool r) {}\n}\n";

    const PLONK_SOURCE: &str = "// SPDX-License-Identifier: GPL-3.0\npragma solidity ^0.6.11;\n\ncontract PlonkVerifier {\n    uint16 constant n = 8;\n}\n";

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("verifier_harness_{}_{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_patch_source_pins_pragma_and_renames() {
        let patched = patch_source(GROTH16_SOURCE, ContractPattern::Verifier, "HelloWorldVerifier")
            .unwrap();
        assert!(patched.contains("pragma solidity ^0.8.0;"));
        assert!(patched.contains("contract HelloWorldVerifier {"));
        assert!(!patched.contains("^0.7.0"));
        assert!(!patched.contains("contract Verifier "));
    }

    #[test]
    fn test_patch_source_leaves_other_bytes_untouched() {
        let patched = patch_source(GROTH16_SOURCE, ContractPattern::Verifier, "HelloWorldVerifier")
            .unwrap();
        let expected = GROTH16_SOURCE
            .replace("pragma solidity ^0.7.0", "pragma solidity ^0.8.0")
            .replace("contract Verifier", "contract HelloWorldVerifier");
        assert_eq!(patched, expected);
    }

    #[test]
    fn test_patch_source_plonk() {
        let patched =
            patch_source(PLONK_SOURCE, ContractPattern::PlonkVerifier, "Multiplier3PlonkVerifier")
                .unwrap();
        assert!(patched.contains("pragma solidity ^0.8.0;"));
        assert!(patched.contains("contract Multiplier3PlonkVerifier {"));
    }

    #[test]
    fn test_patch_source_is_idempotent() {
        let once = patch_source(GROTH16_SOURCE, ContractPattern::Verifier, "Multiplier3Verifier")
            .unwrap();
        let twice = patch_source(&once, ContractPattern::Verifier, "Multiplier3Verifier").unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_patch_source_missing_declaration() {
        let result = patch_source(PLONK_SOURCE, ContractPattern::Verifier, "HelloWorldVerifier");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("found 0"));
    }

    #[test]
    fn test_patch_source_missing_pragma() {
        let source = GROTH16_SOURCE.replace("pragma solidity ^0.7.0;", "");
        let result = patch_source(&source, ContractPattern::Verifier, "HelloWorldVerifier");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("version pragma"));
    }

    #[test]
    fn test_patch_source_duplicate_declaration() {
        let source = format!("{}contract Verifier {{}}\n", GROTH16_SOURCE);
        let result = patch_source(&source, ContractPattern::Verifier, "HelloWorldVerifier");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("found 2"));
    }

    #[test]
    fn test_patch_source_is_word_bounded() {
        // `contract PlonkVerifier` must not be taken for `contract Verifier`
        let result = patch_source(PLONK_SOURCE, ContractPattern::Verifier, "Other");
        assert!(result.is_err());

        let source = GROTH16_SOURCE.replace("contract Verifier", "contract VerifierHelper");
        let result = patch_source(&source, ContractPattern::Verifier, "HelloWorldVerifier");
        assert!(result.is_err());
    }

    #[test]
    fn test_patch_source_rejects_invalid_name() {
        for name in ["", "1Verifier", "Hello World", "Verifier;"] {
            let result = patch_source(GROTH16_SOURCE, ContractPattern::Verifier, name);
            assert!(result.is_err());
            assert!(result.unwrap_err().contains("Not a valid contract name"));
        }
    }

    #[test]
    fn test_patch_target_path() {
        let target = PatchTarget::new(
            Path::new("./contracts"),
            ContractPattern::PlonkVerifier,
            "Multiplier3PlonkVerifier",
        );
        assert_eq!(target.path, PathBuf::from("./contracts/Multiplier3PlonkVerifier.sol"));
        assert_eq!(target.desired_name, "Multiplier3PlonkVerifier");
    }

    #[test]
    fn test_patch_file_in_place() {
        let dir = temp_dir("patch_in_place");
        let target = PatchTarget::new(&dir, ContractPattern::Verifier, "HelloWorldVerifier");
        std::fs::write(&target.path, GROTH16_SOURCE).unwrap();

        patch(&target).unwrap();
        let contents = std::fs::read_to_string(&target.path).unwrap();
        assert!(contents.contains("pragma solidity ^0.8.0"));
        assert!(contents.contains("contract HelloWorldVerifier"));

        // second run leaves the file unchanged
        patch(&target).unwrap();
        assert_eq!(std::fs::read_to_string(&target.path).unwrap(), contents);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_patch_file_not_found() {
        let target = PatchTarget::new(
            Path::new("/nonexistent/contracts"),
            ContractPattern::Verifier,
            "HelloWorldVerifier",
        );
        let result = patch(&target);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Failed to read"));
    }

    #[test]
    fn test_patch_file_not_writable() {
        let dir = temp_dir("patch_read_only");
        let target = PatchTarget::new(&dir, ContractPattern::Verifier, "HelloWorldVerifier");
        std::fs::write(&target.path, GROTH16_SOURCE).unwrap();

        let mut perms = std::fs::metadata(&target.path).unwrap().permissions();
        perms.set_readonly(true);
        std::fs::set_permissions(&target.path, perms).unwrap();

        // privileged users ignore the read-only bit; nothing to check then
        let writable = std::fs::OpenOptions::new().write(true).open(&target.path).is_ok();
        if !writable {
            let result = patch(&target);
            assert!(result.is_err());
            assert!(result.unwrap_err().contains("Failed to write"));
            assert_eq!(std::fs::read_to_string(&target.path).unwrap(), GROTH16_SOURCE);
        }

        let mut perms = std::fs::metadata(&target.path).unwrap().permissions();
        perms.set_readonly(false);
        std::fs::set_permissions(&target.path, perms).ok();
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_patch_file_mismatch_leaves_file_untouched() {
        let dir = temp_dir("patch_mismatch");
        let target = PatchTarget::new(&dir, ContractPattern::PlonkVerifier, "Multiplier3PlonkVerifier");
        std::fs::write(&target.path, GROTH16_SOURCE).unwrap();

        let result = patch(&target);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Failed to patch"));
        assert_eq!(std::fs::read_to_string(&target.path).unwrap(), GROTH16_SOURCE);

        std::fs::remove_dir_all(&dir).ok();
    }
}
