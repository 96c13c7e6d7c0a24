//! Named, versioned signature collections.
//!
//! Binaries get patched across versions, so the patterns locating a given
//! address are maintained per release and shipped as data rather than code.
//! A set carries a version tag and a list of named hex patterns; entries
//! are compiled to [`Pattern`]s at the point of use.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::pattern::Pattern;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedSignature {
    pub name: String,
    pub pattern: String,
    #[serde(default)]
    pub offset: i64,
}

impl NamedSignature {
    /// Compile the hex text into a scannable pattern.
    pub fn compile(&self) -> Result<Pattern> {
        Pattern::parse_with_offset(&self.pattern, self.offset)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureSet {
    pub version: String,
    pub signatures: Vec<NamedSignature>,
}

impl SignatureSet {
    pub fn entry(&self, name: &str) -> Option<&NamedSignature> {
        self.signatures
            .iter()
            .find(|signature| signature.name.eq_ignore_ascii_case(name))
    }
}

pub fn load_signatures<P: AsRef<Path>>(path: P) -> Result<SignatureSet> {
    let content = fs::read_to_string(&path)?;
    let data = serde_json::from_str(&content)?;
    Ok(data)
}

pub fn save_signatures<P: AsRef<Path>>(path: P, signatures: &SignatureSet) -> Result<()> {
    let content = serde_json::to_string_pretty(signatures)?;
    fs::write(path, content)?;
    Ok(())
}
