//! Declarative benchmark configuration: which runtime to target, how many
//! parties, and the shape of the generated branching circuit.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
pub type ConfigError = Error;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BenchConfig {
    pub mpc: MpcSection,
    pub circuit: CircuitSection,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MpcSection {
    #[serde(rename = "type")]
    pub kind: MpcKind,
    pub parties: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MpcKind {
    /// Generic secret-sharing runtime with oblivious selection.
    Oip,
    /// Specialized runtime with a native disjunction primitive.
    Cdn,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CircuitSection {
    #[serde(rename = "type")]
    pub shape: CircuitShape,
    pub parameters: LayeredParams,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CircuitShape {
    Layered,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct LayeredParams {
    pub per_layer: usize,
    pub length: usize,
    pub branches: usize,
}

impl BenchConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }
}
