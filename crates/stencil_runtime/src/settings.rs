//! Demo settings

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Parameters for the cloning demo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    /// Entities placed in the source's "stored" container.
    pub child_count: u32,
    /// Charge level written to the source before cloning.
    pub charge_level: u32,
    /// Whether the source is anchored before cloning.
    pub anchored: bool,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            child_count: 2,
            charge_level: 3,
            anchored: false,
        }
    }
}

impl DemoSettings {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings file {path}"))?;
        serde_json::from_str(&text).with_context(|| format!("parsing settings file {path}"))
    }
}
