// Copyright 2025 STARGA Inc.
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at:
//     http://www.apache.org/licenses/LICENSE-2.0

//! Backend capability descriptors and their TOML manifest.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::registry::ConstraintRule;
use crate::types::DType;

/// Compilation target with its type-support capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Backend {
    pub name: String,
    /// Full element-type set the backend can execute. This is the widening
    /// target for placeholder kernel constraints.
    pub supported: Vec<DType>,
    /// Whether the backend can express the run-time dimension extent query.
    #[serde(default)]
    pub dynamic_extents: bool,
}

impl Backend {
    /// Reference GPU target: every element type except text, with run-time
    /// extent queries available.
    pub fn gpu_reference() -> Self {
        Self {
            name: "gpu".to_string(),
            supported: vec![
                DType::Bool,
                DType::I32,
                DType::I64,
                DType::F16,
                DType::BF16,
                DType::F32,
                DType::F64,
                DType::F8E4M3FN,
            ],
            dynamic_extents: true,
        }
    }

    pub fn supports(&self, dtype: DType) -> bool {
        self.supported.contains(&dtype)
    }
}

/// Declarative backend description loaded at setup time, before any
/// compilation begins.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendManifest {
    pub backend: Backend,
    /// Constraint rules beyond the shipped table.
    #[serde(default)]
    pub rules: Vec<ConstraintRule>,
}

/// Parse a backend manifest from TOML text.
pub fn parse_manifest(content: &str) -> Result<BackendManifest> {
    toml::from_str(content).context("Failed to parse backend manifest")
}

/// Load a backend manifest from disk.
pub fn load_manifest(path: &Path) -> Result<BackendManifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}
