// Copyright 2025 STARGA Inc.
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at:
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Kernel constraint registry.
//!
//! Holds, per backend, the kernel definitions visible to the operation
//! selection stage. Each definition passes through the constraint rule
//! table exactly once at registration time and is frozen afterwards. The
//! registry is an explicit object constructed during backend setup and
//! passed by reference to the compiler driver; there is no process-wide
//! singleton.

pub mod rules;

pub use rules::{apply_rules, gpu_rules, ConstraintRule, RuleAction};

use crate::backend::Backend;
use crate::types::DType;

/// Named type-parameter slot with its allowed element types.
///
/// Invariant: `allowed` is non-empty once the definition is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeConstraint {
    pub slot: String,
    pub allowed: Vec<DType>,
}

/// Metadata describing which element types a compiled kernel accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelDef {
    /// Operation name as it appears in the IR.
    pub op: String,
    /// Backend the kernel is compiled for.
    pub backend: String,
    pub constraints: Vec<TypeConstraint>,
}

impl KernelDef {
    pub fn new(op: &str, backend: &str) -> Self {
        Self {
            op: op.to_string(),
            backend: backend.to_string(),
            constraints: Vec::new(),
        }
    }

    pub fn with_constraint(mut self, slot: &str, allowed: Vec<DType>) -> Self {
        self.constraints.push(TypeConstraint {
            slot: slot.to_string(),
            allowed,
        });
        self
    }

    /// The constraint record for a slot, if the definition carries one.
    pub fn constraint(&self, slot: &str) -> Option<&TypeConstraint> {
        self.constraints.iter().find(|c| c.slot == slot)
    }
}

/// Structured registration errors. All are configuration errors: the
/// process must not compile programs against a backend whose kernel table
/// failed to build.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A constraint slot ended up allowing no element types.
    #[error("kernel `{op}` on backend `{backend}`: constraint slot `{slot}` allows no element types")]
    EmptyConstraint {
        op: String,
        backend: String,
        slot: String,
    },
    /// The definition names a backend the registry does not know.
    #[error("kernel `{op}` registered for unknown backend `{backend}`")]
    UnknownBackend { op: String, backend: String },
    /// A kernel for this (operation, backend) pair is already registered;
    /// the constraint filter runs exactly once per definition.
    #[error("kernel `{op}` already registered for backend `{backend}`")]
    DuplicateKernel { op: String, backend: String },
}

/// Per-process kernel table, populated once during backend setup and
/// treated as read-only for the remainder of the process.
#[derive(Debug, Default)]
pub struct KernelRegistry {
    rules: Vec<ConstraintRule>,
    backends: Vec<Backend>,
    kernels: Vec<KernelDef>,
}

impl KernelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the shipped GPU rule table.
    pub fn with_rules(rules: Vec<ConstraintRule>) -> Self {
        Self {
            rules,
            backends: Vec::new(),
            kernels: Vec::new(),
        }
    }

    pub fn add_backend(&mut self, backend: Backend) {
        self.backends.push(backend);
    }

    pub fn backend(&self, name: &str) -> Option<&Backend> {
        self.backends.iter().find(|b| b.name == name)
    }

    /// Run the constraint rules over a kernel definition and, when it stays
    /// eligible, add it to the table.
    ///
    /// Returns whether the kernel was registered. The current rule set
    /// never rejects a kernel, so `Ok(false)` is reserved; an empty
    /// allowed set after filtering is a fatal configuration error.
    pub fn register(&mut self, def: KernelDef) -> Result<bool, RegistryError> {
        if self.find(&def.op, &def.backend).is_some() {
            return Err(RegistryError::DuplicateKernel {
                op: def.op.clone(),
                backend: def.backend.clone(),
            });
        }
        let backend = self
            .backend(&def.backend)
            .ok_or_else(|| RegistryError::UnknownBackend {
                op: def.op.clone(),
                backend: def.backend.clone(),
            })?;

        let filtered = apply_rules(&def, &self.rules, &backend.supported)?;
        self.kernels.push(filtered);
        Ok(true)
    }

    /// The registered definition for (operation, backend), if any.
    pub fn find(&self, op: &str, backend: &str) -> Option<&KernelDef> {
        self.kernels
            .iter()
            .find(|k| k.op == op && k.backend == backend)
    }

    /// Operation-selection query: does a registered kernel for
    /// (operation, backend) allow `dtype` in the named constraint slot?
    pub fn supports(&self, op: &str, backend: &str, slot: &str, dtype: DType) -> bool {
        self.find(op, backend)
            .and_then(|k| k.constraint(slot))
            .is_some_and(|c| c.allowed.contains(&dtype))
    }

    pub fn kernels(&self) -> &[KernelDef] {
        &self.kernels
    }
}
