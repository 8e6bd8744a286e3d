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

//! Data-driven constraint adjustment rules.
//!
//! Each rule names an operation, a constraint slot, and an action. The
//! registry walks the table once per kernel definition at registration
//! time; nothing here is hard-coded per operation beyond the shipped table
//! itself, and manifests may carry additional rules.

use serde::{Deserialize, Serialize};

use crate::registry::{KernelDef, RegistryError};
use crate::types::DType;

/// What a matching rule does to the named constraint slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    /// Add the element type to the slot's allowed set if absent.
    EnsureAllows(DType),
    /// If the slot's allowed set is exactly the singleton of this element
    /// type, replace it with the backend's full supported set. A kernel
    /// left constrained to a narrow placeholder type makes operation
    /// selection reject otherwise-valid inputs, which surfaces far
    /// downstream as a shape mismatch in a consuming op instead of a clear
    /// unsupported-kernel diagnostic.
    WidenSingleton(DType),
}

/// One entry in the constraint adjustment table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintRule {
    /// Operation name the rule applies to.
    pub op: String,
    /// Constraint slot the rule targets (e.g. the op's dtype parameter).
    pub slot: String,
    pub action: RuleAction,
}

impl ConstraintRule {
    pub fn new(op: &str, slot: &str, action: RuleAction) -> Self {
        Self {
            op: op.to_string(),
            slot: slot.to_string(),
            action,
        }
    }
}

/// The shipped adjustment table for the GPU backend.
///
/// Constant materialization and assertions must accept text payloads on
/// every backend; the concat entry widens the observed `f8e4m3fn`
/// placeholder singleton. Only that one singleton pattern is widened.
pub fn gpu_rules() -> Vec<ConstraintRule> {
    vec![
        ConstraintRule::new("tensor.const", "dtype", RuleAction::EnsureAllows(DType::Str)),
        ConstraintRule::new("tensor.assert", "T", RuleAction::EnsureAllows(DType::Str)),
        ConstraintRule::new(
            "tensor.concat",
            "T",
            RuleAction::WidenSingleton(DType::F8E4M3FN),
        ),
    ]
}

/// Apply the rule table to a kernel definition, producing the definition
/// unchanged or a modified copy.
///
/// Pure: the input is never mutated, rule application does not depend on
/// table order across distinct slots, and applying the table twice yields
/// the same constraints as applying it once. A rule naming a slot the
/// definition does not carry is a no-op. Fails if any slot's allowed set
/// ends up empty, since a backend must never expose a kernel that accepts
/// nothing.
pub fn apply_rules(
    def: &KernelDef,
    rules: &[ConstraintRule],
    backend_types: &[DType],
) -> Result<KernelDef, RegistryError> {
    let mut out = def.clone();

    for rule in rules {
        if rule.op != out.op {
            continue;
        }
        for constraint in &mut out.constraints {
            if constraint.slot != rule.slot {
                continue;
            }
            match rule.action {
                RuleAction::EnsureAllows(dtype) => {
                    if !constraint.allowed.contains(&dtype) {
                        constraint.allowed.push(dtype);
                    }
                }
                RuleAction::WidenSingleton(dtype) => {
                    if constraint.allowed == [dtype] {
                        constraint.allowed = backend_types.to_vec();
                    }
                }
            }
        }
    }

    for constraint in &out.constraints {
        if constraint.allowed.is_empty() {
            return Err(RegistryError::EmptyConstraint {
                op: out.op.clone(),
                backend: out.backend.clone(),
                slot: constraint.slot.clone(),
            });
        }
    }

    Ok(out)
}
