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

use std::collections::BTreeSet;

use crate::ir::{instruction_dst, IRModule, Instr, ValueId};

/// Structured errors returned by the IR verifier.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IrVerifyError {
    /// Multiple instructions attempted to define the same SSA value.
    #[error("duplicate definition for value %{0}")]
    DuplicateDefinition(ValueId),
    /// A value was referenced before it had been defined.
    #[error("use of undefined value %{value} at instruction {instr_index}")]
    UseBeforeDefinition { value: ValueId, instr_index: usize },
    /// The module's `next_id` counter does not match the SSA IDs in use.
    #[error("next_id {found} is smaller than required {expected}")]
    NextIdOutOfSync { found: usize, expected: usize },
    /// Operand validation failed (e.g., a concat with no inputs or an axis
    /// outside the operand's recorded rank).
    #[error("invalid operand in instruction {instr_index}: {message}")]
    InvalidOperand { instr_index: usize, message: String },
}

/// Verify that an [`IRModule`] is well-formed and deterministic.
///
/// Enforces SSA discipline (unique definitions, no use-before-def), operand
/// sanity against the recorded shape metadata, and synchronization of the
/// module's `next_id` counter. Returns structured errors instead of
/// panicking on invalid input.
pub fn verify_module(module: &IRModule) -> Result<(), IrVerifyError> {
    let mut defined: BTreeSet<ValueId> = BTreeSet::new();
    let mut max_seen = 0usize;

    for (idx, instr) in module.instrs.iter().enumerate() {
        validate_operands(module, idx, instr, &defined)?;

        if let Some(dst) = instruction_dst(instr) {
            if !defined.insert(dst) {
                return Err(IrVerifyError::DuplicateDefinition(dst));
            }
            max_seen = max_seen.max(dst.0 + 1);
        }
    }

    if module.next_id < max_seen {
        return Err(IrVerifyError::NextIdOutOfSync {
            found: module.next_id,
            expected: max_seen,
        });
    }

    Ok(())
}

fn validate_operands(
    module: &IRModule,
    instr_index: usize,
    instr: &Instr,
    defined: &BTreeSet<ValueId>,
) -> Result<(), IrVerifyError> {
    let check_defined = |value: ValueId| {
        if !defined.contains(&value) {
            Err(IrVerifyError::UseBeforeDefinition { value, instr_index })
        } else {
            Ok(())
        }
    };

    let check_axis = |value: ValueId, axis: usize| {
        if let Some(shape) = module.shape_of(value) {
            if axis >= shape.rank() {
                return Err(IrVerifyError::InvalidOperand {
                    instr_index,
                    message: format!("axis {axis} out of range for rank {}", shape.rank()),
                });
            }
        }
        Ok(())
    };

    match instr {
        Instr::ConstI64(_, _) | Instr::Param(_) => {}
        Instr::Concat { inputs, axis, .. } => {
            if inputs.is_empty() {
                return Err(IrVerifyError::InvalidOperand {
                    instr_index,
                    message: "concat requires at least one input".to_string(),
                });
            }
            for &input in inputs {
                check_defined(input)?;
                check_axis(input, *axis)?;
            }
        }
        Instr::DimSize { src, axis, .. } => {
            check_defined(*src)?;
            check_axis(*src, *axis)?;
        }
        Instr::Add { lhs, rhs, .. } => {
            check_defined(*lhs)?;
            check_defined(*rhs)?;
        }
        Instr::Output(id) => {
            check_defined(*id)?;
        }
    }

    Ok(())
}
