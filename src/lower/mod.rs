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

//! Lowering of structural combining operations with dynamic dimension
//! tracking.
//!
//! When none of the inputs is dynamic along the combine axis the result is
//! fully static and no extra instructions are emitted. Otherwise the
//! lowering builds an explicit run-time extent computation and marks the
//! result's axis dynamic, so downstream consumers never reason from a
//! static extent that does not match the actual number of valid elements.

use crate::backend::Backend;
use crate::ir::{Dim, IRModule, Instr, ValueId, ValueShape};

const CONCAT_OP: &str = "tensor.concat";

/// Structured lowering errors.
///
/// Rank, axis, and extent failures mean the input graph is malformed and
/// will fail identically on retry. `DynamicExtentUnsupported` is
/// attributable to the backend instead, so the driver can report "backend
/// cannot express dynamic extents for this op" rather than a generic
/// failure.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LowerError {
    #[error("{op} on `{backend}`: no inputs")]
    NoInputs { op: String, backend: String },
    #[error("{op} on `{backend}`: input {input} (%{value}) has no shape metadata")]
    MissingShape {
        op: String,
        backend: String,
        input: usize,
        value: ValueId,
    },
    #[error("{op} on `{backend}`: expected rank {expected} but input {input} has rank {found}")]
    RankMismatch {
        op: String,
        backend: String,
        expected: usize,
        found: usize,
        input: usize,
    },
    #[error("{op} on `{backend}`: axis {axis} out of range for rank {rank}")]
    AxisOutOfRange {
        op: String,
        backend: String,
        axis: usize,
        rank: usize,
    },
    #[error(
        "{op} on `{backend}`: extent mismatch on axis {axis}: expected {expected} but input {input} has {found}"
    )]
    ExtentMismatch {
        op: String,
        backend: String,
        axis: usize,
        expected: usize,
        found: usize,
        input: usize,
    },
    #[error("backend `{backend}` cannot express run-time extents for `{op}`")]
    DynamicExtentUnsupported { op: String, backend: String },
}

/// Result of lowering a combine operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatLowering {
    /// The combined value, with shape metadata already attached.
    pub value: ValueId,
    /// The instruction computing the result's run-time extent along the
    /// combine axis, when at least one input was dynamic there.
    pub runtime_extent: Option<ValueId>,
}

/// Lower a variadic concatenation over `inputs` along `axis`.
///
/// All inputs must share a rank, `axis` must be in range, and static
/// extents on every other axis must match exactly. Dynamic extents on
/// other axes are assumed compatible by construction of the graph; the
/// upstream shape-compatibility check owns that validation.
///
/// When the combine axis is dynamic for any input, the run-time extent is
/// accumulated left-to-right in input order: the extent value a dynamic
/// descriptor already references, an i64 constant for static inputs. The
/// fold order is never reordered, so the emitted IR is reproducible.
pub fn concat_along_axis(
    ir: &mut IRModule,
    backend: &Backend,
    inputs: &[ValueId],
    axis: usize,
) -> Result<ConcatLowering, LowerError> {
    let shapes = collect_shapes(ir, backend, inputs)?;
    let rank = shapes[0].rank();

    for (i, shape) in shapes.iter().enumerate().skip(1) {
        if shape.rank() != rank {
            return Err(LowerError::RankMismatch {
                op: CONCAT_OP.to_string(),
                backend: backend.name.clone(),
                expected: rank,
                found: shape.rank(),
                input: i,
            });
        }
    }
    if axis >= rank {
        return Err(LowerError::AxisOutOfRange {
            op: CONCAT_OP.to_string(),
            backend: backend.name.clone(),
            axis,
            rank,
        });
    }
    check_fixed_axes(backend, &shapes, axis)?;

    let any_dynamic = shapes.iter().any(|s| s.dims[axis].is_dynamic());
    if any_dynamic && !backend.dynamic_extents {
        return Err(LowerError::DynamicExtentUnsupported {
            op: CONCAT_OP.to_string(),
            backend: backend.name.clone(),
        });
    }

    let dst = ir.fresh();
    ir.instrs.push(Instr::Concat {
        dst,
        inputs: inputs.to_vec(),
        axis,
    });

    // Non-axis dimensions carry over from the first input, including any
    // dynamic descriptors: the referenced extent values describe the
    // result's axes just as well.
    let mut dims = shapes[0].dims.clone();

    let runtime_extent = if any_dynamic {
        let extent = emit_extent_fold(ir, &shapes, axis);
        dims[axis] = Dim::Dynamic {
            bound: summed_bound(&shapes, axis),
            size: extent,
        };
        Some(extent)
    } else {
        let total = shapes
            .iter()
            .map(|s| s.dims[axis].static_extent().unwrap_or(0))
            .sum();
        dims[axis] = Dim::Static(total);
        None
    };

    ir.attach_shape(dst, ValueShape::new(shapes[0].dtype, dims));
    Ok(ConcatLowering {
        value: dst,
        runtime_extent,
    })
}

fn collect_shapes(
    ir: &IRModule,
    backend: &Backend,
    inputs: &[ValueId],
) -> Result<Vec<ValueShape>, LowerError> {
    if inputs.is_empty() {
        return Err(LowerError::NoInputs {
            op: CONCAT_OP.to_string(),
            backend: backend.name.clone(),
        });
    }
    inputs
        .iter()
        .enumerate()
        .map(|(i, &id)| {
            ir.shape_of(id)
                .cloned()
                .ok_or_else(|| LowerError::MissingShape {
                    op: CONCAT_OP.to_string(),
                    backend: backend.name.clone(),
                    input: i,
                    value: id,
                })
        })
        .collect()
}

fn check_fixed_axes(
    backend: &Backend,
    shapes: &[ValueShape],
    axis: usize,
) -> Result<(), LowerError> {
    let rank = shapes[0].rank();
    for d in (0..rank).filter(|&d| d != axis) {
        let mut expected = None;
        for (i, shape) in shapes.iter().enumerate() {
            let Some(extent) = shape.dims[d].static_extent() else {
                continue;
            };
            match expected {
                None => expected = Some(extent),
                Some(e) if e != extent => {
                    return Err(LowerError::ExtentMismatch {
                        op: CONCAT_OP.to_string(),
                        backend: backend.name.clone(),
                        axis: d,
                        expected: e,
                        found: extent,
                        input: i,
                    });
                }
                Some(_) => {}
            }
        }
    }
    Ok(())
}

/// Upper bound for the combined axis: the sum of the inputs' static
/// extents and declared bounds, when all are known.
fn summed_bound(shapes: &[ValueShape], axis: usize) -> Option<usize> {
    shapes.iter().map(|s| s.dims[axis].bound()).sum()
}

/// Left-to-right fold over the inputs' run-time extents, starting from the
/// first input. A dynamic descriptor already references the value that
/// computes its extent, so that value is reused rather than re-queried;
/// static inputs contribute a compile-time constant.
fn emit_extent_fold(ir: &mut IRModule, shapes: &[ValueShape], axis: usize) -> ValueId {
    let mut acc = emit_extent(ir, &shapes[0], axis);
    for shape in &shapes[1..] {
        let rhs = emit_extent(ir, shape, axis);
        let dst = ir.fresh();
        ir.instrs.push(Instr::Add { dst, lhs: acc, rhs });
        acc = dst;
    }
    acc
}

fn emit_extent(ir: &mut IRModule, shape: &ValueShape, axis: usize) -> ValueId {
    match shape.dims[axis] {
        Dim::Dynamic { size, .. } => size,
        Dim::Static(n) => {
            let dst = ir.fresh();
            ir.instrs.push(Instr::ConstI64(dst, n as i64));
            dst
        }
    }
}
