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

//! Shape-level evaluation of emitted instruction sequences.
//!
//! The evaluator runs a module against concrete run-time shapes for its
//! parameters and computes every scalar extent and result shape. It models
//! only shapes, never element data; tests use it to check that an emitted
//! extent computation evaluates to the actual number of valid elements.

use std::collections::HashMap;

use crate::ir::{Dim, IRModule, Instr, ValueId};

/// Shape-level run-time value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Shape(Vec<usize>),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EvalError {
    #[error("param %{0} has no run-time shape binding")]
    UnboundParam(ValueId),
    #[error("run-time shape for %{value} disagrees with its declared shape on axis {axis}")]
    ShapeBindingMismatch { value: ValueId, axis: usize },
    #[error("run-time rank {found} for %{value} does not match declared rank {expected}")]
    RankBindingMismatch {
        value: ValueId,
        expected: usize,
        found: usize,
    },
    #[error("use of undefined value %{0}")]
    Undefined(ValueId),
    #[error("value %{0} is not a scalar")]
    NotScalar(ValueId),
    #[error("value %{0} is not a tensor")]
    NotShape(ValueId),
    #[error("axis {axis} out of range for %{value} with rank {rank}")]
    AxisOutOfRange {
        value: ValueId,
        axis: usize,
        rank: usize,
    },
    #[error("concat operands disagree on axis {axis}: {lhs} vs {rhs}")]
    ConcatExtentMismatch { axis: usize, lhs: usize, rhs: usize },
    #[error("concat operand %{value} has rank {found} but rank {expected} was expected")]
    ConcatRankMismatch {
        value: ValueId,
        expected: usize,
        found: usize,
    },
    #[error("concat %{0} has no inputs")]
    EmptyConcat(ValueId),
}

/// Evaluated values for every instruction in a module.
#[derive(Debug, Default)]
pub struct Evaluation {
    values: HashMap<ValueId, Value>,
}

impl Evaluation {
    pub fn int(&self, id: ValueId) -> Option<i64> {
        match self.values.get(&id) {
            Some(Value::Int(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn dims(&self, id: ValueId) -> Option<&[usize]> {
        match self.values.get(&id) {
            Some(Value::Shape(dims)) => Some(dims),
            _ => None,
        }
    }
}

/// Evaluate a module against concrete run-time parameter shapes.
///
/// Each `Param` must have a binding giving its actual shape; the binding
/// is validated against the declared shape record (static extents must
/// match, dynamic bounds must not be exceeded).
pub fn eval_module(
    ir: &IRModule,
    bindings: &HashMap<ValueId, Vec<usize>>,
) -> Result<Evaluation, EvalError> {
    let mut out = Evaluation::default();

    for instr in &ir.instrs {
        match instr {
            Instr::ConstI64(id, n) => {
                out.values.insert(*id, Value::Int(*n));
            }
            Instr::Param(id) => {
                let actual = bindings.get(id).ok_or(EvalError::UnboundParam(*id))?;
                check_binding(ir, *id, actual)?;
                out.values.insert(*id, Value::Shape(actual.clone()));
            }
            Instr::DimSize { dst, src, axis } => {
                let dims = shape_value(&out, *src)?;
                if *axis >= dims.len() {
                    return Err(EvalError::AxisOutOfRange {
                        value: *src,
                        axis: *axis,
                        rank: dims.len(),
                    });
                }
                let extent = dims[*axis] as i64;
                out.values.insert(*dst, Value::Int(extent));
            }
            Instr::Add { dst, lhs, rhs } => {
                let l = int_value(&out, *lhs)?;
                let r = int_value(&out, *rhs)?;
                out.values.insert(*dst, Value::Int(l + r));
            }
            Instr::Concat { dst, inputs, axis } => {
                if inputs.is_empty() {
                    return Err(EvalError::EmptyConcat(*dst));
                }
                let result = eval_concat(&out, inputs, *axis)?;
                out.values.insert(*dst, Value::Shape(result));
            }
            Instr::Output(_) => {}
        }
    }

    Ok(out)
}

fn check_binding(ir: &IRModule, id: ValueId, actual: &[usize]) -> Result<(), EvalError> {
    let Some(declared) = ir.shape_of(id) else {
        return Ok(());
    };
    if declared.rank() != actual.len() {
        return Err(EvalError::RankBindingMismatch {
            value: id,
            expected: declared.rank(),
            found: actual.len(),
        });
    }
    for (axis, dim) in declared.dims.iter().enumerate() {
        let ok = match dim {
            Dim::Static(n) => *n == actual[axis],
            Dim::Dynamic { bound, .. } => bound.map_or(true, |b| actual[axis] <= b),
        };
        if !ok {
            return Err(EvalError::ShapeBindingMismatch { value: id, axis });
        }
    }
    Ok(())
}

fn eval_concat(
    out: &Evaluation,
    inputs: &[ValueId],
    axis: usize,
) -> Result<Vec<usize>, EvalError> {
    let first = shape_value(out, inputs[0])?.to_vec();
    if axis >= first.len() {
        return Err(EvalError::AxisOutOfRange {
            value: inputs[0],
            axis,
            rank: first.len(),
        });
    }
    let mut result = first.clone();
    for &input in &inputs[1..] {
        let dims = shape_value(out, input)?;
        // Rank agreement also keeps `axis` in range for every operand.
        if dims.len() != first.len() {
            return Err(EvalError::ConcatRankMismatch {
                value: input,
                expected: first.len(),
                found: dims.len(),
            });
        }
        for (d, (&a, &b)) in first.iter().zip(dims.iter()).enumerate() {
            if d != axis && a != b {
                return Err(EvalError::ConcatExtentMismatch {
                    axis: d,
                    lhs: a,
                    rhs: b,
                });
            }
        }
        result[axis] += dims[axis];
    }
    Ok(result)
}

fn shape_value(out: &Evaluation, id: ValueId) -> Result<&[usize], EvalError> {
    match out.values.get(&id) {
        Some(Value::Shape(dims)) => Ok(dims),
        Some(_) => Err(EvalError::NotShape(id)),
        None => Err(EvalError::Undefined(id)),
    }
}

fn int_value(out: &Evaluation, id: ValueId) -> Result<i64, EvalError> {
    match out.values.get(&id) {
        Some(Value::Int(n)) => Ok(*n),
        Some(_) => Err(EvalError::NotScalar(id)),
        None => Err(EvalError::Undefined(id)),
    }
}
