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

use std::fmt::Write;

use crate::ir::{Dim, IRModule, Instr, ValueId, ValueShape};

/// Format an [`IRModule`] into a stable, human-readable string.
///
/// Tests compare against this rendering to pin down instruction order, so
/// the format must stay deterministic.
pub fn format_ir_module(module: &IRModule) -> String {
    let mut out = String::new();
    writeln!(&mut out, "module {{").expect("write to string cannot fail");
    for instr in &module.instrs {
        format_instr(module, instr, &mut out);
    }
    writeln!(&mut out, "}}  // next_id = {}", module.next_id).expect("write to string cannot fail");
    out
}

fn format_instr(module: &IRModule, instr: &Instr, out: &mut String) {
    match instr {
        Instr::ConstI64(id, value) => {
            writeln!(out, "  {} = const.i64 {}", value_name(*id), value).unwrap();
        }
        Instr::Param(id) => {
            writeln!(
                out,
                "  {} = param{}",
                value_name(*id),
                shape_suffix(module, *id)
            )
            .unwrap();
        }
        Instr::Concat { dst, inputs, axis } => {
            let inputs = inputs
                .iter()
                .map(|id| value_name(*id))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(
                out,
                "  {} = concat {} axis={}{}",
                value_name(*dst),
                inputs,
                axis,
                shape_suffix(module, *dst)
            )
            .unwrap();
        }
        Instr::DimSize { dst, src, axis } => {
            writeln!(
                out,
                "  {} = dim_size {} axis={}",
                value_name(*dst),
                value_name(*src),
                axis
            )
            .unwrap();
        }
        Instr::Add { dst, lhs, rhs } => {
            writeln!(
                out,
                "  {} = add {}, {}",
                value_name(*dst),
                value_name(*lhs),
                value_name(*rhs)
            )
            .unwrap();
        }
        Instr::Output(id) => {
            writeln!(out, "  output {}", value_name(*id)).unwrap();
        }
    }
}

fn value_name(id: ValueId) -> String {
    format!("%{}", id.0)
}

fn shape_suffix(module: &IRModule, id: ValueId) -> String {
    match module.shape_of(id) {
        Some(shape) => format!(" :: {}", format_shape(shape)),
        None => String::new(),
    }
}

fn format_shape(shape: &ValueShape) -> String {
    let dims = shape
        .dims
        .iter()
        .map(|dim| match dim {
            Dim::Static(n) => n.to_string(),
            Dim::Dynamic {
                bound: Some(bound),
                size,
            } => format!("dyn(<={bound}, {})", value_name(*size)),
            Dim::Dynamic { bound: None, size } => format!("dyn({})", value_name(*size)),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}[{}]", shape.dtype, dims)
}
