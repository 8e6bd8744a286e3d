use std::collections::HashMap;
use std::fmt;

use crate::types::DType;

pub mod print;
pub mod verify;

pub use print::format_ir_module;
pub use verify::{verify_module, IrVerifyError};

/// SSA handle to a value in the program graph. Produced by exactly one
/// instruction and owned by its [`IRModule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub usize);

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-axis dimension descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dim {
    /// Extent fully known at compile time.
    Static(usize),
    /// Extent known only at run time. `size` references the instruction that
    /// computes the actual extent; `bound`, when present, is an upper bound
    /// or placeholder only, never ground truth.
    Dynamic { bound: Option<usize>, size: ValueId },
}

impl Dim {
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Dim::Dynamic { .. })
    }

    /// Compile-time extent, if the axis is static.
    pub fn static_extent(&self) -> Option<usize> {
        match self {
            Dim::Static(n) => Some(*n),
            Dim::Dynamic { .. } => None,
        }
    }

    /// Static extent or declared upper bound, whichever is known.
    pub fn bound(&self) -> Option<usize> {
        match self {
            Dim::Static(n) => Some(*n),
            Dim::Dynamic { bound, .. } => *bound,
        }
    }
}

/// Shape record attached to an IR value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueShape {
    pub dtype: DType,
    pub dims: Vec<Dim>,
}

impl ValueShape {
    pub fn new(dtype: DType, dims: Vec<Dim>) -> Self {
        Self { dtype, dims }
    }

    /// Fully static shape from a list of extents.
    pub fn from_static(dtype: DType, extents: &[usize]) -> Self {
        Self::new(dtype, extents.iter().map(|&n| Dim::Static(n)).collect())
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }
}

#[derive(Debug, Clone)]
pub enum Instr {
    /// Scalar i64 constant.
    ConstI64(ValueId, i64),
    /// Graph input; its shape lives in the module's shape table.
    Param(ValueId),
    /// Native combine-along-axis instruction.
    Concat {
        dst: ValueId,
        inputs: Vec<ValueId>,
        axis: usize,
    },
    /// Run-time query for the actual extent of `src` along `axis`.
    DimSize {
        dst: ValueId,
        src: ValueId,
        axis: usize,
    },
    /// Scalar i64 addition.
    Add {
        dst: ValueId,
        lhs: ValueId,
        rhs: ValueId,
    },
    Output(ValueId),
}

/// The value defined by an instruction, if any.
pub fn instruction_dst(instr: &Instr) -> Option<ValueId> {
    match instr {
        Instr::ConstI64(dst, _) | Instr::Param(dst) => Some(*dst),
        Instr::Concat { dst, .. } | Instr::DimSize { dst, .. } | Instr::Add { dst, .. } => {
            Some(*dst)
        }
        Instr::Output(_) => None,
    }
}

#[derive(Debug, Clone, Default)]
pub struct IRModule {
    pub instrs: Vec<Instr>,
    pub next_id: usize,
    shapes: HashMap<ValueId, ValueShape>,
}

impl IRModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> ValueId {
        let id = self.next_id;
        self.next_id += 1;
        ValueId(id)
    }

    /// Attach (or replace) the shape record for a value.
    pub fn attach_shape(&mut self, id: ValueId, shape: ValueShape) {
        self.shapes.insert(id, shape);
    }

    pub fn shape_of(&self, id: ValueId) -> Option<&ValueShape> {
        self.shapes.get(&id)
    }

    /// Emit a graph input with a fully static shape.
    pub fn param(&mut self, shape: ValueShape) -> ValueId {
        let id = self.fresh();
        self.instrs.push(Instr::Param(id));
        self.attach_shape(id, shape);
        id
    }

    /// Emit a graph input whose extent along `axis` is only known at run
    /// time. A `DimSize` query over the input provides the extent value the
    /// dynamic descriptor references, matching how an upstream lowering
    /// hands over already-annotated values.
    pub fn dynamic_param(
        &mut self,
        dtype: DType,
        extents: &[usize],
        axis: usize,
        bound: Option<usize>,
    ) -> ValueId {
        let id = self.fresh();
        self.instrs.push(Instr::Param(id));

        let size = self.fresh();
        self.instrs.push(Instr::DimSize {
            dst: size,
            src: id,
            axis,
        });

        let dims = extents
            .iter()
            .enumerate()
            .map(|(d, &n)| {
                if d == axis {
                    Dim::Dynamic { bound, size }
                } else {
                    Dim::Static(n)
                }
            })
            .collect();
        self.attach_shape(id, ValueShape::new(dtype, dims));
        id
    }
}

impl fmt::Display for IRModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&print::format_ir_module(self))
    }
}

#[cfg(test)]
mod tests {
    use super::{Dim, IRModule, ValueId, ValueShape};
    use crate::types::DType;

    #[test]
    fn fresh_ids_are_sequential() {
        let mut ir = IRModule::new();
        assert_eq!(ir.fresh(), ValueId(0));
        assert_eq!(ir.fresh(), ValueId(1));
        assert_eq!(ir.next_id, 2);
    }

    #[test]
    fn param_records_shape() {
        let mut ir = IRModule::new();
        let p = ir.param(ValueShape::from_static(DType::F32, &[4, 8]));
        let shape = ir.shape_of(p).unwrap();
        assert_eq!(shape.rank(), 2);
        assert_eq!(shape.dims[0], Dim::Static(4));
    }

    #[test]
    fn dynamic_param_references_its_dim_size() {
        let mut ir = IRModule::new();
        let p = ir.dynamic_param(DType::F32, &[20, 64], 0, Some(20));
        let shape = ir.shape_of(p).unwrap();
        assert!(shape.dims[0].is_dynamic());
        assert_eq!(shape.dims[0].bound(), Some(20));
        assert_eq!(shape.dims[0].static_extent(), None);
        assert_eq!(shape.dims[1], Dim::Static(64));
    }
}
