//! Element type definitions shared by the registry and the lowering layer.
//!
//! # Example
//! ```
//! use loft::types::DType;
//! assert!(DType::F32.is_float());
//! assert_eq!(DType::F8E4M3FN.to_string(), "f8e4m3fn");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Element type tags a backend can declare support for.
///
/// `F8E4M3FN` is the narrow low-precision float variant that shows up as a
/// placeholder constraint on some kernel definitions; `Str` is the text
/// element type accepted only by a handful of host-side ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Bool,
    I32,
    I64,
    F16,
    BF16,
    F32,
    F64,
    F8E4M3FN,
    Str,
}

/// Every element type tag, in declaration order.
pub const ALL_DTYPES: &[DType] = &[
    DType::Bool,
    DType::I32,
    DType::I64,
    DType::F16,
    DType::BF16,
    DType::F32,
    DType::F64,
    DType::F8E4M3FN,
    DType::Str,
];

impl DType {
    /// True for floating-point element types, including the low-precision
    /// variants.
    pub fn is_float(self) -> bool {
        matches!(
            self,
            DType::F16 | DType::BF16 | DType::F32 | DType::F64 | DType::F8E4M3FN
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DType::Bool => "bool",
            DType::I32 => "i32",
            DType::I64 => "i64",
            DType::F16 => "f16",
            DType::BF16 => "bf16",
            DType::F32 => "f32",
            DType::F64 => "f64",
            DType::F8E4M3FN => "f8e4m3fn",
            DType::Str => "str",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_DTYPES
            .iter()
            .copied()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| format!("unknown element type `{s}`"))
    }
}
