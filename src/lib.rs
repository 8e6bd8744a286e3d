//! LOFT core library: dynamic-dimension-aware lowering for tensor programs.
//!
//! Two loosely coupled components, composed by an outer compiler driver:
//!
//! - [`registry`] adjusts the element-type constraints a compiled kernel
//!   declares, per backend, before the kernel becomes visible to operation
//!   selection.
//! - [`lower`] propagates run-time-determined dimension extents through
//!   structural combining operations (concatenation), attaching an explicit
//!   extent computation to the result instead of a silently-wrong static
//!   shape.

pub mod backend;
pub mod eval;
pub mod ir;
pub mod lower;
pub mod registry;
pub mod types;
