//! The Contract Verifier: one generic CRUD lifecycle, parameterized by
//! resource name and field schema, instead of one hand-written suite per
//! resource.

pub mod compare;
pub mod contract;
pub mod report;

pub use contract::*;
pub use report::*;
