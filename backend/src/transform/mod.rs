//! Transformation module.
//!
//! - Reshape: the wide to long engine
//! - Pipeline: load, inspect and reshape an upload

pub mod pipeline;
pub mod reshape;

pub use pipeline::*;
pub use reshape::{present_groups, reshape};
