//! Argument normalization applied before dispatch

pub mod policy;

pub use policy::{NormalizationPolicy, PathRule};
