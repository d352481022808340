//! Per-batch auxiliary output streams written by scene components.

pub mod context;
