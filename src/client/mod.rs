//! Client side: parallel batch submission and decoding of responses into named arrays.

pub mod dataset;
pub mod executor;
pub mod visualize;
