//! Request dispatch: the workload queue, the per-request state machine and the simulation thread.

pub mod config;
pub mod queue;
pub mod request;
pub mod response;
pub mod server;
pub mod sim;
pub mod workload;
