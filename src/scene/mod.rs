pub mod builtin;
pub mod component;
pub mod model;
pub mod registry;
pub mod runtime;
pub mod state;
