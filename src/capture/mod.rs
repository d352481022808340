pub mod format;
pub mod pool;
pub mod recorder;
pub mod setup;
