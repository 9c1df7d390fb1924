//! Core types shared across the codebase.

mod shutdown;

pub use shutdown::{Shutdown, setup_shutdown_handler};
