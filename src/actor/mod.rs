//! Watch / build / reload pipeline for serve mode.
//!
//! ```text
//! ChangeSource --mark--> DirtyFlag --take--> DebouncedTrigger --build--> Builder
//!  (notify)                                       |
//!                                                 +--on success--> ReloadHub --> browsers
//! ```
//!
//! # Module Structure
//!
//! - `fs` - Change Source: file watcher, watch set, dirty flag
//! - `trigger` - Debounced Trigger: one rebuild per quiet window
//! - `builder` - Builder trait and the compiler subprocess
//! - `ws` - Reload Hub: client registry and per-connection I/O
//! - `coordinator` - Supervisor that owns and runs all of the above

pub mod builder;
pub mod coordinator;
pub mod fs;
pub mod trigger;
pub mod ws;

pub use coordinator::Supervisor;
