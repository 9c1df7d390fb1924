//! Configuration section definitions.
//!
//! Each module corresponds to a section in `livewasm.toml`:
//!
//! | Module  | TOML Section | Purpose                                 |
//! |---------|--------------|-----------------------------------------|
//! | `serve` | `[serve]`    | HTTP and live-reload listeners          |
//! | `watch` | `[watch]`    | Change detection and rebuild pacing     |
//! | `build` | `[build]`    | Compiler command, output, environment   |

mod build;
mod serve;
mod watch;

pub use build::BuildConfig;
pub use serve::ServeConfig;
pub use watch::WatchConfig;
