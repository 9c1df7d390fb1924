//! Configuration utility types.
//!
//! | Module   | Purpose                                |
//! |----------|----------------------------------------|
//! | `error`  | `ConfigError` and validation results   |
//! | `field`  | Field paths named in diagnostics       |

mod error;
mod field;

pub use error::{ConfigDiagnostic, ConfigDiagnostics, ConfigError};
pub use field::FieldPath;
