//! Config field path used in diagnostics.

use std::fmt;

/// Dotted path of a config field, e.g. `watch.window_ms`.
///
/// Each section declares its paths as constants:
///
/// ```ignore
/// impl WatchConfig {
///     pub const WINDOW_MS: FieldPath = FieldPath::new("watch.window_ms");
/// }
///
/// diag.error(WatchConfig::WINDOW_MS, "must be greater than zero");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath(&'static str);

impl FieldPath {
    #[inline]
    pub const fn new(path: &'static str) -> Self {
        Self(path)
    }

    #[inline]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`", self.0)
    }
}
