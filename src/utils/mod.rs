//! Small shared helpers: subprocesses, paths, MIME types.

pub mod exec;
pub mod mime;
pub mod path;
