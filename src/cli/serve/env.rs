//! `env.js`: tells the page shell which port the reload socket is on.

use std::io;
use std::path::{Path, PathBuf};

pub const ENV_JS: &str = "env.js";

/// Script defining `window.env.LIVE_PORT`.
pub fn env_js(live_port: u16) -> String {
    format!("window.env = {{\n\tLIVE_PORT: {live_port}\n}}\n")
}

/// Write `env.js` into the served directory, creating the directory if
/// needed. Returns the written path.
pub fn write_env_js(serve_dir: &Path, live_port: u16) -> io::Result<PathBuf> {
    std::fs::create_dir_all(serve_dir)?;
    let path = serve_dir.join(ENV_JS);
    std::fs::write(&path, env_js(live_port))?;
    Ok(path)
}
