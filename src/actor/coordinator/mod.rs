//! Supervisor - wires up the watch / build / reload pipeline
//!
//! Owns everything the pipeline shares: the dirty flag, the Reload Hub, the
//! Builder and the shutdown signal. Nothing in the pipeline is a global.
//!
//! ```text
//!            ┌─────────────── pipeline runtime thread ───────────────┐
//! notify ──> │ ChangeSource ──mark──> DirtyFlag <──take── Trigger    │
//!            └──────────────────────────────────────────────│────────┘
//!                                                           ↓ build ok
//! reload listener thread ──register──> ReloadHub <──broadcast┘
//! ```

mod runtime;

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::Result;

use super::builder::{Builder, CommandBuilder};
use super::fs::{ChangeSource, DirtyFlag};
use super::trigger::DebouncedTrigger;
use super::ws::ReloadHub;
use crate::config::{DevConfig, WatchConfig};
use crate::core::Shutdown;

pub struct Supervisor {
    root: PathBuf,
    interface: IpAddr,
    live_port: u16,
    watch: WatchConfig,
    dirty: DirtyFlag,
    hub: Arc<ReloadHub>,
    builder: Arc<dyn Builder>,
    shutdown: Shutdown,
    banner: String,
    threads: Vec<JoinHandle<()>>,
}

impl Supervisor {
    /// Supervisor with the compiler from `[build]`.
    pub fn new(config: &DevConfig, shutdown: Shutdown) -> Self {
        Self {
            root: config.root.clone(),
            interface: config.serve.interface,
            live_port: config.serve.live_port,
            watch: config.watch.clone(),
            dirty: DirtyFlag::new(),
            hub: Arc::new(ReloadHub::new()),
            builder: Arc::new(CommandBuilder::from_config(&config.root, &config.build)),
            shutdown,
            banner: String::new(),
            threads: Vec::new(),
        }
    }

    /// Replace the Builder.
    pub fn with_builder(mut self, builder: Arc<dyn Builder>) -> Self {
        self.builder = builder;
        self
    }

    /// Text appended to every "compiled successfully" status.
    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = banner.into();
        self
    }

    #[cfg(test)]
    pub fn hub(&self) -> &Arc<ReloadHub> {
        &self.hub
    }

    #[cfg(test)]
    pub fn dirty(&self) -> &DirtyFlag {
        &self.dirty
    }

    /// Start the reload listener and the pipeline.
    ///
    /// Marks the tree dirty first so the first tick performs the initial
    /// build. Returns the live-reload port actually bound.
    pub fn start(&mut self) -> Result<u16> {
        let (live_port, listener) = crate::reload::server::start_reload_server(
            self.interface,
            self.live_port,
            Arc::clone(&self.hub),
            self.shutdown.clone(),
        )?;
        self.threads.push(listener);
        crate::debug!("reload"; "listening on {}:{}", self.interface, live_port);

        let source = self.watch.enable.then(|| {
            ChangeSource::new(
                self.root.clone(),
                self.dirty.clone(),
                self.watch.rescan_interval(),
            )
        });
        let trigger = DebouncedTrigger::new(
            self.dirty.clone(),
            Arc::clone(&self.builder),
            Arc::clone(&self.hub),
            self.watch.window(),
        )
        .with_banner(self.banner.clone());

        self.dirty.mark();
        self.threads
            .push(runtime::spawn_pipeline(source, trigger, self.shutdown.clone())?);

        Ok(live_port)
    }

    /// Signal shutdown and wait for the listener and the pipeline.
    ///
    /// A build in progress finishes first. Connection threads close their
    /// sockets on their own and are not joined.
    pub fn stop(&mut self) {
        self.shutdown.trigger();
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
        crate::debug!("serve"; "pipeline stopped");
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        if !self.threads.is_empty() {
            self.stop();
        }
    }
}
