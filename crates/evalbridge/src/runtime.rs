//! Process-wide script runtime.
//!
//! The standard library module is built once per process and shared by every
//! engine instance. [`initialize_runtime`] must run before any
//! [`ScriptBridge`](crate::ScriptBridge) backed by the Rhai engine is created.

use std::sync::{Arc, OnceLock};

use rhai::{
    Module,
    packages::{Package, StandardPackage},
};
use tracing::info;

use crate::error::{Error, Result};

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Shared state built by [`initialize_runtime`].
#[derive(Debug)]
pub struct Runtime {
    stdlib: Arc<Module>,
}

impl Runtime {
    /// The standard library module registered on every engine.
    pub(crate) fn stdlib(&self) -> Arc<Module> {
        self.stdlib.clone()
    }
}

/// Initialize the process-wide runtime. Idempotent: only the first call does
/// any work, later calls return the same runtime.
pub fn initialize_runtime() -> &'static Runtime {
    RUNTIME.get_or_init(|| {
        info!("Initializing script runtime");
        Runtime {
            stdlib: StandardPackage::new().as_shared_module(),
        }
    })
}

/// True once [`initialize_runtime`] has completed.
pub fn is_initialized() -> bool {
    RUNTIME.get().is_some()
}

/// The initialized runtime, or an engine error if initialization has not run.
pub(crate) fn runtime() -> Result<&'static Runtime> {
    RUNTIME
        .get()
        .ok_or_else(|| Error::engine("script runtime not initialized"))
}
