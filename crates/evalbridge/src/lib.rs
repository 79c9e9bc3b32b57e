#![warn(missing_docs)]

//! Embed a Rhai script engine behind a JSON value boundary.
//!
//! [`ScriptBridge`] lets a host application evaluate script source, call
//! script-defined functions with JSON arguments, and attach or detach a debug
//! listener. Results come back as [`serde_json::Value`]; engine faults come
//! back as [`Error::ScriptFault`] carrying the engine's diagnostic text.
//!
//! ```no_run
//! use evalbridge::{ScriptBridge, ScriptConfig, initialize_runtime};
//! use serde_json::json;
//!
//! initialize_runtime();
//! let mut bridge = ScriptBridge::new(ScriptConfig::default())?;
//! bridge.evaluate("fn add(a, b) { a + b }")?;
//! assert_eq!(bridge.invoke("add", &[json!(1), json!(2)])?, json!(3));
//! # Ok::<(), evalbridge::Error>(())
//! ```

/// Script engine facade.
mod bridge;
/// Result text classification.
mod classify;
/// JSON interchange codec.
pub mod codec;
/// Engine limits and listener settings.
mod config;
/// Debugger session state machine.
mod debugger;
/// Rhai-backed engine collaborator.
mod engine;
/// Error types and Result alias.
mod error;
/// Engine collaborator contract.
mod host;
/// Debug listener accept loop.
mod listener;
mod request;
mod runtime;

pub mod testutils;

pub use bridge::ScriptBridge;
pub use classify::{NO_VALUE, Outcome, classify};
pub use config::ScriptConfig;
pub use debugger::{DebuggerController, DebuggerState};
pub use engine::RhaiHost;
pub use error::{Error, ErrorInfo, Result};
pub use host::ScriptHost;
pub use request::Request;
pub use runtime::{Runtime, initialize_runtime, is_initialized};
