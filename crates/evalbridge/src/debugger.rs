use tracing::{info, warn};

use crate::error::{Error, Result};

/// Whether a debug listener is attached to the engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebuggerState {
    /// No listener is running.
    #[default]
    Stopped,
    /// A listener is running on the given port.
    Running {
        /// Port requested when the listener was started.
        port: u16,
    },
}

impl DebuggerState {
    /// True when a listener is running.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }
}

/// Tracks the debugger session of one engine instance.
///
/// The controller never talks to the engine itself; the caller hands it the
/// start and stop operations so the state only changes once the engine has
/// answered.
#[derive(Debug, Default)]
pub struct DebuggerController {
    state: DebuggerState,
}

impl DebuggerController {
    /// Create a controller in the stopped state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current session state.
    pub fn state(&self) -> DebuggerState {
        self.state
    }

    /// Start a session on `port` using `start`, which reports whether the
    /// listener came up.
    ///
    /// A running session is never restarted: the request is rejected and
    /// `start` is not called.
    pub fn enable(&mut self, port: u16, start: impl FnOnce(u16) -> bool) -> Result<()> {
        if let DebuggerState::Running { port: current } = self.state {
            warn!(
                "Debug server already running on port {}, rejecting start on {}",
                current, port
            );
            return Err(Error::engine(format!(
                "debug server already running on port {current}"
            )));
        }
        if !start(port) {
            warn!("Failed to start debug server on port {}", port);
            return Err(Error::engine("failed to start debug server"));
        }
        info!("Debug server running on port {}", port);
        self.state = DebuggerState::Running { port };
        Ok(())
    }

    /// Stop the session using `stop`. Always succeeds, including when nothing
    /// is running.
    pub fn disable(&mut self, stop: impl FnOnce()) {
        stop();
        if let DebuggerState::Running { port } = self.state {
            info!("Debug server on port {} stopped", port);
        }
        self.state = DebuggerState::Stopped;
    }
}
