use serde_json::Value;
use tracing::{debug, info};

use crate::{
    classify::classify,
    codec,
    config::ScriptConfig,
    debugger::{DebuggerController, DebuggerState},
    engine::RhaiHost,
    error::{Error, Result},
    host::ScriptHost,
    request::Request,
};

/// Host-facing facade over one script engine instance.
///
/// Values cross the boundary as [`serde_json::Value`]; the engine's own value
/// representation never leaks out. Each bridge owns exactly one engine
/// instance for its whole life.
///
/// The bridge does no internal locking. Every operation takes `&mut self`
/// and blocks until the engine answers; share a bridge across threads by
/// wrapping it in a mutex.
pub struct ScriptBridge<H = RhaiHost> {
    host: H,
    debugger: DebuggerController,
}

impl ScriptBridge<RhaiHost> {
    /// Create a bridge over a new Rhai engine instance.
    ///
    /// [`initialize_runtime`](crate::initialize_runtime) must have been called
    /// first; otherwise this fails with [`Error::Engine`].
    pub fn new(config: ScriptConfig) -> Result<Self> {
        let host = RhaiHost::new(&config)?;
        info!("Script engine instance created");
        Ok(Self::with_host(host))
    }
}

impl<H: ScriptHost> ScriptBridge<H> {
    /// Create a bridge over an existing engine collaborator.
    pub fn with_host(host: H) -> Self {
        Self {
            host,
            debugger: DebuggerController::new(),
        }
    }

    /// The engine collaborator.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Evaluate script source and return its value, or null when it produced
    /// none.
    pub fn evaluate(&mut self, source: &str) -> Result<Value> {
        let text = self.host.evaluate(source);
        finish("evaluate", &text)
    }

    /// Call the global script function `name` with `args`.
    pub fn invoke(&mut self, name: &str, args: &[Value]) -> Result<Value> {
        let encoded = codec::encode_args(args)
            .map_err(|e| Error::argument("args", format!("args not encodable: {e}")))?;
        let text = self.host.invoke(name, &encoded);
        finish(name, &text)
    }

    /// Start the debug listener on `port`.
    ///
    /// Fails with [`Error::Engine`] if the engine cannot start the listener,
    /// or if a session is already running. A running session is never
    /// restarted implicitly: call [`disable_debugger`](Self::disable_debugger)
    /// first.
    ///
    /// The Rhai engine's listener runs on its own tokio runtime, so this is
    /// safe to call from inside an async task, but like every bridge
    /// operation it blocks the calling thread until the engine answers.
    pub fn enable_debugger(&mut self, port: u16) -> Result<()> {
        let host = &mut self.host;
        self.debugger.enable(port, |port| host.start_debugger(port))
    }

    /// Stop the debug listener. A no-op if none is running.
    pub fn disable_debugger(&mut self) {
        let host = &mut self.host;
        self.debugger.disable(|| host.stop_debugger());
    }

    /// Current debugger session state.
    pub fn debugger_state(&self) -> DebuggerState {
        self.debugger.state()
    }

    /// Execute an already validated request. Debugger operations yield null.
    pub fn dispatch(&mut self, request: Request) -> Result<Value> {
        match request {
            Request::Evaluate { source } => self.evaluate(&source),
            Request::Invoke { name, args } => self.invoke(&name, &args),
            Request::EnableDebugger { port } => self.enable_debugger(port).map(|()| Value::Null),
            Request::DisableDebugger => {
                self.disable_debugger();
                Ok(Value::Null)
            }
        }
    }

    /// Validate JSON-shaped parameters for operation `op` and execute them.
    /// Invalid parameters fail before the engine is touched.
    pub fn handle(&mut self, op: &str, params: &Value) -> Result<Value> {
        let request = Request::from_params(op, params)?;
        self.dispatch(request)
    }
}

fn finish(context: &str, text: &str) -> Result<Value> {
    let result = classify(text).into_result();
    if let Err(Error::ScriptFault(message)) = &result {
        debug!("Script fault in {}: {}", context, message);
    }
    result
}
