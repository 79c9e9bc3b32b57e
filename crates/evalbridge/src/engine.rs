use std::{
    net::{IpAddr, SocketAddr},
    sync::{Arc, Mutex},
    time::Instant,
};

use rhai::{AST, Dynamic, Engine, EvalAltResult, Scope};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    classify::NO_VALUE,
    config::ScriptConfig,
    error::Result,
    host::ScriptHost,
    listener::DebugListener,
    runtime::{Runtime, runtime},
};

/// Build a raw engine carrying the shared standard library and the limits
/// from `config`.
pub(crate) fn build_engine(runtime: &Runtime, config: &ScriptConfig) -> Engine {
    let mut engine = Engine::new_raw();
    engine
        .register_global_module(runtime.stdlib())
        .set_strict_variables(true)
        .set_fail_on_invalid_map_property(true)
        .set_max_operations(config.max_operations)
        .set_max_call_levels(config.max_call_depth)
        .set_max_expr_depths(config.max_expr_depth, config.max_expr_depth)
        .set_max_string_size(config.max_string_len)
        .set_max_array_size(config.max_collection_len)
        .set_max_map_size(config.max_collection_len);

    engine.on_print(|text| info!(target: "evalbridge::script", "{}", text));
    engine.on_debug(|text, source, pos| {
        debug!(target: "evalbridge::script", "{} ({}, {})", text, source.unwrap_or("<main>"), pos)
    });

    engine
}

/// Engine collaborator backed by an embedded Rhai engine.
///
/// Top-level `let` bindings persist in the instance's scope and `fn`
/// definitions stay callable across evaluations, so scripts can build up
/// global state that later calls rely on.
pub struct RhaiHost {
    engine: Engine,
    scope: Scope<'static>,
    /// Function definitions from every evaluation so far.
    functions: AST,
    run_started: Arc<Mutex<Instant>>,
    debugger_host: IpAddr,
    listener: Option<DebugListener>,
}

impl RhaiHost {
    /// Create an engine instance. Fails if the runtime has not been
    /// initialized.
    pub fn new(config: &ScriptConfig) -> Result<Self> {
        let mut engine = build_engine(runtime()?, config);

        let run_started = Arc::new(Mutex::new(Instant::now()));
        let started = run_started.clone();
        let timeout = config.timeout;
        let timeout_ms = timeout.as_millis() as u64;
        engine.on_progress(move |_| {
            let start = *started.lock().unwrap_or_else(|e| e.into_inner());
            if start.elapsed() > timeout {
                Some(Dynamic::from(format!("Script timed out after {timeout_ms}ms")))
            } else {
                None
            }
        });

        Ok(Self {
            engine,
            scope: Scope::new(),
            functions: AST::empty(),
            run_started,
            debugger_host: config.debugger_host,
            listener: None,
        })
    }

    /// Address of the running debug listener, if any.
    pub fn debugger_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().map(|l| l.bound_addr)
    }

    fn begin_run(&self) {
        *self.run_started.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
    }

    fn run(&mut self, source: &str) -> std::result::Result<Dynamic, String> {
        let compiled = self
            .engine
            .compile_with_scope(&self.scope, source)
            .map_err(|e| e.to_string())?;
        let ast = self.functions.merge(&compiled);
        self.begin_run();
        let result = self.engine.eval_ast_with_scope::<Dynamic>(&mut self.scope, &ast);
        self.functions = ast.clone_functions_only();
        result.map_err(|e| render_error(&e))
    }

    fn call(&mut self, name: &str, args: &str) -> std::result::Result<Dynamic, String> {
        let values: Vec<Value> =
            serde_json::from_str(args).map_err(|e| format!("Invalid argument list: {e}"))?;
        let args = values
            .into_iter()
            .map(rhai::serde::to_dynamic)
            .collect::<std::result::Result<Vec<Dynamic>, _>>()
            .map_err(|e| render_error(&e))?;
        self.begin_run();
        self.engine
            .call_fn::<Dynamic>(&mut self.scope, &self.functions, name, args)
            .map_err(|e| render_error(&e))
    }
}

impl ScriptHost for RhaiHost {
    fn evaluate(&mut self, source: &str) -> String {
        match self.run(source) {
            Ok(value) => render_value(&value),
            Err(diagnostic) => diagnostic,
        }
    }

    fn invoke(&mut self, name: &str, args: &str) -> String {
        match self.call(name, args) {
            Ok(value) => render_value(&value),
            Err(diagnostic) => diagnostic,
        }
    }

    fn start_debugger(&mut self, port: u16) -> bool {
        if self.listener.is_some() {
            warn!("Debug listener already bound");
            return false;
        }
        match DebugListener::bind(SocketAddr::new(self.debugger_host, port)) {
            Ok(listener) => {
                self.listener = Some(listener);
                true
            }
            Err(e) => {
                warn!("Failed to bind debug listener on port {}: {}", port, e);
                false
            }
        }
    }

    fn stop_debugger(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.stop();
        }
    }
}

/// Render a script value as result text.
fn render_value(value: &Dynamic) -> String {
    if value.is_unit() {
        return NO_VALUE.to_string();
    }
    match rhai::serde::from_dynamic::<Value>(value) {
        Ok(json) => serde_json::to_string(&json).unwrap_or_else(|e| e.to_string()),
        Err(e) => format!("Value of type '{}' has no JSON form: {}", value.type_name(), e),
    }
}

/// Render an engine error as diagnostic text.
fn render_error(err: &EvalAltResult) -> String {
    match err {
        // Termination tokens carry our own timeout message.
        EvalAltResult::ErrorTerminated(token, _) if token.is_string() => token.to_string(),
        _ => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::runtime::initialize_runtime;

    fn host() -> RhaiHost {
        initialize_runtime();
        RhaiHost::new(&ScriptConfig::default()).unwrap()
    }

    #[test]
    fn renders_values_as_json() {
        let mut h = host();
        assert_eq!(h.evaluate("1 + 1"), "2");
        assert_eq!(h.evaluate("\"hi\""), "\"hi\"");
        assert_eq!(h.evaluate("[1, true, ()]"), "[1,true,null]");
        assert_eq!(h.evaluate("#{a: 1.5}"), r#"{"a":1.5}"#);
    }

    #[test]
    fn unit_renders_as_sentinel() {
        let mut h = host();
        assert_eq!(h.evaluate("let x = 1;"), NO_VALUE);
        assert_eq!(h.evaluate(""), NO_VALUE);
    }

    #[test]
    fn globals_persist_between_evaluations() {
        let mut h = host();
        h.evaluate("let counter = 40;");
        h.evaluate("counter += 2;");
        assert_eq!(h.evaluate("counter"), "42");
    }

    #[test]
    fn functions_persist_and_can_be_invoked() {
        let mut h = host();
        assert_eq!(h.evaluate("fn add(a, b) { a + b }"), NO_VALUE);
        assert_eq!(h.evaluate("fn twice(x) { x * 2 }"), NO_VALUE);
        assert_eq!(h.evaluate("add(1, twice(2))"), "5");
        assert_eq!(h.invoke("add", "[1,2]"), "3");
    }

    #[test]
    fn faults_render_diagnostics() {
        let mut h = host();
        let text = h.evaluate("undefinedVar");
        assert!(text.contains("undefinedVar"), "{text}");
        assert!(serde_json::from_str::<Value>(&text).is_err());

        let text = h.invoke("missing", "[]");
        assert!(text.contains("missing"), "{text}");
    }

    #[test]
    fn malformed_argument_text_is_a_fault() {
        let mut h = host();
        h.evaluate("fn id(x) { x }");
        let text = h.invoke("id", "not json");
        assert!(text.starts_with("Invalid argument list"), "{text}");
    }

    #[test]
    fn timeout_terminates_script() {
        initialize_runtime();
        let config = ScriptConfig {
            timeout: Duration::from_millis(20),
            max_operations: 0,
            ..ScriptConfig::default()
        };
        let mut h = RhaiHost::new(&config).unwrap();
        assert_eq!(h.evaluate("loop {}"), "Script timed out after 20ms");
    }

    #[test]
    fn call_depth_limit_applies() {
        initialize_runtime();
        let config = ScriptConfig {
            max_call_depth: 8,
            ..ScriptConfig::default()
        };
        let mut h = RhaiHost::new(&config).unwrap();
        h.evaluate("fn down(n) { if n == 0 { 0 } else { down(n - 1) } }");
        assert_eq!(h.evaluate("down(3)"), "0");
        let text = h.evaluate("down(100)");
        assert!(serde_json::from_str::<Value>(&text).is_err(), "{text}");
    }

    #[test]
    fn collection_limit_applies() {
        initialize_runtime();
        let config = ScriptConfig {
            max_collection_len: 3,
            ..ScriptConfig::default()
        };
        let mut h = RhaiHost::new(&config).unwrap();
        assert_eq!(h.evaluate("let a = [1, 2]; a.push(3); a"), "[1,2,3]");
        let text = h.evaluate("let b = [1, 2, 3]; b.push(4); b");
        assert!(serde_json::from_str::<Value>(&text).is_err(), "{text}");
    }

    #[test]
    fn debugger_start_and_stop() {
        let mut h = host();
        assert!(h.start_debugger(0));
        assert!(h.debugger_addr().is_some());
        assert!(!h.start_debugger(0));
        h.stop_debugger();
        assert!(h.debugger_addr().is_none());
        h.stop_debugger();
    }
}
