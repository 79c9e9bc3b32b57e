//! Test utilities for `evalbridge`.
//!
//! [`RecordingHost`] stands in for the script engine. It answers with canned
//! result text and counts every call, which lets tests check that argument
//! validation never reaches the engine.

use std::collections::HashMap;

use crate::{classify::NO_VALUE, host::ScriptHost};

/// Number of times each engine entry point was called.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Calls {
    /// Calls to [`ScriptHost::evaluate`].
    pub evaluate: usize,
    /// Calls to [`ScriptHost::invoke`].
    pub invoke: usize,
    /// Calls to [`ScriptHost::start_debugger`].
    pub start_debugger: usize,
    /// Calls to [`ScriptHost::stop_debugger`].
    pub stop_debugger: usize,
}

impl Calls {
    /// Total calls across all entry points.
    pub fn total(&self) -> usize {
        self.evaluate + self.invoke + self.start_debugger + self.stop_debugger
    }
}

/// Scripted engine collaborator.
///
/// Unscripted evaluations answer with the no-value sentinel. Unscripted
/// invocations echo their first argument, or the sentinel when there is none,
/// which makes round-trip checks straightforward.
#[derive(Debug, Default)]
pub struct RecordingHost {
    evaluations: HashMap<String, String>,
    invoke_responses: HashMap<(String, String), String>,
    debugger_fails: bool,
    calls: Calls,
    invocations: Vec<(String, String)>,
}

impl RecordingHost {
    /// Create a host with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `source` with `result`.
    pub fn respond(mut self, source: &str, result: &str) -> Self {
        self.evaluations.insert(source.to_string(), result.to_string());
        self
    }

    /// Answer a call of `name` with exactly `args` text with `result`.
    pub fn respond_invoke(mut self, name: &str, args: &str, result: &str) -> Self {
        self.invoke_responses
            .insert((name.to_string(), args.to_string()), result.to_string());
        self
    }

    /// Make every debugger start report failure.
    pub fn debugger_fails(mut self) -> Self {
        self.debugger_fails = true;
        self
    }

    /// Calls received so far.
    pub fn calls(&self) -> Calls {
        self.calls
    }

    /// Every `(name, args)` pair passed to [`ScriptHost::invoke`], in order.
    pub fn invocations(&self) -> Vec<(String, String)> {
        self.invocations.clone()
    }
}

impl ScriptHost for RecordingHost {
    fn evaluate(&mut self, source: &str) -> String {
        self.calls.evaluate += 1;
        self.evaluations
            .get(source)
            .cloned()
            .unwrap_or_else(|| NO_VALUE.to_string())
    }

    fn invoke(&mut self, name: &str, args: &str) -> String {
        self.calls.invoke += 1;
        self.invocations.push((name.to_string(), args.to_string()));
        if let Some(result) = self
            .invoke_responses
            .get(&(name.to_string(), args.to_string()))
        {
            return result.clone();
        }
        match serde_json::from_str::<Vec<serde_json::Value>>(args) {
            Ok(values) => match values.first() {
                Some(first) => first.to_string(),
                None => NO_VALUE.to_string(),
            },
            Err(e) => e.to_string(),
        }
    }

    fn start_debugger(&mut self, _port: u16) -> bool {
        self.calls.start_debugger += 1;
        !self.debugger_fails
    }

    fn stop_debugger(&mut self) {
        self.calls.stop_debugger += 1;
    }
}
