use std::{
    net::{IpAddr, Ipv4Addr},
    time::Duration,
};

/// Settings for one engine instance: per-run budgets, value size caps and
/// where the debug listener binds.
#[derive(Debug, Clone)]
pub struct ScriptConfig {
    /// Wall-clock limit for a single evaluation or call.
    pub timeout: Duration,
    /// Operation budget for a single evaluation or call. Zero means unlimited.
    pub max_operations: u64,
    /// Deepest script function call chain.
    pub max_call_depth: usize,
    /// Deepest expression nesting, inside and outside function bodies.
    pub max_expr_depth: usize,
    /// Longest string a script may build, in bytes.
    pub max_string_len: usize,
    /// Most elements an array or object map may hold.
    pub max_collection_len: usize,
    /// Address the debug listener binds to.
    pub debugger_host: IpAddr,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            max_operations: 1_000_000,
            max_call_depth: 64,
            max_expr_depth: 64,
            max_string_len: 1 << 20,
            max_collection_len: 100_000,
            debugger_host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        }
    }
}

impl ScriptConfig {
    /// Set the per-run wall-clock timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the per-run operation budget.
    pub fn with_max_operations(mut self, max_operations: u64) -> Self {
        self.max_operations = max_operations;
        self
    }

    /// Set the address the debug listener binds to.
    pub fn with_debugger_host(mut self, host: impl Into<IpAddr>) -> Self {
        self.debugger_host = host.into();
        self
    }
}
