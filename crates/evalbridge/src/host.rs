/// The engine collaborator a [`ScriptBridge`](crate::ScriptBridge) drives.
///
/// Every evaluation or call answers with result text: the
/// [`NO_VALUE`](crate::NO_VALUE) sentinel, a JSON document, or the engine's
/// diagnostic text for a fault. Implementations never return errors through
/// any other channel.
pub trait ScriptHost {
    /// Execute `source` in the instance's global context.
    fn evaluate(&mut self, source: &str) -> String;

    /// Call the global function `name` with a JSON array of arguments.
    fn invoke(&mut self, name: &str, args: &str) -> String;

    /// Start a debug listener on `port`. Returns true once it is bound and
    /// accepting.
    fn start_debugger(&mut self, port: u16) -> bool;

    /// Stop the debug listener. Safe to call when none is running.
    fn stop_debugger(&mut self);
}
