//! Validation of dynamically shaped bridge requests.
//!
//! Hosts that receive operations as JSON (the CLI, or an application relaying
//! calls from another process) parse them into a [`Request`] here. Every
//! shape check happens in [`Request::from_params`], so a malformed request
//! never reaches the engine.

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// A validated bridge operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Evaluate script source.
    Evaluate {
        /// Script source text.
        source: String,
    },
    /// Call a global script function.
    Invoke {
        /// Function name.
        name: String,
        /// Positional arguments.
        args: Vec<Value>,
    },
    /// Start the debug listener.
    EnableDebugger {
        /// TCP port to listen on.
        port: u16,
    },
    /// Stop the debug listener.
    DisableDebugger,
}

impl Request {
    /// Build a request for operation `op` from a JSON object of parameters.
    ///
    /// Operations are `evaluate` (`source`), `invoke` (`name`, `args`),
    /// `enable_debugger` (`port`) and `disable_debugger`.
    pub fn from_params(op: &str, params: &Value) -> Result<Self> {
        let empty = Map::new();
        let params = match params {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => return Err(Error::argument("params", "params not object")),
        };

        match op {
            "evaluate" => Ok(Self::Evaluate {
                source: text(params, "source", "source not text")?,
            }),
            "invoke" => {
                let name = text(params, "name", "name not text")?;
                let args = match params.get("args") {
                    Some(Value::Array(args)) => args.clone(),
                    _ => return Err(Error::argument("args", "args not sequence")),
                };
                Ok(Self::Invoke { name, args })
            }
            "enable_debugger" => Ok(Self::EnableDebugger {
                port: port(params)?,
            }),
            "disable_debugger" => Ok(Self::DisableDebugger),
            other => Err(Error::argument("op", format!("unknown operation '{other}'"))),
        }
    }
}

fn text(params: &Map<String, Value>, key: &'static str, message: &str) -> Result<String> {
    match params.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(Error::argument(key, message)),
    }
}

fn port(params: &Map<String, Value>) -> Result<u16> {
    let n = match params.get("port") {
        Some(Value::Number(n)) if n.is_i64() || n.is_u64() => n,
        _ => return Err(Error::argument("port", "port not integer")),
    };
    n.as_u64()
        .and_then(|p| u16::try_from(p).ok())
        .ok_or_else(|| Error::argument("port", format!("port {n} out of range")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_operations() {
        assert_eq!(
            Request::from_params("evaluate", &json!({"source": "1+1"})),
            Ok(Request::Evaluate {
                source: "1+1".into()
            })
        );
        assert_eq!(
            Request::from_params("invoke", &json!({"name": "add", "args": [1, 2]})),
            Ok(Request::Invoke {
                name: "add".into(),
                args: vec![json!(1), json!(2)]
            })
        );
        assert_eq!(
            Request::from_params("invoke", &json!({"name": "f", "args": []})),
            Ok(Request::Invoke {
                name: "f".into(),
                args: vec![]
            })
        );
        assert_eq!(
            Request::from_params("enable_debugger", &json!({"port": 9222})),
            Ok(Request::EnableDebugger { port: 9222 })
        );
        assert_eq!(
            Request::from_params("disable_debugger", &Value::Null),
            Ok(Request::DisableDebugger)
        );
    }

    #[test]
    fn source_must_be_text() {
        for source in [json!(5), json!(null), json!(["1+1"]), json!({"s": "x"})] {
            assert_eq!(
                Request::from_params("evaluate", &json!({ "source": source })),
                Err(Error::argument("source", "source not text"))
            );
        }
        assert_eq!(
            Request::from_params("evaluate", &json!({})),
            Err(Error::argument("source", "source not text"))
        );
    }

    #[test]
    fn invoke_names_the_bad_parameter() {
        assert_eq!(
            Request::from_params("invoke", &json!({"name": 1, "args": []})),
            Err(Error::argument("name", "name not text"))
        );
        assert_eq!(
            Request::from_params("invoke", &json!({"name": "f", "args": {"0": 1}})),
            Err(Error::argument("args", "args not sequence"))
        );
        assert_eq!(
            Request::from_params("invoke", &json!({"name": "f", "args": "[1]"})),
            Err(Error::argument("args", "args not sequence"))
        );
    }

    #[test]
    fn port_must_be_integer_in_range() {
        for port in [json!("9222"), json!(9222.5), json!(true)] {
            assert_eq!(
                Request::from_params("enable_debugger", &json!({ "port": port })),
                Err(Error::argument("port", "port not integer"))
            );
        }
        for port in [json!(-1), json!(70000)] {
            let err = Request::from_params("enable_debugger", &json!({ "port": port })).unwrap_err();
            assert!(matches!(err, Error::Argument { param: "port", .. }));
        }
    }

    #[test]
    fn unknown_operation() {
        let err = Request::from_params("compile", &json!({})).unwrap_err();
        assert!(matches!(err, Error::Argument { param: "op", .. }));
        assert_eq!(
            Request::from_params("evaluate", &json!([1])),
            Err(Error::argument("params", "params not object"))
        );
    }
}
