//! Command-line front end for evalbridge.
//!
//! With `--eval`, evaluates one snippet and prints its JSON value. Otherwise
//! reads newline-delimited JSON requests from stdin and writes one JSON
//! response per line to stdout:
//!
//! ```text
//! {"op": "evaluate", "source": "fn add(a, b) { a + b }"}
//! {"op": "invoke", "name": "add", "args": [1, 2]}
//! {"op": "enable_debugger", "port": 9222}
//! {"op": "disable_debugger"}
//! ```

use std::{
    io::{self, BufRead, Write},
    process::ExitCode,
    time::Duration,
};

use clap::Parser;
use evalbridge::{Error, ErrorInfo, ScriptBridge, ScriptConfig, ScriptHost, initialize_runtime};
use serde::Serialize;
use serde_json::Value;
use tracing::{Level, error, info};

#[derive(Parser)]
#[command(name = "evalbridge")]
#[command(about = "Evaluate Rhai scripts behind a JSON boundary", long_about = None)]
/// CLI options.
struct Cli {
    /// Evaluate this source once, print the result and exit
    #[arg(short, long)]
    eval: Option<String>,
    /// Start the debug listener on this port
    #[arg(long)]
    debug_port: Option<u16>,
    /// Address the debug listener binds to
    #[arg(long, default_value = "127.0.0.1")]
    debug_host: std::net::IpAddr,
    /// Wall-clock limit per evaluation or call, in milliseconds
    #[arg(long, default_value_t = 60_000)]
    timeout_ms: u64,
    /// Operation budget per evaluation or call (0 for unlimited)
    #[arg(long, default_value_t = 1_000_000)]
    max_operations: u64,
    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

/// One line of output.
#[derive(Debug, Serialize)]
struct Response {
    value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorInfo>,
}

impl From<evalbridge::Result<Value>> for Response {
    fn from(result: evalbridge::Result<Value>) -> Self {
        match result {
            Ok(value) => Self { value, error: None },
            Err(err) => Self {
                value: Value::Null,
                error: Some(err.info()),
            },
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays a clean response stream.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(if cli.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .init();

    initialize_runtime();
    let config = ScriptConfig::default()
        .with_timeout(Duration::from_millis(cli.timeout_ms))
        .with_max_operations(cli.max_operations)
        .with_debugger_host(cli.debug_host);

    let mut bridge = match ScriptBridge::new(config) {
        Ok(bridge) => bridge,
        Err(e) => {
            error!("Failed to create script engine: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(port) = cli.debug_port {
        if let Err(e) = bridge.enable_debugger(port) {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    }

    let code = match cli.eval {
        Some(source) => eval_once(&mut bridge, &source),
        None => serve_stdio(&mut bridge),
    };

    bridge.disable_debugger();
    code
}

fn eval_once<H: ScriptHost>(bridge: &mut ScriptBridge<H>, source: &str) -> ExitCode {
    match bridge.evaluate(source) {
        Ok(value) => {
            println!("{value}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn serve_stdio<H: ScriptHost>(bridge: &mut ScriptBridge<H>) -> ExitCode {
    info!("Reading requests from stdin");
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to read request: {}", e);
                return ExitCode::FAILURE;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = Response::from(handle_line(bridge, &line));
        let written = serde_json::to_string(&response)
            .map_err(io::Error::from)
            .and_then(|json| writeln!(stdout, "{json}"))
            .and_then(|()| stdout.flush());
        if let Err(e) = written {
            error!("Failed to write response: {}", e);
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

fn handle_line<H: ScriptHost>(bridge: &mut ScriptBridge<H>, line: &str) -> evalbridge::Result<Value> {
    let request: Value = serde_json::from_str(line)
        .map_err(|e| Error::argument("request", format!("request not JSON: {e}")))?;
    let op = request
        .get("op")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::argument("op", "op not text"))?;
    bridge.handle(op, &request)
}
