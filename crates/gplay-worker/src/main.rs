//! Upload Lane worker entrypoint.
//!
//! Usage: gplay-worker play rpc [--workspace DIR]
//!
//! Reads a single JSON RPC request from stdin, dispatches to the
//! appropriate handler, and writes a JSON response to stdout.
//! Designed to be invoked via SSH forced-command. Publishing goes through
//! the configured PublishService; this binary ships with the simulated
//! service, with the production Play client plugging in behind the same
//! trait.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use gplay_worker::{RpcHandler, SimulatedPublisher, WorkerConfig};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() >= 3 && args[1] == "play" && args[2] == "rpc" {
        let mut config = WorkerConfig::default();

        let mut i = 3;
        while i < args.len() {
            if args[i] == "--workspace" && i + 1 < args.len() {
                config.workspace_root = PathBuf::from(&args[i + 1]);
                i += 2;
            } else {
                eprintln!("Unknown argument: {}", args[i]);
                return ExitCode::FAILURE;
            }
        }

        let handler = RpcHandler::new(config, Arc::new(SimulatedPublisher::new()));
        if let Err(e) = handler.run() {
            eprintln!("RPC handler error: {}", e);
            return ExitCode::FAILURE;
        }

        ExitCode::SUCCESS
    } else {
        eprintln!("Usage: gplay-worker play rpc [--workspace DIR]");
        eprintln!();
        eprintln!("Runs the RPC handler, reading JSON from stdin and writing to stdout.");
        ExitCode::FAILURE
    }
}
