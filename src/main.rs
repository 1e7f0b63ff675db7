//! Google Play Upload Lane CLI
//!
//! Entry point for the `gplay-upload` command-line tool.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use gplay_upload_lane::dispatch::Dispatcher;
use gplay_upload_lane::host::{SshConfig, SshTransport};
use gplay_upload_lane::{
    validate, BuildStatus, CredentialHandle, Environment, InProcessDispatcher, RemoteDispatcher,
    UploadConfig, UploadPipeline, WorkerInventory,
};

const DEFAULT_CONFIG_PATH: &str = ".gplay/upload.toml";

#[derive(Parser)]
#[command(name = "gplay-upload")]
#[command(about = "Upload Android APKs and expansion files to Google Play", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate, assemble and publish a release
    Upload {
        /// Path to upload config file (default: .gplay/upload.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Workspace root holding the build artifacts (local mode)
        #[arg(long, short = 'w')]
        workspace: Option<PathBuf>,

        /// Execute against a named worker from the inventory instead of
        /// the local filesystem
        #[arg(long)]
        worker: Option<String>,

        /// Path to workers inventory file (default: ~/.config/gplay/workers.toml)
        #[arg(long, short = 'i')]
        inventory: Option<PathBuf>,

        /// Opaque credential handle forwarded to the publishing service
        #[arg(long)]
        credential: String,

        /// Result of the build that produced the artifacts
        #[arg(long, default_value = "success")]
        build_status: String,

        /// Write the upload summary JSON to this path
        #[arg(long)]
        summary_out: Option<PathBuf>,

        /// Output the summary as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Verbose progress on stderr
        #[arg(long, short = 'v')]
        verbose: bool,
    },

    /// Check the upload configuration without touching any files
    Validate {
        /// Path to upload config file (default: .gplay/upload.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },

    /// Print identity metadata for one APK
    Inspect {
        /// Path to the APK
        apk: PathBuf,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Worker management commands
    Workers {
        #[command(subcommand)]
        action: WorkersCommands,
    },
}

#[derive(Subcommand)]
enum WorkersCommands {
    /// List configured workers
    List {
        /// Filter workers by tags (comma-separated)
        #[arg(long, short = 't', value_delimiter = ',')]
        tag: Option<Vec<String>>,

        /// Path to workers inventory file
        #[arg(long, short = 'i')]
        inventory: Option<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Probe a worker for protocol support and workspace
    Probe {
        /// Worker name from inventory
        worker: String,

        /// Path to workers inventory file
        #[arg(long, short = 'i')]
        inventory: Option<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Upload {
            config,
            workspace,
            worker,
            inventory,
            credential,
            build_status,
            summary_out,
            json,
            verbose,
        } => run_upload(
            config,
            workspace,
            worker,
            inventory,
            credential,
            &build_status,
            summary_out,
            json,
            verbose,
        ),
        Commands::Validate { config } => run_validate(config),
        Commands::Inspect { apk, json } => run_inspect(&apk, json),
        Commands::Workers { action } => match action {
            WorkersCommands::List { tag, inventory, json } => run_workers_list(tag, inventory, json),
            WorkersCommands::Probe { worker, inventory, json } => {
                run_workers_probe(&worker, inventory, json)
            }
        },
    }
}

fn load_config(path: Option<PathBuf>) -> UploadConfig {
    let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    match UploadConfig::from_file(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config {}: {}", path.display(), e);
            process::exit(1);
        }
    }
}

fn load_inventory(path: Option<PathBuf>) -> WorkerInventory {
    let result = match path {
        Some(ref p) => WorkerInventory::load(p),
        None => WorkerInventory::load_default(),
    };
    match result {
        Ok(inventory) => inventory,
        Err(e) => {
            eprintln!("Error loading worker inventory: {}", e);
            process::exit(1);
        }
    }
}

fn parse_build_status(raw: &str) -> BuildStatus {
    match raw.to_lowercase().as_str() {
        "success" => BuildStatus::Success,
        "unstable" => BuildStatus::Unstable,
        "failed" | "failure" => BuildStatus::Failed,
        other => {
            eprintln!("Invalid build status '{}'. Valid: success, unstable, failed", other);
            process::exit(1);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_upload(
    config_path: Option<PathBuf>,
    workspace: Option<PathBuf>,
    worker: Option<String>,
    inventory_path: Option<PathBuf>,
    credential: String,
    build_status: &str,
    summary_out: Option<PathBuf>,
    json: bool,
    verbose: bool,
) {
    let config = load_config(config_path);
    let env = Environment::from_process_env();
    let credential = CredentialHandle::new(credential);
    let build_status = parse_build_status(build_status);

    let dispatcher: Box<dyn Dispatcher> = match worker {
        Some(ref name) => {
            let inventory = load_inventory(inventory_path);
            let entry = match inventory.get(name) {
                Some(entry) => entry,
                None => {
                    eprintln!("Worker '{}' not found in inventory.", name);
                    process::exit(1);
                }
            };
            let transport = SshTransport::new(SshConfig {
                host: entry.host.clone(),
                user: entry.user.clone(),
                port: entry.port,
                key_path: entry
                    .expanded_ssh_key_path()
                    .map(|p| p.display().to_string()),
                workspace_root: entry.workspace_root.clone(),
                ..SshConfig::default()
            });
            match RemoteDispatcher::connect(Arc::new(transport)) {
                Ok((dispatcher, probe)) => {
                    if verbose {
                        eprintln!(
                            "Connected to worker '{}' (lane {}, workspace {})",
                            name, probe.lane_version, probe.workspace_root
                        );
                    }
                    Box::new(dispatcher)
                }
                Err(e) => {
                    eprintln!("Failed to connect to worker '{}': {}", name, e);
                    process::exit(20);
                }
            }
        }
        None => {
            let root = workspace.unwrap_or_else(|| PathBuf::from("."));
            // Local mode publishes through the simulated service; the
            // production Play client plugs in behind the same trait.
            Box::new(InProcessDispatcher::new(
                root,
                Arc::new(gplay_worker::SimulatedPublisher::new()),
            ))
        }
    };

    let pipeline = UploadPipeline::new(dispatcher.as_ref()).verbose(verbose);
    let outcome = pipeline.run(&config, &env, &credential, build_status);

    if let Some(ref path) = summary_out {
        match outcome.summary.to_json() {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    eprintln!("Warning: could not write summary to {}: {}", path.display(), e);
                }
            }
            Err(e) => eprintln!("Warning: could not serialize summary: {}", e),
        }
    }

    if json {
        match outcome.summary.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing summary: {}", e);
                process::exit(1);
            }
        }
    } else {
        match outcome.summary.status {
            gplay_upload_lane::Status::Succeeded => {
                let codes: Vec<String> = outcome
                    .summary
                    .version_codes
                    .iter()
                    .map(u64::to_string)
                    .collect();
                println!(
                    "Uploaded {} version(s) {} to the {} track",
                    outcome.summary.application_id.as_deref().unwrap_or("?"),
                    codes.join(", "),
                    outcome.summary.track.as_deref().unwrap_or("?")
                );
            }
            gplay_upload_lane::Status::Skipped => {
                println!("Skipping upload to Google Play due to build result");
            }
            gplay_upload_lane::Status::Failed => {
                eprintln!("Cannot upload to Google Play:");
                for line in &outcome.summary.report {
                    eprintln!("- {}", line);
                }
            }
        }
    }

    process::exit(outcome.summary.status.exit_code());
}

fn run_validate(config_path: Option<PathBuf>) {
    let path = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = match UploadConfig::from_file(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    let env = Environment::from_process_env();
    let report = validate::check_configuration(&config, &env);
    let mut warnings = validate::check_recent_changes(&config.recent_changes);
    if let Some(warning) = validate::check_rollout_range(&config, &env) {
        warnings.push(warning);
    }

    if report.is_empty() {
        println!("Configuration valid: {}", path.display());
        if let Some(pattern) = config.apk_files_pattern() {
            println!("  APK pattern: {}", pattern);
        }
        if let Some(pattern) = config.expansion_files_pattern() {
            println!("  Expansion pattern: {}", pattern);
        }
        if let Some(track) = config.track_name() {
            println!("  Track: {}", track);
        }
        if !config.recent_changes.is_empty() {
            println!("  Release notes: {} language(s)", config.recent_changes.len());
        }
    } else {
        eprintln!("Configuration problems:");
        eprintln!("{}", report);
    }

    for warning in &warnings {
        eprintln!("Warning: {}", warning);
    }

    if !report.is_empty() {
        process::exit(1);
    }
}

fn run_inspect(apk: &PathBuf, json: bool) {
    match gplay_apk::read_metadata(apk) {
        Ok(metadata) => {
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "application_id": metadata.application_id,
                        "version_code": metadata.version_code,
                    })
                );
            } else {
                println!("Application ID: {}", metadata.application_id);
                println!("Version code:  {}", metadata.version_code);
            }
        }
        Err(e) => {
            eprintln!("Error reading {}: {}", apk.display(), e);
            process::exit(1);
        }
    }
}

fn run_workers_list(tags: Option<Vec<String>>, inventory_path: Option<PathBuf>, json_output: bool) {
    let inventory = load_inventory(inventory_path);

    let workers: Vec<_> = if let Some(ref tag_list) = tags {
        let tag_refs: Vec<&str> = tag_list.iter().map(String::as_str).collect();
        inventory.filter_by_tags(&tag_refs)
    } else {
        inventory.workers.iter().collect()
    };

    let mut workers = workers;
    workers.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));

    if json_output {
        let output: Vec<serde_json::Value> = workers
            .iter()
            .map(|w| {
                serde_json::json!({
                    "name": w.name,
                    "host": w.host,
                    "port": w.port,
                    "user": w.user,
                    "tags": w.tags,
                    "priority": w.priority,
                    "workspace_root": w.workspace_root,
                })
            })
            .collect();

        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    if workers.is_empty() {
        println!("No workers configured.");
        return;
    }

    println!("Configured workers ({} total):\n", workers.len());
    for worker in workers {
        println!("  {} ({})", worker.name, worker.host);
        println!("    User: {}@{}:{}", worker.user, worker.host, worker.port);
        if !worker.tags.is_empty() {
            println!("    Tags: {}", worker.tags.join(", "));
        }
        if let Some(ref root) = worker.workspace_root {
            println!("    Workspace: {}", root);
        }
        println!("    Priority: {}", worker.priority);
        println!();
    }
}

fn run_workers_probe(worker_name: &str, inventory_path: Option<PathBuf>, json_output: bool) {
    let inventory = load_inventory(inventory_path);

    let entry = match inventory.get(worker_name) {
        Some(entry) => entry,
        None => {
            eprintln!("Worker '{}' not found in inventory.", worker_name);
            eprintln!(
                "Available workers: {}",
                inventory
                    .workers
                    .iter()
                    .map(|w| w.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            process::exit(1);
        }
    };

    let transport = SshTransport::new(SshConfig {
        host: entry.host.clone(),
        user: entry.user.clone(),
        port: entry.port,
        key_path: entry
            .expanded_ssh_key_path()
            .map(|p| p.display().to_string()),
        workspace_root: entry.workspace_root.clone(),
        ..SshConfig::default()
    });

    eprintln!("Probing worker '{}'...", worker_name);
    let mut client = gplay_upload_lane::host::RpcClient::new(Arc::new(transport));
    match client.probe() {
        Ok(probe) => {
            if json_output {
                match serde_json::to_string_pretty(&probe) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error serializing probe response: {}", e);
                        process::exit(1);
                    }
                }
            } else {
                println!("Worker: {}", worker_name);
                println!("  Lane version: {}", probe.lane_version);
                println!(
                    "  Protocol: [{}, {}]",
                    probe.protocol_min, probe.protocol_max
                );
                println!("  Features: {}", probe.features.join(", "));
                println!("  Workspace: {}", probe.workspace_root);
            }
        }
        Err(e) => {
            eprintln!("Probe failed: {}", e);
            process::exit(20);
        }
    }
}
