//! Worker RPC integration: the full host→worker path over an in-process
//! transport, exercising the real locator, inspector and simulated
//! publisher inside the worker.

mod fixtures;

use std::io::Cursor;
use std::sync::Arc;

use gplay_protocol::{RpcRequest, RpcResponse};
use gplay_upload_lane::host::{RpcClient, Transport, TransportError};
use gplay_upload_lane::{
    BuildStatus, CredentialHandle, Environment, RemoteDispatcher, Status, UploadConfig,
    UploadPipeline,
};
use gplay_worker::{RpcHandler, SimulatedPublisher, WorkerConfig};

/// Transport that feeds each request through a real worker RPC handler.
struct LocalWorkerTransport {
    handler: RpcHandler,
}

impl LocalWorkerTransport {
    fn new(workspace_root: &std::path::Path, publisher: Arc<SimulatedPublisher>) -> Self {
        let config = WorkerConfig {
            workspace_root: workspace_root.to_path_buf(),
            ..WorkerConfig::default()
        };
        Self {
            handler: RpcHandler::new(config, publisher),
        }
    }
}

impl Transport for LocalWorkerTransport {
    fn execute(&self, request: &RpcRequest) -> Result<RpcResponse, TransportError> {
        let mut input = Cursor::new(format!("{}\n", serde_json::to_string(request)?));
        let mut output = Vec::new();
        self.handler
            .run_with_io(&mut input, &mut output)
            .map_err(TransportError::Io)?;
        serde_json::from_slice(&output)
            .map_err(|e| TransportError::Protocol(format!("invalid response JSON: {}", e)))
    }
}

#[test]
fn probe_then_find_then_inspect() {
    let dir = tempfile::tempdir().unwrap();
    fixtures::write_apk(dir.path(), "build/app-7.apk", "com.example.game", 7);
    fixtures::write_file(dir.path(), "build/notes.txt");

    let transport = LocalWorkerTransport::new(dir.path(), Arc::new(SimulatedPublisher::new()));
    let mut client = RpcClient::new(Arc::new(transport));

    let probe = client.probe().unwrap();
    assert!(probe.features.contains(&"publish".to_string()));

    let paths = client.find_files("**/*.apk").unwrap();
    assert_eq!(paths, vec!["build/app-7.apk"]);

    let metadata = client.inspect("build/app-7.apk").unwrap();
    assert_eq!(metadata.application_id, "com.example.game");
    assert_eq!(metadata.version_code, 7);
    assert_eq!(metadata.sha256.len(), 64);
}

#[test]
fn inspect_refuses_to_leave_workspace() {
    let dir = tempfile::tempdir().unwrap();
    let transport = LocalWorkerTransport::new(dir.path(), Arc::new(SimulatedPublisher::new()));
    let mut client = RpcClient::new(Arc::new(transport));
    client.probe().unwrap();

    let err = client.inspect("../outside.apk").unwrap_err();
    assert!(err.to_string().contains("PATH_OUTSIDE_WORKSPACE"));
}

#[test]
fn full_upload_through_remote_dispatcher() {
    let dir = tempfile::tempdir().unwrap();
    fixtures::write_apk(dir.path(), "out/app-1.apk", "com.x", 1);
    fixtures::write_apk(dir.path(), "out/app-2.apk", "com.x", 2);
    fixtures::write_file(dir.path(), "out/main.1.com.x.obb");
    fixtures::write_file(dir.path(), "out/patch.2.com.x.obb");

    let publisher = Arc::new(SimulatedPublisher::new());
    let transport = LocalWorkerTransport::new(dir.path(), publisher.clone());
    let (dispatcher, probe) = RemoteDispatcher::connect(Arc::new(transport)).unwrap();
    assert_eq!(probe.workspace_root, dir.path().display().to_string());

    let config = UploadConfig {
        apk_files_pattern: Some("out/*.apk".to_string()),
        expansion_files_pattern: Some("out/*.obb".to_string()),
        use_previous_expansion_files_if_missing: true,
        track_name: Some("beta".to_string()),
        ..UploadConfig::default()
    };

    let outcome = UploadPipeline::new(&dispatcher).run(
        &config,
        &Environment::new(),
        &CredentialHandle::new("service-account"),
        BuildStatus::Success,
    );

    assert_eq!(outcome.summary.status, Status::Succeeded);
    assert_eq!(outcome.summary.version_codes, vec![1, 2]);

    let applied = publisher.applied();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].application_id, "com.x");
    assert_eq!(applied[0].version_codes, vec![1, 2]);
}

#[test]
fn remote_publish_failure_reports_no_change() {
    let dir = tempfile::tempdir().unwrap();
    fixtures::write_apk(dir.path(), "app.apk", "com.x", 1);

    let publisher = Arc::new(SimulatedPublisher::new());
    publisher.inject_failure("backend unavailable");
    let transport = LocalWorkerTransport::new(dir.path(), publisher.clone());
    let (dispatcher, _probe) = RemoteDispatcher::connect(Arc::new(transport)).unwrap();

    let config = UploadConfig {
        apk_files_pattern: Some("*.apk".to_string()),
        track_name: Some("internal".to_string()),
        ..UploadConfig::default()
    };

    let outcome = UploadPipeline::new(&dispatcher).run(
        &config,
        &Environment::new(),
        &CredentialHandle::new("service-account"),
        BuildStatus::Success,
    );

    assert_eq!(outcome.summary.status, Status::Failed);
    assert_eq!(
        outcome.summary.report,
        vec![
            "Upload failed: backend unavailable",
            "No changes have been applied to the Google Play account",
        ]
    );
    assert!(publisher.applied().is_empty());
}

#[test]
fn remote_bad_package_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    fixtures::write_apk(dir.path(), "good.apk", "com.x", 1);
    fixtures::write_file(dir.path(), "bad.apk");

    let transport = LocalWorkerTransport::new(dir.path(), Arc::new(SimulatedPublisher::new()));
    let (dispatcher, _probe) = RemoteDispatcher::connect(Arc::new(transport)).unwrap();

    let config = UploadConfig {
        apk_files_pattern: Some("*.apk".to_string()),
        track_name: Some("beta".to_string()),
        ..UploadConfig::default()
    };

    let outcome = UploadPipeline::new(&dispatcher).run(
        &config,
        &Environment::new(),
        &CredentialHandle::new("service-account"),
        BuildStatus::Success,
    );

    assert_eq!(outcome.summary.status, Status::Failed);
    assert!(outcome.summary.report[0].contains("bad.apk"));
}
