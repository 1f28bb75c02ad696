//! End-to-end tests against a fake hyperd.
//!
//! The fake daemon speaks the JSON-lines protocol on a Unix socket in a
//! temporary directory and keeps pods in memory, so these tests exercise the
//! real `HyperClient` transport underneath `HyperRuntime`.

#![cfg(unix)]

use podbridge::engine::protocol::{Request, Response, ResponseData};
use podbridge::{
    EngineRecord, Error, HyperRuntime, RuntimeConfig, SandboxConfig, SandboxFilter,
    SandboxMetadata, SandboxState,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;

// =============================================================================
// Fake Daemon
// =============================================================================

struct FakeHyperd {
    version: String,
    pods: Mutex<Vec<EngineRecord>>,
    next_id: Mutex<u32>,
}

impl FakeHyperd {
    fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            pods: Mutex::new(Vec::new()),
            next_id: Mutex::new(1),
        }
    }

    fn handle(&self, request: Request) -> Response {
        let mut pods = self.pods.lock().unwrap();
        let not_found = |id: &str| Response::error(-2, format!("pod {id} not found"));

        match request {
            Request::Version => Response::ok_with_data(ResponseData::Version {
                version: self.version.clone(),
                api_version: "0.6".to_string(),
            }),
            Request::CreatePod { spec } => {
                let mut next = self.next_id.lock().unwrap();
                let pod_id = format!("pod-{}", *next);
                pods.push(EngineRecord {
                    pod_id: pod_id.clone(),
                    pod_name: spec.name,
                    phase: "pending".to_string(),
                    labels: spec.labels,
                    created_at: 1_700_000_000 + i64::from(*next),
                    pod_ip: Vec::new(),
                });
                *next += 1;
                Response::ok_with_data(ResponseData::PodCreated { pod_id })
            }
            Request::StartPod { pod_id } => match pods.iter_mut().find(|p| p.pod_id == pod_id) {
                Some(pod) => {
                    pod.phase = "running".to_string();
                    pod.pod_ip = vec!["10.0.0.5".to_string()];
                    Response::ok()
                }
                None => not_found(&pod_id),
            },
            Request::StopPod { pod_id } => match pods.iter_mut().find(|p| p.pod_id == pod_id) {
                Some(pod) => {
                    pod.phase = "succeeded".to_string();
                    Response::ok_with_data(ResponseData::PodStopped {
                        code: 0,
                        cause: String::new(),
                    })
                }
                None => not_found(&pod_id),
            },
            Request::RemovePod { pod_id } => {
                let before = pods.len();
                pods.retain(|p| p.pod_id != pod_id);
                if pods.len() == before {
                    not_found(&pod_id)
                } else {
                    Response::ok()
                }
            }
            Request::PodInfo { pod_id } => match pods.iter().find(|p| p.pod_id == pod_id) {
                Some(pod) => Response::ok_with_data(ResponseData::PodInfo { pod: pod.clone() }),
                None => not_found(&pod_id),
            },
            Request::PodList => Response::ok_with_data(ResponseData::PodList { pods: pods.clone() }),
        }
    }
}

async fn spawn_daemon(version: &str) -> (tempfile::TempDir, RuntimeConfig) {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("hyper.sock");
    let listener = UnixListener::bind(&socket).unwrap();
    let daemon = Arc::new(FakeHyperd::new(version));

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let daemon = daemon.clone();
            tokio::spawn(async move {
                let (reader, mut writer) = stream.into_split();
                let mut line = String::new();
                if BufReader::new(reader).read_line(&mut line).await.is_err() {
                    return;
                }
                let response = match Request::from_json(&line) {
                    Ok(request) => daemon.handle(request),
                    Err(e) => Response::error(-1, e.to_string()),
                };
                let _ = writer
                    .write_all(response.to_json_line().unwrap().as_bytes())
                    .await;
            });
        }
    });

    let config = RuntimeConfig::default()
        .with_endpoint(format!("unix://{}", socket.display()))
        .with_timeout_secs(5);
    (dir, config)
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[tokio::test]
async fn test_full_sandbox_lifecycle() {
    let (_dir, config) = spawn_daemon("0.6.2").await;
    let runtime = HyperRuntime::connect(&config).await.unwrap();

    let sandbox = SandboxConfig::new(SandboxMetadata::new("web_app", "prod", "u-1", 2))
        .with_label("app", "web")
        .with_annotation("owner", "ops");
    let id = runtime.run_pod_sandbox(&sandbox).await.unwrap();

    let status = runtime.pod_sandbox_status(&id).await.unwrap();
    assert_eq!(status.metadata, sandbox.metadata);
    assert_eq!(status.state, SandboxState::Ready);
    assert_eq!(status.ip.as_deref(), Some("10.0.0.5"));
    assert_eq!(status.labels, sandbox.labels);
    assert_eq!(status.annotations, sandbox.annotations);

    runtime.stop_pod_sandbox(&id).await.unwrap();
    let status = runtime.pod_sandbox_status(&id).await.unwrap();
    assert_eq!(status.state, SandboxState::NotReady);

    runtime.delete_pod_sandbox(&id).await.unwrap();
    assert!(runtime.list_pod_sandbox(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_through_socket() {
    let (_dir, config) = spawn_daemon("0.7.0").await;
    let runtime = HyperRuntime::connect(&config).await.unwrap();

    for (name, app) in [("a", "web"), ("b", "db"), ("c", "web")] {
        let sandbox = SandboxConfig::new(SandboxMetadata::new(name, "default", name, 0))
            .with_label("app", app);
        runtime.run_pod_sandbox(&sandbox).await.unwrap();
    }

    let filter = SandboxFilter::new().with_label("app", "web");
    let items = runtime.list_pod_sandbox(Some(&filter)).await.unwrap();
    let names: Vec<_> = items.iter().map(|s| s.metadata.name.as_str()).collect();
    assert_eq!(names, ["a", "c"]);
    assert!(items[0].created_at < items[1].created_at);
}

#[tokio::test]
async fn test_remote_errors_surface_code_and_cause() {
    let (_dir, config) = spawn_daemon("0.6.0").await;
    let runtime = HyperRuntime::connect(&config).await.unwrap();

    let err = runtime.stop_pod_sandbox("missing").await.unwrap_err();
    let Error::Engine { source, .. } = &err else {
        panic!("unexpected error: {err:?}");
    };
    assert_eq!(source.code_and_cause(), Some((-2, "pod missing not found")));

    assert!(runtime.delete_pod_sandbox("missing").await.is_err());
}

// =============================================================================
// Connection Tests
// =============================================================================

#[tokio::test]
async fn test_connect_rejects_old_engine() {
    let (_dir, config) = spawn_daemon("0.5.3").await;
    let result = HyperRuntime::connect(&config).await;
    assert!(matches!(result, Err(Error::UnsupportedEngineVersion { .. })));
}

#[tokio::test]
async fn test_status_reports_missing_daemon() {
    let dir = tempfile::tempdir().unwrap();
    let config = RuntimeConfig::default()
        .with_endpoint(format!("unix://{}", dir.path().join("absent.sock").display()))
        .with_timeout_secs(1);

    assert!(matches!(
        HyperRuntime::connect(&config).await,
        Err(Error::Engine { .. })
    ));

    let client = podbridge::HyperClient::new(&config.endpoint)
        .unwrap()
        .with_timeout(config.connection_timeout());
    let runtime = HyperRuntime::new(Arc::new(client));
    let status = runtime.status().await;
    let ready = status.condition(podbridge::RUNTIME_READY).unwrap();
    assert!(!ready.status);
    assert!(ready.message.as_deref().unwrap_or_default().contains("hyper version"));
}

#[tokio::test]
async fn test_unused_labels_default_empty() {
    let (_dir, config) = spawn_daemon("0.6.0").await;
    let runtime = HyperRuntime::connect(&config).await.unwrap();
    let id = runtime
        .run_pod_sandbox(&SandboxConfig::new(SandboxMetadata::new("x", "y", "z", 0)))
        .await
        .unwrap();
    let status = runtime.pod_sandbox_status(&id).await.unwrap();
    assert_eq!(status.labels, HashMap::new());
    assert!(status.annotations.is_empty());
}
