//! Engine client for the hyper daemon.
//!
//! # Features
//!
//! - Async/await support via tokio
//! - Unix socket and TCP endpoints
//! - Timeout on every request (connect, write and response read)
//! - One connection per request, so a single handle is safe to share
//!
//! # Example
//!
//! ```rust,ignore
//! use podbridge::engine::{EngineClient, HyperClient};
//! use std::time::Duration;
//!
//! let client = HyperClient::new("unix:///var/run/hyper.sock")?
//!     .with_timeout(Duration::from_secs(60));
//!
//! let version = client.get_version().await?;
//! println!("hyperd {} (api {})", version.version, version.api_version);
//! ```

use super::protocol::{OkPayload, Request, Response, ResponseData};
use super::{
    EngineClient, EngineError, EngineRecord, EngineResult, EngineVersion, StopOutcome, UserPod,
};
use crate::constants::{ENGINE_CONNECTION_TIMEOUT, MAX_RESPONSE_LINE};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::timeout;

// =============================================================================
// Endpoint
// =============================================================================

/// Engine daemon address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEndpoint {
    /// Unix domain socket path.
    Unix(PathBuf),
    /// TCP `host:port`.
    Tcp(String),
}

impl EngineEndpoint {
    /// Parses `unix:///path` or `tcp://host:port`.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for any other scheme or an empty address.
    pub fn parse(uri: &str) -> Result<Self> {
        if let Some(path) = uri.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(Error::InvalidConfig(format!("empty socket path in '{uri}'")));
            }
            return Ok(Self::Unix(PathBuf::from(path)));
        }
        if let Some(addr) = uri.strip_prefix("tcp://") {
            if addr.is_empty() || !addr.contains(':') {
                return Err(Error::InvalidConfig(format!(
                    "tcp endpoint '{uri}' must be tcp://host:port"
                )));
            }
            return Ok(Self::Tcp(addr.to_string()));
        }
        Err(Error::InvalidConfig(format!(
            "unsupported endpoint '{uri}' (expected unix:// or tcp://)"
        )))
    }
}

impl std::fmt::Display for EngineEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unix(path) => write!(f, "unix://{}", path.display()),
            Self::Tcp(addr) => write!(f, "tcp://{addr}"),
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// Client for the hyper pod engine.
#[derive(Debug, Clone)]
pub struct HyperClient {
    endpoint: EngineEndpoint,
    timeout: Duration,
}

impl HyperClient {
    /// Creates a client for the given endpoint URI with the default timeout.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the URI cannot be parsed.
    pub fn new(endpoint: &str) -> Result<Self> {
        Ok(Self {
            endpoint: EngineEndpoint::parse(endpoint)?,
            timeout: ENGINE_CONNECTION_TIMEOUT,
        })
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &EngineEndpoint {
        &self.endpoint
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sends a request and receives a response, bounded by the timeout.
    async fn send_request(&self, request: &Request) -> EngineResult<OkPayload> {
        tracing::debug!(endpoint = %self.endpoint, action = request.action(), "engine request");

        let response = timeout(self.timeout, self.exchange(request))
            .await
            .map_err(|_| EngineError::Timeout(self.timeout))??;

        match response {
            Response::Ok(payload) => Ok(payload),
            Response::Error(err) => Err(EngineError::Remote {
                code: err.code,
                cause: err.cause,
            }),
        }
    }

    async fn exchange(&self, request: &Request) -> EngineResult<Response> {
        let line = request.to_json_line()?;
        match &self.endpoint {
            #[cfg(unix)]
            EngineEndpoint::Unix(path) => {
                let stream = tokio::net::UnixStream::connect(path)
                    .await
                    .map_err(|e| self.connection_failed(e))?;
                round_trip(stream, &line).await
            }
            #[cfg(not(unix))]
            EngineEndpoint::Unix(_) => Err(self.connection_failed(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "unix sockets are not available on this platform",
            ))),
            EngineEndpoint::Tcp(addr) => {
                let stream = tokio::net::TcpStream::connect(addr.as_str())
                    .await
                    .map_err(|e| self.connection_failed(e))?;
                round_trip(stream, &line).await
            }
        }
    }

    fn connection_failed(&self, source: std::io::Error) -> EngineError {
        EngineError::ConnectionFailed {
            endpoint: self.endpoint.to_string(),
            source,
        }
    }
}

async fn round_trip<S>(stream: S, line: &str) -> EngineResult<Response>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);

    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;

    let mut reader = BufReader::new(reader).take(MAX_RESPONSE_LINE as u64);
    let mut response_line = String::new();
    let read = reader.read_line(&mut response_line).await?;
    if read == 0 {
        return Err(EngineError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "engine closed connection without a response",
        )));
    }

    Ok(Response::from_json(&response_line)?)
}

fn unexpected(expected: &str, payload: &OkPayload) -> EngineError {
    EngineError::UnexpectedResponse {
        expected: expected.to_string(),
        got: format!("{payload:?}"),
    }
}

#[async_trait]
impl EngineClient for HyperClient {
    async fn get_version(&self) -> EngineResult<EngineVersion> {
        let payload = self.send_request(&Request::Version).await?;
        match payload {
            OkPayload {
                data:
                    Some(ResponseData::Version {
                        version,
                        api_version,
                    }),
            } => Ok(EngineVersion {
                version,
                api_version,
            }),
            other => Err(unexpected("Version", &other)),
        }
    }

    async fn create_pod(&self, spec: &UserPod) -> EngineResult<String> {
        let request = Request::CreatePod { spec: spec.clone() };
        let payload = self.send_request(&request).await?;
        match payload {
            OkPayload {
                data: Some(ResponseData::PodCreated { pod_id }),
            } => Ok(pod_id),
            other => Err(unexpected("PodCreated", &other)),
        }
    }

    async fn start_pod(&self, pod_id: &str) -> EngineResult<()> {
        self.send_request(&Request::StartPod {
            pod_id: pod_id.to_string(),
        })
        .await?;
        Ok(())
    }

    async fn stop_pod(&self, pod_id: &str) -> EngineResult<StopOutcome> {
        let payload = self
            .send_request(&Request::StopPod {
                pod_id: pod_id.to_string(),
            })
            .await?;
        match payload {
            OkPayload {
                data: Some(ResponseData::PodStopped { code, cause }),
            } => Ok(StopOutcome { code, cause }),
            OkPayload { data: None } => Ok(StopOutcome {
                code: 0,
                cause: String::new(),
            }),
            other => Err(unexpected("PodStopped", &other)),
        }
    }

    async fn remove_pod(&self, pod_id: &str) -> EngineResult<()> {
        self.send_request(&Request::RemovePod {
            pod_id: pod_id.to_string(),
        })
        .await?;
        Ok(())
    }

    async fn get_pod_info(&self, pod_id: &str) -> EngineResult<EngineRecord> {
        let payload = self
            .send_request(&Request::PodInfo {
                pod_id: pod_id.to_string(),
            })
            .await?;
        match payload {
            OkPayload {
                data: Some(ResponseData::PodInfo { pod }),
            } => Ok(pod),
            other => Err(unexpected("PodInfo", &other)),
        }
    }

    async fn get_pod_list(&self) -> EngineResult<Vec<EngineRecord>> {
        let payload = self.send_request(&Request::PodList).await?;
        match payload {
            OkPayload {
                data: Some(ResponseData::PodList { pods }),
            } => Ok(pods),
            other => Err(unexpected("PodList", &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// Serves one connection: reads a request line, replies with `reply`.
    async fn one_shot_server(reply: Response) -> (String, tokio::task::JoinHandle<Request>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (reader, mut writer) = stream.into_split();
            let mut line = String::new();
            BufReader::new(reader).read_line(&mut line).await.unwrap();
            writer
                .write_all(reply.to_json_line().unwrap().as_bytes())
                .await
                .unwrap();
            Request::from_json(&line).unwrap()
        });
        (format!("tcp://{addr}"), handle)
    }

    #[test]
    fn test_endpoint_parsing() {
        assert_eq!(
            EngineEndpoint::parse("unix:///var/run/hyper.sock").unwrap(),
            EngineEndpoint::Unix(PathBuf::from("/var/run/hyper.sock"))
        );
        assert_eq!(
            EngineEndpoint::parse("tcp://127.0.0.1:22318").unwrap(),
            EngineEndpoint::Tcp("127.0.0.1:22318".to_string())
        );
        assert!(EngineEndpoint::parse("unix://").is_err());
        assert!(EngineEndpoint::parse("tcp://localhost").is_err());
        assert!(EngineEndpoint::parse("http://localhost:80").is_err());
    }

    #[tokio::test]
    async fn test_create_pod_round_trip() {
        let (endpoint, server) = one_shot_server(Response::ok_with_data(ResponseData::PodCreated {
            pod_id: "pod-42".to_string(),
        }))
        .await;

        let client = HyperClient::new(&endpoint).unwrap();
        let spec = UserPod {
            name: "k8s_web_default_u1_0".to_string(),
            hostname: None,
            labels: Default::default(),
        };
        assert_eq!(client.create_pod(&spec).await.unwrap(), "pod-42");
        assert_eq!(server.await.unwrap(), Request::CreatePod { spec });
    }

    #[tokio::test]
    async fn test_remote_error_carries_code_and_cause() {
        let (endpoint, _server) = one_shot_server(Response::error(7, "pod is busy")).await;

        let client = HyperClient::new(&endpoint).unwrap();
        let err = client.stop_pod("pod-1").await.unwrap_err();
        assert_eq!(err.code_and_cause(), Some((7, "pod is busy")));
    }

    #[tokio::test]
    async fn test_unexpected_response() {
        let (endpoint, _server) = one_shot_server(Response::ok()).await;

        let client = HyperClient::new(&endpoint).unwrap();
        let err = client.get_pod_list().await.unwrap_err();
        assert!(matches!(err, EngineError::UnexpectedResponse { .. }));
    }

    #[tokio::test]
    async fn test_silent_engine_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(stream);
        });

        let client = HyperClient::new(&format!("tcp://{addr}"))
            .unwrap()
            .with_timeout(Duration::from_millis(100));
        let err = client.get_version().await.unwrap_err();
        assert!(matches!(err, EngineError::Timeout(_)));
    }
}
