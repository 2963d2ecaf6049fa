use std::time::{Duration, Instant};

use http::{HeaderMap, Method};
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TransportErrorKind {
    Dns,
    Connect,
    Tls,
    Timeout,
    Read,
    Other,
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Dns => "dns",
            Self::Connect => "connect",
            Self::Tls => "tls",
            Self::Timeout => "timeout",
            Self::Read => "read",
            Self::Other => "other",
        };
        formatter.write_str(text)
    }
}

/// Connection-level failure. Ordinary non-2xx responses are never reported
/// through this type.
#[derive(Debug, Error)]
#[error("{kind} failure: {source}")]
pub struct TransportError {
    kind: TransportErrorKind,
    #[source]
    source: BoxError,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, source: impl Into<BoxError>) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }
}

/// One POST as handed to a [`Transport`].
#[derive(Clone, Copy, Debug)]
pub struct PostRequest<'a> {
    pub url: &'a str,
    pub body: &'a str,
    pub headers: &'a HeaderMap,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

/// Everything a transport observed for a single attempt.
#[derive(Clone, Debug)]
pub struct RawResponse {
    pub url: String,
    pub status: Option<u16>,
    pub headers: HeaderMap,
    pub body: Option<String>,
    pub request_headers: HeaderMap,
    pub request_body: String,
    pub elapsed: Duration,
}

pub trait Transport: Send + Sync {
    /// Sends one request. Must return `Ok` for every HTTP status and `Err`
    /// only when no response was received at all.
    fn post(&self, request: &PostRequest<'_>) -> Result<RawResponse, TransportError>;
}

/// Default transport backed by a shared `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(user_agent: &str) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(0)
            .user_agent(user_agent)
            .build();
        Self {
            agent: config.new_agent(),
        }
    }
}

impl Transport for UreqTransport {
    fn post(&self, request: &PostRequest<'_>) -> Result<RawResponse, TransportError> {
        let mut builder = ureq::http::Request::builder()
            .method(Method::POST)
            .uri(request.url);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        let http_request = builder
            .body(request.body.as_bytes().to_vec())
            .map_err(|source| TransportError::new(TransportErrorKind::Other, source))?;

        let configured_request = self
            .agent
            .configure_request(http_request)
            .timeout_global(Some(request.timeout))
            .timeout_connect(Some(request.connect_timeout))
            .build();

        let started = Instant::now();
        let mut response = self.agent.run(configured_request).map_err(into_transport_error)?;
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(into_transport_error)?;

        Ok(RawResponse {
            url: request.url.to_owned(),
            status: Some(response.status().as_u16()),
            headers: response.headers().clone(),
            body: Some(body),
            request_headers: request.headers.clone(),
            request_body: request.body.to_owned(),
            elapsed: started.elapsed(),
        })
    }
}

fn into_transport_error(error: ureq::Error) -> TransportError {
    TransportError::new(classify_ureq_transport_error(&error), error)
}

pub(crate) fn classify_ureq_transport_error(error: &ureq::Error) -> TransportErrorKind {
    match error {
        ureq::Error::HostNotFound => TransportErrorKind::Dns,
        ureq::Error::Timeout(_) => TransportErrorKind::Timeout,
        ureq::Error::Tls(_) => TransportErrorKind::Tls,
        ureq::Error::ConnectProxyFailed(_) | ureq::Error::ConnectionFailed => {
            TransportErrorKind::Connect
        }
        ureq::Error::Io(source) => match source.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                TransportErrorKind::Timeout
            }
            std::io::ErrorKind::NotFound => TransportErrorKind::Dns,
            std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::NotConnected
            | std::io::ErrorKind::AddrNotAvailable => TransportErrorKind::Connect,
            std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof => TransportErrorKind::Read,
            _ => TransportErrorKind::Other,
        },
        _ => TransportErrorKind::Other,
    }
}
