use http::HeaderMap;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderValue, USER_AGENT};
use tracing::{debug, error};

use crate::classify::classify;
use crate::error::Error;
use crate::request::GraphqlRequest;
use crate::response::Response;
use crate::transport::{PostRequest, Transport};
use crate::util::{parse_header_value, sensitive_header_value};
use crate::{DEFAULT_USER_AGENT, IDEMPOTENCY_KEY_HEADER};

const SDK_NAME: &str = "Rust SDK";
const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");
// rustc that compiled the crate, captured by build.rs.
const SDK_LANG_VERSION: &str = env!("GQLX_RUSTC_VERSION");

const SDK_NAME_HEADER: &str = "x-sdk-name";
const SDK_VERSION_HEADER: &str = "x-sdk-version";
const SDK_LANG_VERSION_HEADER: &str = "x-sdk-lang-version";

pub(crate) struct Executor<'a> {
    endpoint: &'a str,
    transport: &'a dyn Transport,
}

impl<'a> Executor<'a> {
    pub(crate) fn new(endpoint: &'a str, transport: &'a dyn Transport) -> Self {
        Self {
            endpoint,
            transport,
        }
    }

    pub(crate) fn execute_once(&self, request: &GraphqlRequest) -> crate::Result<Response> {
        let body = request.payload_json()?;
        let headers = request_headers(request)?;
        let options = request.options();
        let post = PostRequest {
            url: self.endpoint,
            body: &body,
            headers: &headers,
            timeout: options.timeout(),
            connect_timeout: options.connect_timeout(),
        };

        debug!(url = self.endpoint, "sending graphql request");
        let raw = self.transport.post(&post).map_err(|source| {
            error!(
                url = self.endpoint,
                kind = %source.kind(),
                error = %source,
                "graphql transport failure"
            );
            Error::Transport {
                url: self.endpoint.to_owned(),
                source,
            }
        })?;

        let response = Response::new(raw);
        debug!(
            status = response.status(),
            elapsed_ms = response.elapsed_ms(),
            "graphql attempt completed"
        );
        classify(response).map_err(Error::from)
    }
}

pub(crate) fn request_headers(request: &GraphqlRequest) -> crate::Result<HeaderMap> {
    let options = request.options();
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        AUTHORIZATION,
        sensitive_header_value(
            AUTHORIZATION.as_str(),
            &format!("Bearer {}", options.access_token()),
        )?,
    );
    headers.insert(SDK_NAME_HEADER, HeaderValue::from_static(SDK_NAME));
    headers.insert(SDK_VERSION_HEADER, HeaderValue::from_static(SDK_VERSION));
    headers.insert(
        SDK_LANG_VERSION_HEADER,
        HeaderValue::from_static(SDK_LANG_VERSION),
    );
    headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if let Some(idempotency_key) = options.idempotency_key() {
        headers.insert(
            IDEMPOTENCY_KEY_HEADER,
            parse_header_value(IDEMPOTENCY_KEY_HEADER, idempotency_key)?,
        );
    }
    Ok(headers)
}
