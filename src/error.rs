use thiserror::Error;

use crate::response::Response;
use crate::transport::TransportError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorKind {
    NullStatus,
    BadRequest,
    InvalidAccessToken,
    AccessTokenIsExpired,
    AuthenticationRequired,
    AuthorizationFailed,
    ResourceNotFound,
    RequestTimeout,
    Conflict,
    QueryComplexityIsTooHigh,
    UnprocessableEntity,
    DailyQuotaIsReached,
    SecondBasedQuotaIsReached,
    TooManyRequests,
    ServerError,
    BadGateway,
    ServiceUnavailable,
    GatewayTimeout,
    UnclassifiedStatus,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NullStatus => "null_status",
            Self::BadRequest => "bad_request",
            Self::InvalidAccessToken => "invalid_access_token",
            Self::AccessTokenIsExpired => "access_token_is_expired",
            Self::AuthenticationRequired => "authentication_required",
            Self::AuthorizationFailed => "authorization_failed",
            Self::ResourceNotFound => "resource_not_found",
            Self::RequestTimeout => "request_timeout",
            Self::Conflict => "conflict",
            Self::QueryComplexityIsTooHigh => "query_complexity_is_too_high",
            Self::UnprocessableEntity => "unprocessable_entity",
            Self::DailyQuotaIsReached => "daily_quota_is_reached",
            Self::SecondBasedQuotaIsReached => "second_based_quota_is_reached",
            Self::TooManyRequests => "too_many_requests",
            Self::ServerError => "server_error",
            Self::BadGateway => "bad_gateway",
            Self::ServiceUnavailable => "service_unavailable",
            Self::GatewayTimeout => "gateway_timeout",
            Self::UnclassifiedStatus => "unclassified_status",
        }
    }

    /// Only a bad gateway is worth repeating; every other kind is final on
    /// its first occurrence.
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::BadGateway)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A non-success response tagged with exactly one [`ErrorKind`].
///
/// The full response travels with the error so callers can inspect the
/// status, body, quota headers and how many retries were spent.
#[derive(Debug, Error)]
#[error("graphql request failed with {kind} (status {status})", status = status_text(.response.status()))]
pub struct ClassifiedError {
    kind: ErrorKind,
    response: Box<Response>,
}

impl ClassifiedError {
    pub(crate) fn new(kind: ErrorKind, response: Response) -> Self {
        Self {
            kind,
            response: Box::new(response),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn into_response(self) -> Response {
        *self.response
    }

    pub(crate) fn set_retry_count(&mut self, retry_count: usize) {
        self.response.set_retry_count(retry_count);
    }
}

fn status_text(status: Option<u16>) -> String {
    match status {
        Some(status) => status.to_string(),
        None => "none".to_owned(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorCode {
    MissingAccessToken,
    SerializeJson,
    InvalidHeaderValue,
    Transport,
    HttpStatus,
    Deserialize,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingAccessToken => "missing_access_token",
            Self::SerializeJson => "serialize_json",
            Self::InvalidHeaderValue => "invalid_header_value",
            Self::Transport => "transport",
            Self::HttpStatus => "http_status",
            Self::Deserialize => "deserialize",
        }
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("access token is missing")]
    MissingAccessToken,
    #[error("failed to serialize graphql payload: {source}")]
    SerializeJson {
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid header value for {name}: {source}")]
    InvalidHeaderValue {
        name: String,
        #[source]
        source: http::header::InvalidHeaderValue,
    },
    #[error("graphql transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },
    #[error(transparent)]
    Status(#[from] ClassifiedError),
    #[error("failed to decode response json: {source}; body={body}")]
    Deserialize {
        #[source]
        source: serde_json::Error,
        body: String,
    },
}

impl Error {
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MissingAccessToken => ErrorCode::MissingAccessToken,
            Self::SerializeJson { .. } => ErrorCode::SerializeJson,
            Self::InvalidHeaderValue { .. } => ErrorCode::InvalidHeaderValue,
            Self::Transport { .. } => ErrorCode::Transport,
            Self::Status(_) => ErrorCode::HttpStatus,
            Self::Deserialize { .. } => ErrorCode::Deserialize,
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Status(error) => Some(error.kind()),
            _ => None,
        }
    }

    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Status(error) => Some(error.response()),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status(error) => error.is_retryable(),
            _ => false,
        }
    }
}
