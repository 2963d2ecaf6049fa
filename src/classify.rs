use serde_json::{Map, Value};

use crate::error::{ClassifiedError, ErrorKind};
use crate::response::Response;

const INVALID_TOKEN_CODES: [&str; 3] = ["TOKEN_IS_REVOKED", "INVALID_TOKEN", "JWT_TOKEN_IS_INVALID"];
const EXPIRED_TOKEN_CODES: [&str; 2] = ["TOKEN_IS_EXPIRED", "JWT_TOKEN_IS_EXPIRED"];

pub(crate) fn classify(response: Response) -> Result<Response, ClassifiedError> {
    match classify_response(&response) {
        None => Ok(response),
        Some(kind) => Err(ClassifiedError::new(kind, response)),
    }
}

/// Returns the failure kind for a response, or `None` for a 2xx status.
pub fn classify_response(response: &Response) -> Option<ErrorKind> {
    let Some(status) = response.status() else {
        return Some(ErrorKind::NullStatus);
    };

    let kind = match status {
        200..=299 => return None,
        400 => classify_bad_request(response.json_body()),
        401 => ErrorKind::AuthenticationRequired,
        403 => ErrorKind::AuthorizationFailed,
        404 => ErrorKind::ResourceNotFound,
        408 => ErrorKind::RequestTimeout,
        409 => ErrorKind::Conflict,
        413 => ErrorKind::QueryComplexityIsTooHigh,
        422 => ErrorKind::UnprocessableEntity,
        429 => classify_too_many_requests(response.json_body()),
        500 => ErrorKind::ServerError,
        502 => ErrorKind::BadGateway,
        503 => ErrorKind::ServiceUnavailable,
        504 => ErrorKind::GatewayTimeout,
        _ => ErrorKind::UnclassifiedStatus,
    };
    Some(kind)
}

fn extensions(body: &Map<String, Value>) -> Option<&Map<String, Value>> {
    body.get("extensions").and_then(Value::as_object)
}

fn classify_bad_request(body: &Map<String, Value>) -> ErrorKind {
    let code = extensions(body)
        .and_then(|extensions| extensions.get("code"))
        .and_then(Value::as_str);

    match code {
        Some(code) if INVALID_TOKEN_CODES.contains(&code) => ErrorKind::InvalidAccessToken,
        Some(code) if EXPIRED_TOKEN_CODES.contains(&code) => ErrorKind::AccessTokenIsExpired,
        _ => ErrorKind::BadRequest,
    }
}

// Daily exhaustion wins over per-second exhaustion.
fn classify_too_many_requests(body: &Map<String, Value>) -> ErrorKind {
    let Some(extensions) = extensions(body) else {
        return ErrorKind::TooManyRequests;
    };

    if cost(extensions, "dailyAvailableCost").is_some_and(|available| available < 1) {
        return ErrorKind::DailyQuotaIsReached;
    }
    if cost(extensions, "availableCost").is_some_and(|available| available < 1) {
        return ErrorKind::SecondBasedQuotaIsReached;
    }
    ErrorKind::TooManyRequests
}

// A missing cost field is unknown rather than zero, so `availableCost: 0`
// alone reports the per-second window.
fn cost(extensions: &Map<String, Value>, field: &str) -> Option<i64> {
    match extensions.get(field)? {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|value| value.trunc() as i64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
