use std::sync::OnceLock;
use std::time::Duration;

use http::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::error;

use crate::error::Error;
use crate::rate_limit::RateLimiter;
use crate::transport::RawResponse;
use crate::util::truncate_body;

/// The outcome of one HTTP attempt: status, headers, body and the quota
/// view derived from those headers.
#[derive(Clone, Debug)]
pub struct Response {
    url: String,
    status: Option<u16>,
    headers: HeaderMap,
    body: String,
    request_headers: HeaderMap,
    request_body: String,
    elapsed: Duration,
    retry_count: usize,
    rate_limiter: RateLimiter,
    json_body: OnceLock<Map<String, Value>>,
}

impl Response {
    pub fn new(raw: RawResponse) -> Self {
        Self::with_retry_count(raw, 0)
    }

    pub fn with_retry_count(raw: RawResponse, retry_count: usize) -> Self {
        let rate_limiter = RateLimiter::from_headers(&raw.headers);
        Self {
            url: raw.url,
            status: raw.status,
            headers: raw.headers,
            body: raw.body.unwrap_or_default(),
            request_headers: raw.request_headers,
            request_body: raw.request_body,
            elapsed: raw.elapsed,
            retry_count,
            rate_limiter,
            json_body: OnceLock::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn request_headers(&self) -> &HeaderMap {
        &self.request_headers
    }

    /// Raw response text; empty when the transport delivered no body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The body decoded as a JSON object.
    ///
    /// Decoded once on first access. A body that is not a JSON object yields
    /// an empty map; the failure is logged and never returned.
    pub fn json_body(&self) -> &Map<String, Value> {
        self.json_body.get_or_init(|| decode_json_object(&self.body))
    }

    /// Strict typed decode of the body.
    pub fn json<T>(&self) -> crate::Result<T>
    where
        T: DeserializeOwned,
    {
        serde_json::from_str(&self.body).map_err(|source| Error::Deserialize {
            source,
            body: truncate_body(&self.body),
        })
    }

    pub fn data(&self) -> Option<&Value> {
        self.json_body().get("data")
    }

    pub fn graphql_errors(&self) -> Option<&[Value]> {
        self.json_body()
            .get("errors")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
    }

    pub fn request_body(&self) -> &str {
        &self.request_body
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }

    pub fn retry_count(&self) -> usize {
        self.retry_count
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    pub(crate) fn set_retry_count(&mut self, retry_count: usize) {
        self.retry_count = retry_count;
    }
}

fn decode_json_object(body: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            error!(
                json_type = json_type_name(&other),
                body = %truncate_body(body),
                "response body is not a json object"
            );
            Map::new()
        }
        Err(source) => {
            error!(
                error = %source,
                body = %truncate_body(body),
                "response body json decode error"
            );
            Map::new()
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use http::{HeaderMap, HeaderValue};
    use serde::Deserialize;

    use super::Response;
    use crate::error::ErrorCode;
    use crate::transport::RawResponse;

    const CURRENCIES_BODY: &str = r#"{"data":{"currenciesList":[{"isoCode":"USD"},{"isoCode":"EUR"},{"isoCode":"GBP"}]}}"#;
    const REQUEST_BODY: &str = r#"{"query":"query Query { currenciesList { isoCode } }","operation_name":"currenciesList"}"#;

    fn raw(status: Option<u16>, body: Option<&str>) -> RawResponse {
        let mut headers = HeaderMap::new();
        headers.insert("x-daily-call-limit", HeaderValue::from_static("62/2000"));
        headers.insert("x-secondly-call-limit", HeaderValue::from_static("1/500"));
        RawResponse {
            url: "https://public.sandbox-api.socio.events/graphql".to_owned(),
            status,
            headers,
            body: body.map(str::to_owned),
            request_headers: HeaderMap::new(),
            request_body: REQUEST_BODY.to_owned(),
            elapsed: Duration::from_millis(569),
        }
    }

    #[test]
    fn exposes_status_body_and_quota() {
        let response = Response::new(raw(Some(200), Some(CURRENCIES_BODY)));

        assert_eq!(response.status(), Some(200));
        assert_eq!(response.body(), CURRENCIES_BODY);
        assert_eq!(response.request_body(), REQUEST_BODY);
        assert_eq!(response.elapsed_ms(), 569);
        assert_eq!(response.retry_count(), 0);
        assert_eq!(response.rate_limiter().used_per_day(), Some(62));
        assert_eq!(response.rate_limiter().threshold_per_day(), Some(2000));
        assert_eq!(response.rate_limiter().used_per_second(), Some(1));
        assert_eq!(response.rate_limiter().threshold_per_second(), Some(500));

        let currencies = response
            .data()
            .and_then(|data| data.get("currenciesList"))
            .and_then(|list| list.as_array())
            .expect("currencies list should be present");
        assert_eq!(currencies.len(), 3);
    }

    #[test]
    fn malformed_body_decodes_to_empty_map_and_keeps_text() {
        let response = Response::new(raw(Some(502), Some("Bad Gateway")));

        assert!(response.json_body().is_empty());
        assert_eq!(response.body(), "Bad Gateway");
        assert!(response.data().is_none());
    }

    #[test]
    fn non_object_json_decodes_to_empty_map() {
        let response = Response::new(raw(Some(200), Some("[1,2,3]")));
        assert!(response.json_body().is_empty());
    }

    #[test]
    fn absent_body_becomes_empty_text() {
        let response = Response::with_retry_count(raw(None, None), 2);

        assert_eq!(response.body(), "");
        assert_eq!(response.status(), None);
        assert_eq!(response.retry_count(), 2);
        assert!(response.json_body().is_empty());
    }

    #[test]
    fn json_body_is_decoded_once() {
        let response = Response::new(raw(Some(200), Some(CURRENCIES_BODY)));
        let first = response.json_body() as *const _;
        let second = response.json_body() as *const _;
        assert_eq!(first, second);
    }

    #[test]
    fn typed_decode_reports_deserialize_error() {
        #[derive(Debug, Deserialize)]
        struct Envelope {
            data: serde_json::Value,
        }

        let response = Response::new(raw(Some(200), Some(CURRENCIES_BODY)));
        let envelope: Envelope = response.json().expect("body should decode");
        assert!(envelope.data.get("currenciesList").is_some());

        let broken = Response::new(raw(Some(200), Some("not json")));
        let error = broken
            .json::<Envelope>()
            .expect_err("invalid json should fail strict decode");
        assert_eq!(error.code(), ErrorCode::Deserialize);
    }

    #[test]
    fn exposes_graphql_errors_array() {
        let body = r#"{"data":null,"errors":[{"message":"Field 'x' doesn't exist"}]}"#;
        let response = Response::new(raw(Some(200), Some(body)));

        let errors = response.graphql_errors().expect("errors should be present");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0]["message"], "Field 'x' doesn't exist");
    }

    #[test]
    fn elapsed_ms_saturates_for_huge_durations() {
        let response = Response::new(RawResponse {
            url: "https://public.sandbox-api.socio.events/graphql".to_owned(),
            status: Some(200),
            headers: HeaderMap::new(),
            body: None,
            request_headers: HeaderMap::new(),
            request_body: String::new(),
            elapsed: Duration::MAX,
        });

        assert_eq!(response.elapsed_ms(), u64::MAX);
        assert_eq!(response.body(), "");
    }
}
