use std::time::Duration;

use http::HeaderMap;

pub(crate) const SECONDLY_CALL_LIMIT_HEADER: &str = "x-secondly-call-limit";
pub(crate) const DAILY_CALL_LIMIT_HEADER: &str = "x-daily-call-limit";
pub(crate) const SECONDLY_RETRY_AFTER_HEADER: &str = "x-secondly-retry-after";
pub(crate) const DAILY_RETRY_AFTER_HEADER: &str = "x-daily-retry-after";

/// Quota state reported by the server for one response.
///
/// Two independent windows are tracked: a per-second cost window and a
/// per-day cost window. Every field is `None` when the server did not send
/// the matching header (or sent something unparsable), so "no data" is never
/// confused with "zero usage".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RateLimiter {
    used_per_second: Option<u64>,
    threshold_per_second: Option<u64>,
    used_per_day: Option<u64>,
    threshold_per_day: Option<u64>,
    retry_after_ms: Option<u64>,
    retry_after_seconds: Option<u64>,
}

impl RateLimiter {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let (used_per_second, threshold_per_second) =
            used_and_threshold(headers, SECONDLY_CALL_LIMIT_HEADER).unzip();
        let (used_per_day, threshold_per_day) =
            used_and_threshold(headers, DAILY_CALL_LIMIT_HEADER).unzip();

        Self {
            used_per_second,
            threshold_per_second,
            used_per_day,
            threshold_per_day,
            retry_after_ms: integer_header(headers, SECONDLY_RETRY_AFTER_HEADER),
            retry_after_seconds: integer_header(headers, DAILY_RETRY_AFTER_HEADER),
        }
    }

    pub fn used_per_second(&self) -> Option<u64> {
        self.used_per_second
    }

    pub fn threshold_per_second(&self) -> Option<u64> {
        self.threshold_per_second
    }

    pub fn used_per_day(&self) -> Option<u64> {
        self.used_per_day
    }

    pub fn threshold_per_day(&self) -> Option<u64> {
        self.threshold_per_day
    }

    /// Wait hint for the per-second window, in milliseconds.
    pub fn retry_after_ms(&self) -> Option<u64> {
        self.retry_after_ms
    }

    /// Wait hint for the per-day window, in seconds.
    pub fn retry_after_seconds(&self) -> Option<u64> {
        self.retry_after_seconds
    }

    pub fn remaining_per_second(&self) -> Option<u64> {
        remaining(self.used_per_second, self.threshold_per_second)
    }

    pub fn remaining_per_day(&self) -> Option<u64> {
        remaining(self.used_per_day, self.threshold_per_day)
    }

    pub fn second_retry_after(&self) -> Option<Duration> {
        self.retry_after_ms.map(Duration::from_millis)
    }

    pub fn day_retry_after(&self) -> Option<Duration> {
        self.retry_after_seconds.map(Duration::from_secs)
    }

    /// The longer of the two wait hints, if the server sent any.
    pub fn suggested_delay(&self) -> Option<Duration> {
        match (self.second_retry_after(), self.day_retry_after()) {
            (Some(second), Some(day)) => Some(second.max(day)),
            (second, day) => second.or(day),
        }
    }
}

fn remaining(used: Option<u64>, threshold: Option<u64>) -> Option<u64> {
    Some(threshold?.saturating_sub(used?))
}

fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let value = headers.get(name).and_then(|raw| raw.to_str().ok())?.trim();
    if value.is_empty() { None } else { Some(value) }
}

fn integer_header(headers: &HeaderMap, name: &str) -> Option<u64> {
    header_text(headers, name)?.parse().ok()
}

// A malformed side discards the whole pair.
fn used_and_threshold(headers: &HeaderMap, name: &str) -> Option<(u64, u64)> {
    let (used, threshold) = header_text(headers, name)?.split_once('/')?;
    let used = used.trim().parse().ok()?;
    let threshold = threshold.trim().parse().ok()?;
    Some((used, threshold))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use http::{HeaderMap, HeaderName, HeaderValue};

    use super::RateLimiter;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(
                HeaderName::from_bytes(name.as_bytes()).expect("valid header name"),
                HeaderValue::from_str(value).expect("valid header value"),
            );
        }
        headers
    }

    #[test]
    fn parses_used_and_threshold_pairs() {
        let limiter = RateLimiter::from_headers(&headers(&[
            ("X-DAILY-CALL-LIMIT", "62/2000"),
            ("X-SECONDLY-CALL-LIMIT", "1/500"),
        ]));

        assert_eq!(limiter.used_per_day(), Some(62));
        assert_eq!(limiter.threshold_per_day(), Some(2000));
        assert_eq!(limiter.used_per_second(), Some(1));
        assert_eq!(limiter.threshold_per_second(), Some(500));
        assert_eq!(limiter.retry_after_ms(), None);
        assert_eq!(limiter.retry_after_seconds(), None);
        assert_eq!(limiter.remaining_per_day(), Some(1938));
        assert_eq!(limiter.remaining_per_second(), Some(499));
    }

    #[test]
    fn parses_retry_after_hints() {
        let limiter = RateLimiter::from_headers(&headers(&[
            ("X-DAILY-CALL-LIMIT", "500/2000"),
            ("X-SECONDLY-CALL-LIMIT", "500/500"),
            ("X-SECONDLY-RETRY-AFTER", "100"),
            ("X-DAILY-RETRY-AFTER", "200"),
        ]));

        assert_eq!(limiter.used_per_second(), Some(500));
        assert_eq!(limiter.remaining_per_second(), Some(0));
        assert_eq!(limiter.retry_after_ms(), Some(100));
        assert_eq!(limiter.retry_after_seconds(), Some(200));
        assert_eq!(limiter.second_retry_after(), Some(Duration::from_millis(100)));
        assert_eq!(limiter.suggested_delay(), Some(Duration::from_secs(200)));
    }

    #[test]
    fn missing_headers_stay_unset_rather_than_zero() {
        let limiter = RateLimiter::from_headers(&headers(&[(
            "content-type",
            "application/json; charset=utf-8",
        )]));

        assert_eq!(limiter, RateLimiter::default());
        assert_eq!(limiter.used_per_day(), None);
        assert_eq!(limiter.threshold_per_second(), None);
        assert_eq!(limiter.remaining_per_day(), None);
        assert_eq!(limiter.suggested_delay(), None);
    }

    #[test]
    fn empty_values_are_treated_as_missing() {
        let limiter = RateLimiter::from_headers(&headers(&[
            ("x-daily-call-limit", ""),
            ("x-secondly-retry-after", "  "),
        ]));

        assert_eq!(limiter.used_per_day(), None);
        assert_eq!(limiter.threshold_per_day(), None);
        assert_eq!(limiter.retry_after_ms(), None);
    }

    #[test]
    fn malformed_values_are_discarded() {
        let limiter = RateLimiter::from_headers(&headers(&[
            ("x-daily-call-limit", "62"),
            ("x-secondly-call-limit", "abc/500"),
            ("x-secondly-retry-after", "soon"),
            ("x-daily-retry-after", "-5"),
        ]));

        assert_eq!(limiter, RateLimiter::default());
    }

    #[test]
    fn pair_splits_on_first_slash_only() {
        let limiter =
            RateLimiter::from_headers(&headers(&[("x-daily-call-limit", " 7 / 10 ")]));
        assert_eq!(limiter.used_per_day(), Some(7));
        assert_eq!(limiter.threshold_per_day(), Some(10));

        let limiter = RateLimiter::from_headers(&headers(&[("x-daily-call-limit", "7/10/3")]));
        assert_eq!(limiter.used_per_day(), None);
    }
}
