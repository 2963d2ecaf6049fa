use http::HeaderValue;

use crate::error::Error;

const MAX_LOGGED_BODY_LEN: usize = 2048;

pub(crate) fn join_base_path(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let relative = path.trim_start_matches('/');
    match (base.is_empty(), relative.is_empty()) {
        (true, true) => String::new(),
        (true, false) => relative.to_owned(),
        (false, true) => base.to_owned(),
        (false, false) => format!("{base}/{relative}"),
    }
}

pub(crate) fn parse_header_value(name: &str, value: &str) -> Result<HeaderValue, Error> {
    value
        .parse()
        .map_err(|source| Error::InvalidHeaderValue {
            name: name.to_owned(),
            source,
        })
}

pub(crate) fn sensitive_header_value(name: &str, value: &str) -> Result<HeaderValue, Error> {
    let mut value = parse_header_value(name, value)?;
    value.set_sensitive(true);
    Ok(value)
}

pub(crate) fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_LOGGED_BODY_LEN {
        return body.to_owned();
    }

    let truncated: String = body.chars().take(MAX_LOGGED_BODY_LEN).collect();
    format!("{truncated}...(truncated)")
}
