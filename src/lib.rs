//! `gqlx` is a blocking GraphQL client for SDKs that need typed failure
//! classification, bounded retries and rate-limit header parsing.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use gqlx::prelude::{Client, Config, ErrorKind};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(
//!         Config::new("sk_test_xxx")
//!             .with_read_timeout(Duration::from_secs(10))
//!             .with_max_retries(3),
//!     );
//!
//!     match client
//!         .query("query Currencies { currenciesList { isoCode } }", "Currencies")
//!         .send()
//!     {
//!         Ok(response) => {
//!             println!("data={:?}", response.data());
//!             println!("quota left today={:?}", response.rate_limiter().remaining_per_day());
//!         }
//!         Err(error) if error.kind() == Some(ErrorKind::AccessTokenIsExpired) => {
//!             eprintln!("refresh the token");
//!         }
//!         Err(error) => return Err(error.into()),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Recommended Defaults
//!
//! - Only `502 Bad Gateway` is retried; every other failure is returned at once.
//! - For mutations, set `idempotency_key(...)` or `generated_idempotency_key()`.
//! - Inspect [`Response::rate_limiter`] before issuing bursts of queries.

#[cfg(all(not(feature = "tls-rustls"), not(feature = "tls-native")))]
compile_error!("gqlx requires one TLS backend feature: enable `tls-rustls` or `tls-native`");

pub(crate) const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";
pub(crate) const DEFAULT_USER_AGENT: &str = concat!("gqlx/", env!("CARGO_PKG_VERSION"));

mod classify;
mod client;
mod config;
mod error;
mod execute;
mod extensions;
mod introspection;
mod rate_limit;
mod request;
mod response;
mod retry;
mod transport;
mod util;

pub use crate::classify::classify_response;
pub use crate::client::{Client, ClientBuilder};
pub use crate::config::{
    Config, GRAPHQL_PATH, LOCAL_BASE_URL, PRODUCTION_BASE_URL, Platform, SANDBOX_BASE_URL,
};
pub use crate::error::{ClassifiedError, Error, ErrorCode, ErrorKind};
pub use crate::extensions::{Sleeper, ThreadSleeper};
pub use crate::introspection::{INTROSPECTION_OPERATION_NAME, INTROSPECTION_QUERY};
pub use crate::rate_limit::RateLimiter;
pub use crate::request::{GraphqlRequest, QueryBuilder, RequestOptions, generate_idempotency_key};
pub use crate::response::Response;
pub use crate::retry::RetryPolicy;
pub use crate::transport::{
    PostRequest, RawResponse, Transport, TransportError, TransportErrorKind, UreqTransport,
};

pub type Result<T> = std::result::Result<T, Error>;

pub mod prelude {
    pub use crate::{
        ClassifiedError, Client, Config, Error, ErrorCode, ErrorKind, GraphqlRequest, Platform,
        RateLimiter, RequestOptions, Response, Result, RetryPolicy, Transport, TransportErrorKind,
    };
}
