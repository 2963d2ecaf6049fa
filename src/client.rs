use std::sync::Arc;

use serde_json::Map;
use tracing::{debug, info_span, warn};

use crate::DEFAULT_USER_AGENT;
use crate::config::Config;
use crate::error::Error;
use crate::execute::Executor;
use crate::extensions::{Sleeper, ThreadSleeper};
use crate::introspection::{INTROSPECTION_OPERATION_NAME, INTROSPECTION_QUERY};
use crate::request::{GraphqlRequest, QueryBuilder, RequestOptions};
use crate::response::Response;
use crate::retry::{RetryPolicy, run_with_retry};
use crate::transport::{Transport, UreqTransport};
use crate::util::truncate_body;

pub struct ClientBuilder {
    config: Config,
    transport: Option<Arc<dyn Transport>>,
    sleeper: Arc<dyn Sleeper>,
}

impl ClientBuilder {
    fn new(config: Config) -> Self {
        Self {
            config,
            transport: None,
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn build(self) -> Client {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(UreqTransport::new(DEFAULT_USER_AGENT)),
        };
        Client {
            endpoint: self.config.endpoint(),
            config: Arc::new(self.config),
            transport,
            sleeper: self.sleeper,
        }
    }
}

#[derive(Clone)]
pub struct Client {
    config: Arc<Config>,
    endpoint: String,
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
}

impl Client {
    pub fn new(config: Config) -> Self {
        Self::builder(config).build()
    }

    pub fn builder(config: Config) -> ClientBuilder {
        ClientBuilder::new(config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn request_options(&self) -> RequestOptions {
        RequestOptions::from_config(&self.config)
    }

    pub fn query(
        &self,
        query: impl Into<String>,
        operation_name: impl Into<String>,
    ) -> QueryBuilder<'_> {
        QueryBuilder::new(self, query.into(), operation_name.into())
    }

    /// Runs the schema introspection query.
    pub fn introspect(&self) -> crate::Result<Response> {
        let request = GraphqlRequest::new(
            INTROSPECTION_QUERY,
            INTROSPECTION_OPERATION_NAME,
            Some(Map::new()),
            self.request_options(),
        );
        self.execute(&request)
    }

    /// Sends `request`, retrying transient failures as allowed by its
    /// `max_retries`.
    ///
    /// Fails with [`Error::MissingAccessToken`] before touching the network
    /// when no access token is configured.
    pub fn execute(&self, request: &GraphqlRequest) -> crate::Result<Response> {
        let span = info_span!("graphql.query", operation = request.operation_name());
        let _entered = span.enter();

        if request.options().access_token().is_empty() {
            warn!("refusing to send graphql request without an access token");
            return Err(Error::MissingAccessToken);
        }

        let policy = RetryPolicy::standard()
            .max_attempts(request.options().max_retries())
            .backoff_unit(self.config.retry_backoff_unit());
        let executor = Executor::new(&self.endpoint, self.transport.as_ref());
        let result = run_with_retry(&policy, self.sleeper.as_ref(), |_| {
            executor.execute_once(request)
        });

        log_outcome(request, &result);
        result
    }
}

fn log_outcome(request: &GraphqlRequest, result: &crate::Result<Response>) {
    let response = match result {
        Ok(response) => response,
        Err(error) => match error.response() {
            Some(response) => response,
            None => {
                debug!(error = %error, "graphql query failed without a response");
                return;
            }
        },
    };

    debug!(
        status = response.status(),
        elapsed_ms = response.elapsed_ms(),
        retries = response.retry_count(),
        query = request.query(),
        "graphql query finished"
    );
    if response.status().is_none_or(|status| status > 299) {
        warn!(
            status = response.status(),
            kind = result.as_ref().err().and_then(Error::kind).map(|kind| kind.as_str()),
            body = %truncate_body(response.body()),
            "graphql query failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use http::HeaderMap;

    use super::Client;
    use crate::config::Config;
    use crate::error::{Error, ErrorKind};
    use crate::extensions::Sleeper;
    use crate::transport::{PostRequest, RawResponse, Transport, TransportError};

    struct ScriptedTransport {
        statuses: Vec<u16>,
        bodies: Mutex<Vec<String>>,
        urls: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(statuses: Vec<u16>) -> Arc<Self> {
            Arc::new(Self {
                statuses,
                bodies: Mutex::new(Vec::new()),
                urls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.bodies.lock().expect("lock bodies").len()
        }
    }

    impl Transport for ScriptedTransport {
        fn post(&self, request: &PostRequest<'_>) -> Result<RawResponse, TransportError> {
            let mut bodies = self.bodies.lock().expect("lock bodies");
            let status = self.statuses[bodies.len()];
            bodies.push(request.body.to_owned());
            self.urls
                .lock()
                .expect("lock urls")
                .push(request.url.to_owned());
            Ok(RawResponse {
                url: request.url.to_owned(),
                status: Some(status),
                headers: HeaderMap::new(),
                body: Some(r#"{"data":{}}"#.to_owned()),
                request_headers: request.headers.clone(),
                request_body: request.body.to_owned(),
                elapsed: Duration::from_millis(2),
            })
        }
    }

    struct NoSleep;

    impl Sleeper for NoSleep {
        fn sleep(&self, _delay: Duration) {}
    }

    fn client(config: Config, transport: Arc<ScriptedTransport>) -> Client {
        Client::builder(config)
            .transport(transport)
            .sleeper(Arc::new(NoSleep))
            .build()
    }

    #[test]
    fn missing_access_token_fails_before_any_call() {
        let transport = ScriptedTransport::new(vec![200]);
        let client = client(Config::new(""), Arc::clone(&transport));

        let error = client
            .query("{ a }", "a")
            .send()
            .expect_err("empty token must be rejected");

        assert!(matches!(error, Error::MissingAccessToken));
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn endpoint_follows_token_platform_or_override() {
        let transport = ScriptedTransport::new(vec![200]);
        assert_eq!(
            client(Config::new("sk_test_abc"), Arc::clone(&transport)).endpoint(),
            "https://public.sandbox-api.socio.events/graphql"
        );
        assert_eq!(
            client(
                Config::new("sk_live_abc").with_base_url("http://127.0.0.1:9000/"),
                transport
            )
            .endpoint(),
            "http://127.0.0.1:9000/graphql"
        );
    }

    #[test]
    fn per_call_retry_limit_overrides_config() {
        let transport = ScriptedTransport::new(vec![502, 502, 502, 502, 200]);
        let client = client(
            Config::new("sk_test_abc").with_max_retries(2),
            Arc::clone(&transport),
        );

        let response = client
            .query("{ a }", "a")
            .max_retries(5)
            .send()
            .expect("fifth attempt should succeed");

        assert_eq!(response.retry_count(), 4);
        assert_eq!(transport.calls(), 5);
    }

    #[test]
    fn config_retry_limit_applies_by_default() {
        let transport = ScriptedTransport::new(vec![502, 502, 200]);
        let client = client(
            Config::new("sk_test_abc").with_max_retries(2),
            Arc::clone(&transport),
        );

        let error = client
            .query("{ a }", "a")
            .send()
            .expect_err("two attempts are not enough");

        assert_eq!(error.kind(), Some(ErrorKind::BadGateway));
        assert_eq!(error.response().map(|response| response.retry_count()), Some(2));
        assert_eq!(transport.calls(), 2);
    }

    #[test]
    fn introspection_sends_named_operation() {
        let transport = ScriptedTransport::new(vec![200]);
        let client = client(Config::new("sk_test_abc"), Arc::clone(&transport));

        client.introspect().expect("introspection should succeed");

        let bodies = transport.bodies.lock().expect("lock bodies");
        let payload: serde_json::Value =
            serde_json::from_str(&bodies[0]).expect("payload should be json");
        assert_eq!(payload["operation_name"], "IntrospectionQuery");
        assert!(
            payload["query"]
                .as_str()
                .is_some_and(|query| query.contains("__schema"))
        );
        assert!(payload.get("variables").is_none());
    }
}
