use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::client::Client;
use crate::config::Config;
use crate::error::Error;
use crate::response::Response;

/// Per-call settings, seeded from [`Config`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestOptions {
    access_token: String,
    timeout: Duration,
    connect_timeout: Duration,
    max_retries: usize,
    idempotency_key: Option<String>,
}

impl RequestOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            access_token: config.access_token().to_owned(),
            timeout: config.read_timeout(),
            connect_timeout: config.connect_timeout(),
            max_retries: config.max_retries(),
            idempotency_key: None,
        }
    }

    pub fn with_idempotency_key(mut self, idempotency_key: impl Into<String>) -> Self {
        self.idempotency_key = Some(idempotency_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.max(Duration::from_millis(1));
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout.max(Duration::from_millis(1));
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    pub fn idempotency_key(&self) -> Option<&str> {
        self.idempotency_key.as_deref()
    }
}

#[derive(Clone, Debug)]
pub struct GraphqlRequest {
    query: String,
    operation_name: String,
    variables: Option<Map<String, Value>>,
    options: RequestOptions,
}

#[derive(Serialize)]
struct Payload<'a> {
    query: &'a str,
    operation_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<&'a Map<String, Value>>,
}

impl GraphqlRequest {
    pub fn new(
        query: impl Into<String>,
        operation_name: impl Into<String>,
        variables: Option<Map<String, Value>>,
        options: RequestOptions,
    ) -> Self {
        Self {
            query: query.into(),
            operation_name: operation_name.into(),
            variables,
            options,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn operation_name(&self) -> &str {
        &self.operation_name
    }

    pub fn variables(&self) -> Option<&Map<String, Value>> {
        self.variables.as_ref()
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    /// Wire body; `variables` is left out when absent or empty.
    pub fn payload_json(&self) -> crate::Result<String> {
        let payload = Payload {
            query: &self.query,
            operation_name: &self.operation_name,
            variables: self.variables.as_ref().filter(|variables| !variables.is_empty()),
        };
        serde_json::to_string(&payload).map_err(|source| Error::SerializeJson { source })
    }
}

/// Fluent builder returned by [`Client::query`].
pub struct QueryBuilder<'a> {
    client: &'a Client,
    query: String,
    operation_name: String,
    variables: Option<Map<String, Value>>,
    options: RequestOptions,
}

impl<'a> QueryBuilder<'a> {
    pub(crate) fn new(client: &'a Client, query: String, operation_name: String) -> Self {
        Self {
            client,
            query,
            operation_name,
            variables: None,
            options: RequestOptions::from_config(client.config()),
        }
    }

    /// Serializes `variables` into a JSON object. `null` clears them.
    pub fn variables<T>(mut self, variables: &T) -> crate::Result<Self>
    where
        T: Serialize + ?Sized,
    {
        let value =
            serde_json::to_value(variables).map_err(|source| Error::SerializeJson { source })?;
        self.variables = match value {
            Value::Null => None,
            Value::Object(map) => Some(map),
            _ => {
                return Err(Error::SerializeJson {
                    source: serde::ser::Error::custom("graphql variables must be a json object"),
                });
            }
        };
        Ok(self)
    }

    pub fn variables_map(mut self, variables: Map<String, Value>) -> Self {
        self.variables = Some(variables);
        self
    }

    pub fn idempotency_key(mut self, idempotency_key: impl Into<String>) -> Self {
        self.options = self.options.with_idempotency_key(idempotency_key);
        self
    }

    pub fn generated_idempotency_key(self) -> Self {
        self.idempotency_key(generate_idempotency_key())
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.with_timeout(timeout);
        self
    }

    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.options = self.options.with_connect_timeout(connect_timeout);
        self
    }

    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.options = self.options.with_max_retries(max_retries);
        self
    }

    pub fn build(self) -> GraphqlRequest {
        GraphqlRequest::new(self.query, self.operation_name, self.variables, self.options)
    }

    pub fn send(self) -> crate::Result<Response> {
        let client = self.client;
        client.execute(&self.build())
    }

    pub fn send_json<T>(self) -> crate::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.send()?.json()
    }
}

/// A fresh UUID v4, suitable as an idempotency key for mutations.
pub fn generate_idempotency_key() -> String {
    uuid::Uuid::new_v4().to_string()
}
