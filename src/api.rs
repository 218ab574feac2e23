// API client module: a small blocking HTTP client for the MoltPhone API.
//
// The wire is hidden behind `Transport` so the client logic (endpoint
// choice, auth, timeouts, status handling) can be exercised without a
// network. `HttpTransport` is the real implementation over reqwest.

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{AssistantOverrides, CallDefaults, ClientConfig};
use crate::error::ClientError;
use crate::model::{
    Balance, CallDetails, CallRequest, CallResult, CallSummary, EndedCall, Health,
    TranscriptEntry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One outbound request, described independently of the HTTP library.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub bearer: Option<String>,
    pub timeout: Duration,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>, timeout: Duration) -> Self {
        ApiRequest {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer: None,
            timeout,
        }
    }

    fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    fn bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_string());
        self
    }
}

/// Status code plus decoded body. A body that is not JSON is kept as a
/// JSON string; an empty body is `Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body of a 2xx response, or an `Api` error carrying status and body.
    pub fn into_success(self) -> Result<Value, ClientError> {
        if self.is_success() {
            Ok(self.body)
        } else {
            warn!(status = self.status, "API returned an error status");
            Err(ClientError::Api {
                status: self.status,
                body: self.body,
            })
        }
    }
}

/// Sends one request and waits for its response. Transport failures
/// (connect, DNS, timeout) map to `ClientError::Unreachable`.
pub trait Transport {
    fn send(&self, base_url: &str, request: &ApiRequest) -> Result<ApiResponse, ClientError>;
}

/// Transport over a reqwest blocking client.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, ClientError> {
        let client = Client::builder()
            .user_agent(concat!("moltphone-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(HttpTransport { client })
    }

    /// Authorization header map for a bearer token.
    fn auth_headers(token: &str) -> Result<HeaderMap, ClientError> {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ClientError::InvalidCredential)?;
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }
}

impl Transport for HttpTransport {
    fn send(&self, base_url: &str, request: &ApiRequest) -> Result<ApiResponse, ClientError> {
        let url = format!("{}{}", base_url, request.path);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        }
        .timeout(request.timeout);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.headers(Self::auth_headers(token)?);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let res = builder.send()?;
        let status = res.status().as_u16();
        let text = res.text()?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        Ok(ApiResponse { status, body })
    }
}

/// MoltPhone client: holds the transport, connection settings and the
/// immutable call defaults.
pub struct ApiClient<T: Transport = HttpTransport> {
    transport: T,
    config: ClientConfig,
    defaults: CallDefaults,
}

impl ApiClient<HttpTransport> {
    /// Client over HTTP, configured from `ClientConfig`.
    pub fn http(config: ClientConfig, defaults: CallDefaults) -> Result<Self, ClientError> {
        Ok(ApiClient::new(HttpTransport::new()?, config, defaults))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, config: ClientConfig, defaults: CallDefaults) -> Self {
        ApiClient {
            transport,
            config,
            defaults,
        }
    }

    pub fn defaults(&self) -> &CallDefaults {
        &self.defaults
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Store an API key for subsequent authenticated requests.
    pub fn set_api_key(&mut self, key: &str) {
        let config = self.config.clone().with_api_key(Some(key.to_string()));
        self.config = config;
    }

    pub fn has_api_key(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str, ClientError> {
        self.config
            .api_key
            .as_deref()
            .ok_or(ClientError::MissingCredential)
    }

    fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        debug!(
            method = ?request.method,
            path = %request.path,
            timeout_secs = request.timeout.as_secs(),
            authenticated = request.bearer.is_some(),
            "sending request"
        );
        let response = self.transport.send(&self.config.base_url, &request)?;
        debug!(status = response.status, "received response");
        Ok(response)
    }

    /// Authenticated GET returning the 2xx body.
    fn get(&self, path: String, query: &[(&str, String)]) -> Result<Value, ClientError> {
        let key = self.api_key()?;
        let mut request = ApiRequest::new(Method::Get, path, self.config.read_timeout).bearer(key);
        for (name, value) in query {
            request = request.query(name, value);
        }
        self.send(request)?.into_success()
    }

    /// Build a request for `to_number`, in authenticated mode when a key is
    /// configured and webapp mode otherwise.
    pub fn call_request(
        &self,
        to_number: &str,
        overrides: &AssistantOverrides,
        task: Option<&str>,
        agent_name: Option<&str>,
    ) -> CallRequest {
        CallRequest::select(
            to_number,
            self.has_api_key(),
            &self.defaults,
            overrides,
            task,
            agent_name,
        )
    }

    pub fn health(&self) -> Result<Health, ClientError> {
        let request = ApiRequest::new(Method::Get, "/health", self.config.read_timeout);
        let response = self.send(request)?;
        Ok(Health::from_response(response.status, &response.body))
    }

    /// Place a call. Authenticated requests need an API key.
    pub fn place_call(&self, call: &CallRequest) -> Result<CallResult, ClientError> {
        let mut request = ApiRequest::new(Method::Post, call.path(), self.config.call_timeout)
            .json(call.payload());
        if call.is_authenticated() {
            request = request.bearer(self.api_key()?);
        }
        let body = self.send(request)?.into_success()?;
        Ok(CallResult::from_response(&body))
    }

    pub fn list_calls(&self, query: &ListQuery) -> Result<Vec<CallSummary>, ClientError> {
        let mut params = vec![("limit", query.limit.to_string())];
        if let Some(status) = &query.status {
            params.push(("status", status.clone()));
        }
        if let Some(offset) = query.offset {
            params.push(("offset", offset.to_string()));
        }
        let body = self.get("/calls".to_string(), &params)?;
        Ok(CallSummary::list_from_response(&body))
    }

    pub fn call_details(&self, call_id: &str) -> Result<CallDetails, ClientError> {
        let body = self.get(format!("/calls/{}", call_segment(call_id)?), &[])?;
        Ok(CallDetails::from_response(&body))
    }

    pub fn transcript(&self, call_id: &str) -> Result<Vec<TranscriptEntry>, ClientError> {
        let body = self.get(
            format!("/calls/{}/transcript", call_segment(call_id)?),
            &[],
        )?;
        Ok(TranscriptEntry::list_from_response(&body))
    }

    pub fn end_call(&self, call_id: &str) -> Result<EndedCall, ClientError> {
        let key = self.api_key()?;
        let request = ApiRequest::new(
            Method::Post,
            format!("/call/end/{}", call_segment(call_id)?),
            self.config.read_timeout,
        )
        .bearer(key);
        let body = self.send(request)?.into_success()?;
        Ok(EndedCall::from_response(&body))
    }

    pub fn balance(&self) -> Result<Balance, ClientError> {
        let body = self.get("/tokens/balance".to_string(), &[])?;
        Ok(Balance::from_response(&body))
    }
}

/// A call id as exactly one percent-encoded path segment, so `/`, `?` and
/// `#` in user input cannot reach another endpoint.
fn call_segment(call_id: &str) -> Result<String, ClientError> {
    let id = call_id.trim();
    if id.is_empty() || id == "." || id == ".." {
        return Err(ClientError::InvalidCallId(call_id.to_string()));
    }
    Ok(urlencoding::encode(id).into_owned())
}

/// Filters for `GET /calls`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub limit: u32,
    pub status: Option<String>,
    pub offset: Option<u32>,
}

impl Default for ListQuery {
    fn default() -> Self {
        ListQuery {
            limit: 5,
            status: None,
            offset: None,
        }
    }
}

impl ListQuery {
    /// The single most recent call.
    pub fn latest() -> Self {
        ListQuery {
            limit: 1,
            ..Default::default()
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{client, FakeTransport};
    use super::*;
    use serde_json::json;

    #[test]
    fn authenticated_call_sends_bearer_and_call_timeout() {
        let api = client(
            FakeTransport::default().reply(201, json!({"call": {"id": "c_1"}})),
            Some("mp_key"),
        );
        let call = api.call_request("+15551234567", &AssistantOverrides::default(), None, None);

        let result = api.place_call(&call).unwrap();

        assert_eq!(result.call_id.as_deref(), Some("c_1"));
        let sent = api.transport().sent.borrow();
        assert_eq!(sent[0].method, Method::Post);
        assert_eq!(sent[0].path, "/call");
        assert_eq!(sent[0].bearer.as_deref(), Some("mp_key"));
        assert_eq!(sent[0].timeout, Duration::from_secs(30));
    }

    #[test]
    fn webapp_call_is_anonymous() {
        let api = client(
            FakeTransport::default().reply(200, json!({"callId": "w_1", "mode": "webapp"})),
            None,
        );
        let call = api.call_request("+15551234567", &AssistantOverrides::default(), None, None);

        api.place_call(&call).unwrap();

        let sent = api.transport().sent.borrow();
        assert_eq!(sent[0].path, "/call/webapp");
        assert!(sent[0].bearer.is_none());
        assert_eq!(sent[0].body.as_ref().unwrap()["phoneNumber"], "+15551234567");
    }

    #[test]
    fn error_status_is_not_parsed_as_success() {
        let body = json!({"error": "Validation failed", "call": {"id": "should-not-be-read"}});
        let api = client(FakeTransport::default().reply(422, body.clone()), Some("k"));
        let call = api.call_request("bad", &AssistantOverrides::default(), None, None);

        match api.place_call(&call) {
            Err(ClientError::Api { status, body: got }) => {
                assert_eq!(status, 422);
                assert_eq!(got, body);
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[test]
    fn reads_require_a_key_and_send_nothing_without_one() {
        let api = client(FakeTransport::default(), None);

        assert!(matches!(
            api.list_calls(&ListQuery::default()),
            Err(ClientError::MissingCredential)
        ));
        assert!(matches!(api.balance(), Err(ClientError::MissingCredential)));
        assert!(api.transport().sent.borrow().is_empty());
    }

    #[test]
    fn list_calls_passes_filters_as_query() {
        let api = client(FakeTransport::default().reply(200, json!({"calls": []})), Some("k"));
        let query = ListQuery {
            limit: 20,
            status: Some("completed".into()),
            offset: Some(40),
        };

        api.list_calls(&query).unwrap();

        let sent = api.transport().sent.borrow();
        assert_eq!(
            sent[0].query,
            vec![
                ("limit".to_string(), "20".to_string()),
                ("status".to_string(), "completed".to_string()),
                ("offset".to_string(), "40".to_string()),
            ]
        );
        assert_eq!(sent[0].timeout, Duration::from_secs(10));
    }

    #[test]
    fn health_keeps_fields_of_error_status() {
        let api = client(
            FakeTransport::default().reply(503, json!({"status": "not_ready", "service": "moltphone"})),
            None,
        );
        let health = api.health().unwrap();
        assert!(!health.is_up());
        assert_eq!(health.status.as_deref(), Some("not_ready"));
        assert!(api.transport().sent.borrow()[0].bearer.is_none());
    }

    #[test]
    fn end_call_posts_to_end_path() {
        let api = client(
            FakeTransport::default().reply(200, json!({"message": "Call ended", "call": {"id": "c_9", "status": "cancelled"}})),
            Some("k"),
        );
        let ended = api.end_call("c_9").unwrap();
        assert_eq!(ended.status.as_deref(), Some("cancelled"));
        assert_eq!(api.transport().paths(), ["/call/end/c_9"]);
    }

    #[test]
    fn set_api_key_enables_authenticated_mode() {
        let mut api = client(FakeTransport::default(), None);
        assert!(!api
            .call_request("+1", &AssistantOverrides::default(), None, None)
            .is_authenticated());

        api.set_api_key("mp_key");
        assert!(api
            .call_request("+1", &AssistantOverrides::default(), None, None)
            .is_authenticated());
    }

    #[test]
    fn call_ids_are_encoded_as_one_segment() {
        let api = client(
            FakeTransport::default()
                .reply(200, json!({"call": {}}))
                .reply(200, json!({"transcript": []}))
                .reply(200, json!({"message": "Call ended"})),
            Some("k"),
        );

        api.call_details("x/../../tokens/balance").unwrap();
        api.transcript("abc?limit=1#frag").unwrap();
        api.end_call("c 1").unwrap();

        assert_eq!(
            api.transport().paths(),
            [
                "/calls/x%2F..%2F..%2Ftokens%2Fbalance",
                "/calls/abc%3Flimit%3D1%23frag/transcript",
                "/call/end/c%201",
            ]
        );
    }

    #[test]
    fn dot_segments_are_rejected_before_sending() {
        let api = client(FakeTransport::default(), Some("k"));

        for id in ["", ".", "..", "  "] {
            assert!(matches!(
                api.call_details(id),
                Err(ClientError::InvalidCallId(_))
            ));
        }
        assert!(api.transport().sent.borrow().is_empty());
    }
}
