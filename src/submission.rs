//! # API Submission Module
//!
//! Sends the reviewed form to the user's endpoint as JSON and checks
//! whether an endpoint is reachable.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Url};
use std::time::{Duration, Instant};
use tracing::{info, warn, Instrument};

use crate::errors::error_logging;
use crate::field_extraction::FieldSet;
use crate::observability;
use crate::session::ApiConfig;

/// Fixed timeout for the connection test; form submission has none
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors from submitting or probing an endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitError {
    /// Missing or unusable endpoint URL
    InvalidConfig(String),
    /// The server answered with a status other than 200/201
    Status { status: u16, body: String },
    /// Connection, DNS, TLS or timeout failure
    Network(String),
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitError::InvalidConfig(msg) => write!(f, "Invalid API configuration: {}", msg),
            SubmitError::Status { status, body } => {
                write!(f, "API returned status {}: {}", status, body)
            }
            SubmitError::Network(msg) => write!(f, "Request failed: {}", msg),
        }
    }
}

impl std::error::Error for SubmitError {}

impl From<reqwest::Error> for SubmitError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SubmitError::Network(format!("request timed out: {}", err))
        } else {
            SubmitError::Network(err.to_string())
        }
    }
}

/// Result of parsing the user's header JSON
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderParseOutcome {
    /// Header name/value pairs, sorted by name
    pub headers: Vec<(String, String)>,
    /// Set when the JSON could not be used and the default was substituted
    pub warning: Option<String>,
}

impl HeaderParseOutcome {
    fn fallback(warning: String) -> Self {
        warn!(warning = %warning, "Falling back to default API headers");
        Self {
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            warning: Some(warning),
        }
    }
}

/// Parse header JSON such as `{"Content-Type": "application/json", "X-Tenant": 7}`.
///
/// String values are used as-is; numbers and booleans are converted to their
/// JSON text. Nulls, arrays and nested objects are skipped. Malformed JSON or
/// a top-level value that is not an object yields the default
/// `Content-Type: application/json` header plus a warning. This never fails.
pub fn parse_headers(json: &str) -> HeaderParseOutcome {
    let value: serde_json::Value = match serde_json::from_str(json) {
        Ok(value) => value,
        Err(e) => return HeaderParseOutcome::fallback(format!("invalid header JSON: {}", e)),
    };

    let serde_json::Value::Object(map) = value else {
        return HeaderParseOutcome::fallback("header JSON must be an object".to_string());
    };

    let headers = map
        .into_iter()
        .filter_map(|(name, value)| match value {
            serde_json::Value::String(s) => Some((name, s)),
            serde_json::Value::Number(n) => Some((name, n.to_string())),
            serde_json::Value::Bool(b) => Some((name, b.to_string())),
            other => {
                warn!(header = %name, value = %other, "Skipping header with non-scalar value");
                None
            }
        })
        .collect();

    HeaderParseOutcome {
        headers,
        warning: None,
    }
}

/// Build the request headers for `api`.
///
/// Adds `Authorization: Bearer <key>` when a non-empty key is set, replacing
/// any Authorization header from the JSON. Header names or values that HTTP
/// does not allow are dropped with a warning. Returns the map together with
/// the parse warning, if any.
pub fn build_header_map(api: &ApiConfig) -> (HeaderMap, Option<String>) {
    let outcome = parse_headers(&api.headers_json);
    let mut map = HeaderMap::new();

    for (name, value) in &outcome.headers {
        let parsed = HeaderName::from_bytes(name.as_bytes())
            .ok()
            .zip(HeaderValue::from_str(value).ok());
        match parsed {
            Some((name, value)) => {
                map.insert(name, value);
            }
            None => warn!(header = %name, "Skipping invalid HTTP header"),
        }
    }

    if let Some(key) = api.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        match HeaderValue::from_str(&format!("Bearer {}", key)) {
            Ok(value) => {
                map.insert(AUTHORIZATION, value);
            }
            Err(_) => warn!("API key contains characters not allowed in a header; skipping"),
        }
    }

    (map, outcome.warning)
}

/// The JSON object posted to the endpoint, keyed by the form's field names
pub fn submission_body(fields: &FieldSet) -> Result<serde_json::Value, SubmitError> {
    serde_json::to_value(fields)
        .map_err(|e| SubmitError::InvalidConfig(format!("could not encode form: {}", e)))
}

/// A successful submission
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    pub status: u16,
    pub body: String,
    pub header_warning: Option<String>,
    pub duration: Duration,
}

/// Outcome of a connection test
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub status: u16,
    pub header_warning: Option<String>,
    pub duration: Duration,
}

impl ProbeReport {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn endpoint_url(api: &ApiConfig) -> Result<Url, SubmitError> {
    let raw = api.endpoint_url.trim();
    if raw.is_empty() {
        return Err(SubmitError::InvalidConfig(
            "no endpoint URL configured".to_string(),
        ));
    }
    let url = Url::parse(raw)
        .map_err(|e| SubmitError::InvalidConfig(format!("invalid endpoint URL '{}': {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(SubmitError::InvalidConfig(format!(
            "unsupported URL scheme '{}', expected http or https",
            scheme
        ))),
    }
}

/// POST the form as JSON. Only 200 and 201 count as success.
pub async fn submit_fields(
    client: &Client,
    api: &ApiConfig,
    fields: &FieldSet,
) -> Result<SubmissionReceipt, SubmitError> {
    let url = endpoint_url(api)?;
    let span = observability::api_span("submit", url.as_str());
    perform_submission(client, api, url, fields)
        .instrument(span)
        .await
}

async fn perform_submission(
    client: &Client,
    api: &ApiConfig,
    url: Url,
    fields: &FieldSet,
) -> Result<SubmissionReceipt, SubmitError> {
    let (mut headers, header_warning) = build_header_map(api);
    headers
        .entry(CONTENT_TYPE)
        .or_insert(HeaderValue::from_static("application/json"));

    let payload = submission_body(fields)?;
    let start_time = Instant::now();
    let response = client
        .post(url.clone())
        .headers(headers)
        .json(&payload)
        .send()
        .await
        .map_err(|e| {
            let err = SubmitError::from(e);
            error_logging::log_network_error(&err, "submit_fields", Some(url.as_str()), None);
            observability::record_api_metrics("submit", "network_error", start_time.elapsed());
            err
        })?;

    let status = response.status().as_u16();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            warn!(endpoint = %url, status, error = %e, "Could not read response body");
            String::new()
        }
    };
    let duration = start_time.elapsed();

    if status == 200 || status == 201 {
        observability::record_api_metrics("submit", "success", duration);
        info!(
            endpoint = %url,
            status,
            duration_ms = duration.as_millis() as u64,
            "Form submitted"
        );
        Ok(SubmissionReceipt {
            status,
            body,
            header_warning,
            duration,
        })
    } else {
        observability::record_api_metrics("submit", "rejected", duration);
        let err = SubmitError::Status { status, body };
        error_logging::log_network_error(&err, "submit_fields", Some(url.as_str()), Some(status));
        Err(err)
    }
}

/// GET the endpoint with the configured headers and a 5 second timeout.
///
/// Any HTTP answer is a successful probe; the caller decides what the status
/// means. Only connection failures and timeouts are errors.
pub async fn probe_endpoint(client: &Client, api: &ApiConfig) -> Result<ProbeReport, SubmitError> {
    let url = endpoint_url(api)?;
    let span = observability::api_span("probe", url.as_str());

    async move {
        let (headers, header_warning) = build_header_map(api);
        let start_time = Instant::now();

        let response = client
            .get(url.clone())
            .headers(headers)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                let err = SubmitError::from(e);
                error_logging::log_network_error(&err, "probe_endpoint", Some(url.as_str()), None);
                observability::record_api_metrics("probe", "network_error", start_time.elapsed());
                err
            })?;

        let report = ProbeReport {
            status: response.status().as_u16(),
            header_warning,
            duration: start_time.elapsed(),
        };
        let outcome = if report.is_success() { "success" } else { "rejected" };
        observability::record_api_metrics("probe", outcome, report.duration);
        info!(endpoint = %url, status = report.status, "Endpoint probed");
        Ok(report)
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_headers_object() {
        let outcome = parse_headers(r#"{"X-Tenant": "acme", "X-Version": 2, "X-Debug": true}"#);
        assert!(outcome.warning.is_none());
        assert!(outcome
            .headers
            .contains(&("X-Tenant".to_string(), "acme".to_string())));
        assert!(outcome
            .headers
            .contains(&("X-Version".to_string(), "2".to_string())));
        assert!(outcome
            .headers
            .contains(&("X-Debug".to_string(), "true".to_string())));
    }

    #[test]
    fn test_parse_headers_malformed_falls_back() {
        for input in ["{not json", "", "[1, 2]", "\"text\""] {
            let outcome = parse_headers(input);
            assert_eq!(
                outcome.headers,
                vec![("Content-Type".to_string(), "application/json".to_string())],
                "input {input:?}"
            );
            assert!(outcome.warning.is_some());
        }
    }

    #[test]
    fn test_parse_headers_skips_nested_values() {
        let outcome = parse_headers(r#"{"A": null, "B": [1], "C": {"d": 1}, "E": "ok"}"#);
        assert_eq!(outcome.headers, vec![("E".to_string(), "ok".to_string())]);
        assert!(outcome.warning.is_none());
    }

    #[test]
    fn test_build_header_map_adds_bearer() {
        let api = ApiConfig {
            endpoint_url: "http://localhost".to_string(),
            api_key: Some("secret".to_string()),
            headers_json: r#"{"Authorization": "Basic x", "Bad Header": "v"}"#.to_string(),
        };
        let (map, warning) = build_header_map(&api);
        assert!(warning.is_none());
        assert_eq!(map.get(AUTHORIZATION).unwrap(), "Bearer secret");
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_build_header_map_ignores_blank_key() {
        let api = ApiConfig {
            api_key: Some("   ".to_string()),
            ..Default::default()
        };
        let (map, _) = build_header_map(&api);
        assert!(map.get(AUTHORIZATION).is_none());
        assert_eq!(map.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn test_submission_body_matches_fields() {
        let fields = FieldSet {
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            date_of_birth: "01/01/1990".to_string(),
            place_of_birth: "Springfield".to_string(),
            id_number: "AB123".to_string(),
        };
        let body = submission_body(&fields).unwrap();
        let object = body.as_object().unwrap();
        assert_eq!(object.len(), 5);
        assert_eq!(body["first_name"], "John");
        assert_eq!(body["last_name"], "Doe");
        assert_eq!(body["date_of_birth"], "01/01/1990");
        assert_eq!(body["place_of_birth"], "Springfield");
        assert_eq!(body["id_number"], "AB123");
    }

    #[test]
    fn test_endpoint_url_validation() {
        let mut api = ApiConfig::default();
        assert!(matches!(endpoint_url(&api), Err(SubmitError::InvalidConfig(_))));

        api.endpoint_url = "not a url".to_string();
        assert!(matches!(endpoint_url(&api), Err(SubmitError::InvalidConfig(_))));

        api.endpoint_url = "ftp://example.com/upload".to_string();
        assert!(matches!(endpoint_url(&api), Err(SubmitError::InvalidConfig(_))));

        api.endpoint_url = " https://example.com/api ".to_string();
        assert!(endpoint_url(&api).is_ok());
    }

    #[test]
    fn test_status_error_message() {
        let err = SubmitError::Status {
            status: 422,
            body: "missing id_number".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("422"));
        assert!(msg.contains("missing id_number"));
    }
}
