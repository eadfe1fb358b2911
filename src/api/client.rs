use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use yansi::Paint;

use crate::error::CloudError;
use crate::models::Provider;

static SILENT: AtomicBool = AtomicBool::new(false);

pub fn set_silent(silent: bool) {
    SILENT.store(silent, Ordering::Relaxed);
}

fn log_output(msg: String) {
    if !SILENT.load(Ordering::Relaxed) {
        println!("{}", msg);
    }
}

/// Proxmox wraps every response body in a `data` envelope.
#[derive(Deserialize)]
struct ResponseBase<T> {
    data: T,
}

/// HTTP client for one Proxmox VE API endpoint.
/// Handles authentication, request building, and error responses.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    auth_header: String,
}

impl ApiClient {
    pub fn new(provider: &Provider) -> Result<Self, CloudError> {
        Self::from_parts(
            provider.api_base_url(),
            provider.auth_header(),
            provider.verify_ssl,
        )
    }

    /// Build a client from a raw base URL and a pre-formatted
    /// `Authorization` header value.
    pub fn from_parts(
        base_url: String,
        auth_header: String,
        verify_ssl: bool,
    ) -> Result<Self, CloudError> {
        let client = reqwest::Client::builder()
            .user_agent(format!("pvec/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .danger_accept_invalid_certs(!verify_ssl)
            .build()
            .map_err(|e| CloudError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header,
        })
    }

    /// Perform an API call and unwrap the `data` envelope.
    ///
    /// GET parameters go to the query string; for every other method they
    /// are form-encoded into the body, which is what the API expects.
    pub async fn query<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: Option<&Map<String, Value>>,
    ) -> Result<T, CloudError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let pairs = params.map(params_to_form).unwrap_or_default();
        self.log_request(&method, &url, &pairs);

        let mut req = self
            .client
            .request(method.clone(), &url)
            .header(AUTHORIZATION, &self.auth_header);
        if !pairs.is_empty() {
            req = if method == Method::GET {
                req.query(&pairs)
            } else {
                req.form(&pairs)
            };
        }

        let response = req
            .send()
            .await
            .map_err(|e| CloudError::Network(format!("Request failed: {e}")))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CloudError::Network(e.to_string()))?;

        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("Unknown").to_string();
            tracing::error!(status = status.as_u16(), body = %text, "Proxmox API request failed");
            log_output(format!(
                "Response:\n{}",
                Paint::new(format!("HTTP {}: {}", status, text)).fg(yansi::Color::Red)
            ));
            return Err(CloudError::Api {
                status: status.as_u16(),
                reason,
                body: text,
            });
        }

        // Grayed out color (dimmed/dark gray) for the response echo
        log_output(format!(
            "Response:\n{}",
            Paint::new(&text).rgb(100, 100, 100)
        ));

        let parsed: ResponseBase<T> = serde_json::from_str(&text).map_err(|e| CloudError::Api {
            status: status.as_u16(),
            reason: "Unexpected response shape".to_string(),
            body: format!("{e}: {text}"),
        })?;
        Ok(parsed.data)
    }

    // Curl-style echo of the outgoing request
    fn log_request(&self, method: &Method, url: &str, pairs: &[(String, String)]) {
        let mut url_for_log = url.to_string();
        if *method == Method::GET && !pairs.is_empty() {
            let query_string = pairs
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<String>>()
                .join("&");
            url_for_log = format!("{}?{}", url_for_log, query_string);
        }

        let mut parts = Vec::new();
        parts.push(Paint::new("curl").fg(yansi::Color::Green).bold().to_string());
        parts.push(format!(
            "-X {}",
            Paint::new(method.as_str()).fg(yansi::Color::Yellow).bold()
        ));
        parts.push(format!("'{}'", Paint::new(&url_for_log).fg(yansi::Color::Cyan)));
        parts.push(format!(
            "{} {}",
            Paint::new("-H").fg(yansi::Color::Magenta),
            Paint::new(format!(
                "'Authorization: {}'",
                redact_token(&self.auth_header)
            ))
            .fg(yansi::Color::Magenta)
        ));
        if *method != Method::GET {
            for (k, v) in pairs {
                parts.push(format!(
                    "{} {}",
                    Paint::new("-d").fg(yansi::Color::Blue),
                    Paint::new(format!("'{}={}'", k, v)).fg(yansi::Color::White)
                ));
            }
        }
        log_output(format!("Request:\n{}", parts.join(" ")));
    }
}

/// Flatten an API parameter map into form pairs. Booleans become `1`/`0`,
/// which is what the API expects on the wire.
pub fn params_to_form(params: &Map<String, Value>) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(key, value)| (key.clone(), form_value(value)))
        .collect()
}

fn form_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Keep the secret out of the request echo.
fn redact_token(auth_header: &str) -> String {
    match auth_header.rsplit_once('=') {
        Some((prefix, _)) => format!("{}=***", prefix),
        None => auth_header.to_string(),
    }
}
