// src/sheets/google.rs
//! Google Sheets `values.get` client authenticated with a service account.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use metrics::{counter, histogram};
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use super::client::Connector;
use super::SheetSource;
use crate::config::ServiceCredential;
use crate::error::LoadError;

pub const SHEETS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";
pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";

#[derive(Debug, Deserialize)]
struct ValueRange {
    // Absent when the sheet is completely empty.
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

pub struct GoogleSheetsClient {
    http: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
    base_url: String,
}

impl std::fmt::Debug for GoogleSheetsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSheetsClient")
            .field("base_url", &self.base_url)
            .field("tokens", &"<TokenProvider>")
            .finish()
    }
}

impl GoogleSheetsClient {
    pub fn new(http: reqwest::Client, tokens: Arc<dyn TokenProvider>, base_url: String) -> Self {
        Self {
            http,
            tokens,
            base_url,
        }
    }

    fn values_url(&self, spreadsheet_id: &str, sheet: &str) -> Result<Url, LoadError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| LoadError::fetch(sheet, format!("bad base url: {e}")))?;
        let range = a1_sheet_range(sheet);
        url.path_segments_mut()
            .map_err(|_| LoadError::fetch(sheet, "base url cannot carry a path"))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", spreadsheet_id, "values", range.as_str()]);
        url.query_pairs_mut()
            .append_pair("majorDimension", "ROWS")
            .append_pair("valueRenderOption", "FORMATTED_VALUE");
        Ok(url)
    }
}

#[async_trait]
impl SheetSource for GoogleSheetsClient {
    async fn fetch_values(
        &self,
        spreadsheet_id: &str,
        sheet: &str,
    ) -> Result<Vec<Vec<String>>, LoadError> {
        let t0 = std::time::Instant::now();
        let url = self.values_url(spreadsheet_id, sheet)?;

        let token = self
            .tokens
            .token(&[SHEETS_READONLY_SCOPE])
            .await
            .map_err(|e| LoadError::auth(format!("access token: {e}")))?;

        let resp = self
            .http
            .get(url)
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|e| {
                let what = if e.is_timeout() { "timed out" } else { "request failed" };
                LoadError::fetch(sheet, format!("{what}: {e}"))
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let body: String = body.chars().take(300).collect();
            return Err(match status {
                StatusCode::UNAUTHORIZED => {
                    LoadError::auth(format!("sheets api rejected credential: {body}"))
                }
                _ => LoadError::fetch(sheet, format!("sheets api {status}: {body}")),
            });
        }

        let range: ValueRange = resp
            .json()
            .await
            .map_err(|e| LoadError::fetch(sheet, format!("decoding response: {e}")))?;

        let grid = range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect();

        histogram!("dashboard_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        counter!("dashboard_fetch_total").increment(1);
        Ok(grid)
    }

    fn name(&self) -> &'static str {
        "google-sheets"
    }
}

/// A1 range selecting a whole sheet: the quoted sheet name.
fn a1_sheet_range(sheet: &str) -> String {
    format!("'{}'", sheet.replace('\'', "''"))
}

fn cell_to_string(v: serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Builds [`GoogleSheetsClient`]s from a service-account key.
pub struct ServiceAccountConnector {
    credential: Option<ServiceCredential>,
    timeout: Duration,
}

impl ServiceAccountConnector {
    pub fn new(credential: Option<ServiceCredential>, timeout: Duration) -> Self {
        Self {
            credential,
            timeout,
        }
    }
}

#[async_trait]
impl Connector for ServiceAccountConnector {
    async fn connect(&self) -> Result<Arc<dyn SheetSource>, LoadError> {
        let credential = self.credential.as_ref().ok_or_else(|| {
            LoadError::auth(format!(
                "missing '{}' service account credential",
                crate::config::credential::ENV_SERVICE_ACCOUNT
            ))
        })?;

        let account = CustomServiceAccount::from_json(credential.as_json())
            .map_err(|e| LoadError::auth(format!("malformed service account key: {e}")))?;
        let tokens: Arc<dyn TokenProvider> = Arc::new(account);

        // Fail here, not on the first sheet, when the key has been revoked.
        tokens
            .token(&[SHEETS_READONLY_SCOPE])
            .await
            .map_err(|e| LoadError::auth(format!("token exchange rejected: {e}")))?;

        let http = reqwest::Client::builder()
            .user_agent("production-dashboard/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(self.timeout)
            .build()
            .map_err(|e| LoadError::auth(format!("building http client: {e}")))?;

        Ok(Arc::new(GoogleSheetsClient::new(
            http,
            tokens,
            DEFAULT_SHEETS_BASE_URL.to_string(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoTokens;

    #[async_trait]
    impl TokenProvider for NoTokens {
        async fn token(&self, _scopes: &[&str]) -> Result<Arc<gcp_auth::Token>, gcp_auth::Error> {
            unreachable!("not called in url tests")
        }
        async fn project_id(&self) -> Result<Arc<str>, gcp_auth::Error> {
            unreachable!("not called in url tests")
        }
    }

    fn client() -> GoogleSheetsClient {
        GoogleSheetsClient::new(
            reqwest::Client::new(),
            Arc::new(NoTokens),
            DEFAULT_SHEETS_BASE_URL.to_string(),
        )
    }

    #[test]
    fn values_url_quotes_and_encodes_sheet_name() {
        let url = client().values_url("sheet123", "Recent Scanned").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet123/values/'Recent%20Scanned'?majorDimension=ROWS&valueRenderOption=FORMATTED_VALUE"
        );
    }

    #[test]
    fn a1_range_escapes_single_quotes() {
        assert_eq!(a1_sheet_range("Bob's"), "'Bob''s'");
    }

    #[test]
    fn cells_are_stringified() {
        assert_eq!(cell_to_string(serde_json::json!("12%")), "12%");
        assert_eq!(cell_to_string(serde_json::json!(12)), "12");
        assert_eq!(cell_to_string(serde_json::Value::Null), "");
    }

    #[tokio::test]
    async fn missing_credential_is_auth_error() {
        let c = ServiceAccountConnector::new(None, Duration::from_secs(1));
        let err = c.connect().await.err().unwrap();
        assert_eq!(err.kind(), "auth");
    }

    #[tokio::test]
    async fn malformed_credential_is_auth_error() {
        let cred = ServiceCredential::new("{not json").unwrap();
        let c = ServiceAccountConnector::new(Some(cred), Duration::from_secs(1));
        let err = c.connect().await.err().unwrap();
        assert!(matches!(err, LoadError::Auth { .. }), "{err}");
    }

    // ---- values.get against a local stub of the Sheets API ----

    use axum::{
        extract::Path,
        http::{header::AUTHORIZATION, HeaderMap},
        response::{IntoResponse, Response},
        routing::get,
        Json, Router,
    };

    struct FixedToken(Arc<gcp_auth::Token>);

    impl FixedToken {
        fn new(access_token: &str) -> Self {
            let token = serde_json::from_value(serde_json::json!({
                "access_token": access_token,
                "expires_in": 3600,
            }))
            .expect("token json");
            Self(Arc::new(token))
        }
    }

    #[async_trait]
    impl TokenProvider for FixedToken {
        async fn token(&self, _scopes: &[&str]) -> Result<Arc<gcp_auth::Token>, gcp_auth::Error> {
            Ok(Arc::clone(&self.0))
        }
        async fn project_id(&self) -> Result<Arc<str>, gcp_auth::Error> {
            Ok(Arc::from("test-project"))
        }
    }

    async fn values_stub(Path((id, range)): Path<(String, String)>, headers: HeaderMap) -> Response {
        let bearer = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        if bearer != Some("Bearer test-token") {
            return (StatusCode::UNAUTHORIZED, "Request had invalid authentication credentials.")
                .into_response();
        }
        match id.as_str() {
            "denied" => (StatusCode::FORBIDDEN, "x".repeat(1000)).into_response(),
            "missing" => (StatusCode::NOT_FOUND, "Requested entity was not found.").into_response(),
            "empty" => Json(serde_json::json!({ "range": range })).into_response(),
            "slow" => {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(serde_json::json!({})).into_response()
            }
            _ => Json(serde_json::json!({
                "range": range,
                "majorDimension": "ROWS",
                "values": [["Area", "Line", "Planning"], ["Line-1", "Building", 100], ["Line-2"]],
            }))
            .into_response(),
        }
    }

    async fn stub_client(token: &str, timeout: Duration) -> GoogleSheetsClient {
        let app = Router::new().route("/v4/spreadsheets/{id}/values/{range}", get(values_stub));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub");
        let addr = listener.local_addr().expect("stub addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("http client");
        GoogleSheetsClient::new(http, Arc::new(FixedToken::new(token)), format!("http://{addr}"))
    }

    #[tokio::test]
    async fn fetch_returns_grid_of_strings() {
        let c = stub_client("test-token", Duration::from_secs(5)).await;
        let grid = c.fetch_values("sheet123", "Calculation").await.unwrap();
        assert_eq!(
            grid,
            vec![
                vec!["Area", "Line", "Planning"],
                vec!["Line-1", "Building", "100"],
                vec!["Line-2"],
            ]
        );
    }

    #[tokio::test]
    async fn missing_values_field_is_empty_grid() {
        let c = stub_client("test-token", Duration::from_secs(5)).await;
        let grid = c.fetch_values("empty", "Calculation").await.unwrap();
        assert!(grid.is_empty());
    }

    #[tokio::test]
    async fn unauthorized_is_auth_error() {
        let c = stub_client("revoked-token", Duration::from_secs(5)).await;
        let err = c.fetch_values("sheet123", "Calculation").await.unwrap_err();
        assert!(matches!(err, LoadError::Auth { .. }), "{err}");
    }

    #[tokio::test]
    async fn other_statuses_are_fetch_errors_with_truncated_body() {
        let c = stub_client("test-token", Duration::from_secs(5)).await;

        let err = c.fetch_values("missing", "Recent Scanned").await.unwrap_err();
        match &err {
            LoadError::Fetch { sheet, message } => {
                assert_eq!(sheet, "Recent Scanned");
                assert!(message.contains("404"), "{message}");
            }
            other => panic!("expected fetch error, got {other:?}"),
        }

        let err = c.fetch_values("denied", "Calculation").await.unwrap_err();
        let LoadError::Fetch { message, .. } = err else {
            panic!("expected fetch error");
        };
        assert!(message.contains("403"), "{message}");
        assert!(message.matches('x').count() <= 300);
    }

    #[tokio::test]
    async fn timeout_is_fetch_error() {
        let c = stub_client("test-token", Duration::from_millis(200)).await;
        let err = c.fetch_values("slow", "Calculation").await.unwrap_err();
        match &err {
            LoadError::Fetch { message, .. } => assert!(message.contains("timed out"), "{message}"),
            other => panic!("expected fetch error, got {other:?}"),
        }
    }
}
