//! Directory HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required). Lists Autopilot
//! device identities page by page and sets their display names.
//!
//! # Retry policy
//!
//! | Response            | Action                                          |
//! |---------------------|-------------------------------------------------|
//! | 2xx                 | success                                         |
//! | 401 / 403           | fail with `Auth` (cached token dropped)         |
//! | other 4xx except 429| fail with `Http` (OData error body parsed)      |
//! | 429                 | retry, honoring `Retry-After`                   |
//! | 5xx / transport     | retry with exponential backoff                  |
//!
//! Up to [`MAX_RETRIES`] retries, backoff starting at one second.

use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use enrollname_recon::RemoteDevice;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::auth::{Credentials, TokenProvider};
use crate::error::DirectoryError;

pub const MAX_RETRIES: u32 = 3;
pub const DEFAULT_GRAPH_ENDPOINT: &str = "https://graph.microsoft.com";
pub const DEFAULT_LOGIN_ENDPOINT: &str = "https://login.microsoftonline.com";

const USER_AGENT: &str = concat!("enrollname/", env!("CARGO_PKG_VERSION"));
const DEVICES_PATH: &str = "deviceManagement/windowsAutopilotDeviceIdentities";

/// Connection settings for one client.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub graph_endpoint: String,
    pub login_endpoint: String,
    pub api_version: String,
    pub page_size: u32,
    pub credentials: Credentials,
}

impl DirectoryConfig {
    /// Public-cloud endpoints, `beta` API, 100 devices per page.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            graph_endpoint: DEFAULT_GRAPH_ENDPOINT.to_string(),
            login_endpoint: DEFAULT_LOGIN_ENDPOINT.to_string(),
            api_version: "beta".to_string(),
            page_size: 100,
            credentials,
        }
    }
}

/// `OData` error response.
#[derive(Debug, Deserialize)]
struct ODataError {
    error: ODataErrorBody,
}

#[derive(Debug, Deserialize)]
struct ODataErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// One page of a collection response.
#[derive(Debug, Deserialize)]
struct ODataPage<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

/// Wire shape of a `windowsAutopilotDeviceIdentity`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AutopilotDeviceIdentity {
    id: String,
    serial_number: Option<String>,
    display_name: Option<String>,
    manufacturer: Option<String>,
    model: Option<String>,
    group_tag: Option<String>,
    enrollment_state: Option<String>,
    last_contacted_date_time: Option<String>,
}

impl From<AutopilotDeviceIdentity> for RemoteDevice {
    fn from(d: AutopilotDeviceIdentity) -> Self {
        RemoteDevice {
            id: d.id,
            serial_number: d.serial_number.unwrap_or_default(),
            current_name: d.display_name.unwrap_or_default(),
            manufacturer: d.manufacturer.unwrap_or_default(),
            model: d.model.unwrap_or_default(),
            group_tag: d.group_tag.unwrap_or_default(),
            enrollment_state: d.enrollment_state.unwrap_or_default(),
            last_contacted: d.last_contacted_date_time.unwrap_or_default(),
        }
    }
}

/// Directory API client (blocking).
pub struct DirectoryClient {
    http: reqwest::blocking::Client,
    api_base: String,
    page_size: u32,
    tokens: TokenProvider,
    initial_backoff: Duration,
}

impl DirectoryClient {
    pub fn new(config: DirectoryConfig) -> Result<Self, DirectoryError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DirectoryError::Network(format!("failed to build HTTP client: {}", e)))?;

        let tokens = TokenProvider::new(
            config.credentials,
            &config.login_endpoint,
            &config.graph_endpoint,
        );

        Ok(Self {
            http,
            api_base: format!(
                "{}/{}",
                config.graph_endpoint.trim_end_matches('/'),
                config.api_version.trim_matches('/')
            ),
            page_size: config.page_size.max(1),
            tokens,
            initial_backoff: Duration::from_secs(1),
        })
    }

    /// Override the first retry delay (tests use zero).
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    fn devices_url(&self) -> String {
        format!("{}/{}?$top={}", self.api_base, DEVICES_PATH, self.page_size)
    }

    /// Fetch every device identity, following `@odata.nextLink` to the end.
    pub fn fetch_all_devices(&self) -> Result<Vec<RemoteDevice>, DirectoryError> {
        let mut url = self.devices_url();
        let mut devices = Vec::new();
        let mut page_no = 1u32;
        let mut visited = HashSet::new();

        loop {
            visited.insert(url.clone());
            debug!("fetching device page {}: {}", page_no, url);
            let body = self.send_with_retry(|http, token| http.get(&url).bearer_auth(token))?;

            let page: ODataPage<AutopilotDeviceIdentity> = serde_json::from_str(&body)
                .map_err(|e| DirectoryError::Parse(format!("device page {}: {}", page_no, e)))?;

            debug!("page {} returned {} devices", page_no, page.value.len());
            devices.extend(page.value.into_iter().map(RemoteDevice::from));

            match page.next_link {
                Some(next) if visited.contains(&next) => {
                    return Err(DirectoryError::Pagination(format!(
                        "nextLink points back to an already fetched page after {} pages: {}",
                        page_no, next
                    )));
                }
                Some(next) => {
                    url = next;
                    page_no += 1;
                }
                None => break,
            }
        }

        info!("fetched {} devices in {} pages", devices.len(), page_no);
        Ok(devices)
    }

    /// Set the display name applied at the device's next enrollment.
    pub fn update_display_name(&self, device_id: &str, display_name: &str) -> Result<(), DirectoryError> {
        let url = format!(
            "{}/{}/{}/updateDeviceProperties",
            self.api_base, DEVICES_PATH, device_id
        );
        let body = serde_json::json!({ "displayName": display_name });

        self.send_with_retry(|http, token| http.post(&url).bearer_auth(token).json(&body))?;
        info!("set display name of {} to '{}'", device_id, display_name);
        Ok(())
    }

    /// Send with retry + exponential backoff; returns the response body text.
    ///
    /// `build_request` is called once per attempt with a fresh token.
    fn send_with_retry(
        &self,
        build_request: impl Fn(&reqwest::blocking::Client, &str) -> reqwest::blocking::RequestBuilder,
    ) -> Result<String, DirectoryError> {
        let mut backoff = self.initial_backoff;
        let mut attempt = 0u32;

        loop {
            let token = self.tokens.token(&self.http)?;
            let result = build_request(&self.http, &token).send();

            let wait = match result {
                Ok(resp) => {
                    let status = resp.status().as_u16();

                    if (200..300).contains(&status) {
                        return resp.text().map_err(|e| {
                            DirectoryError::Network(format!("failed to read response body: {}", e))
                        });
                    }

                    if status == 401 || status == 403 {
                        self.tokens.invalidate();
                        let (code, message) = odata_error(resp);
                        return Err(DirectoryError::Auth(join_code(status, &code, &message)));
                    }

                    if status != 429 && status < 500 {
                        let (code, message) = odata_error(resp);
                        return Err(DirectoryError::Http { status, code, message });
                    }

                    if attempt == MAX_RETRIES {
                        if status == 429 {
                            return Err(DirectoryError::RateLimited {
                                attempts: attempt + 1,
                            });
                        }
                        let (code, message) = odata_error(resp);
                        return Err(DirectoryError::Http {
                            status,
                            code,
                            message: format!("{} (after {} retries)", message, MAX_RETRIES),
                        });
                    }

                    let wait = if status == 429 {
                        retry_after(&resp).unwrap_or(backoff)
                    } else {
                        backoff
                    };
                    warn!(
                        "retry {}/{} in {:?} (HTTP {})",
                        attempt + 1,
                        MAX_RETRIES,
                        wait,
                        status
                    );
                    wait
                }
                Err(e) => {
                    if attempt == MAX_RETRIES {
                        return Err(DirectoryError::Network(format!(
                            "{} (after {} retries)",
                            e, MAX_RETRIES
                        )));
                    }
                    warn!("retry {}/{} in {:?} ({})", attempt + 1, MAX_RETRIES, backoff, e);
                    backoff
                }
            };

            thread::sleep(wait);
            backoff *= 2;
            attempt += 1;
        }
    }
}

fn retry_after(resp: &reqwest::blocking::Response) -> Option<Duration> {
    resp.headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Pull `(code, message)` out of an OData error body, falling back to the raw text.
fn odata_error(resp: reqwest::blocking::Response) -> (String, String) {
    let text = resp.text().unwrap_or_default();
    parse_odata_error(&text)
}

fn parse_odata_error(text: &str) -> (String, String) {
    match serde_json::from_str::<ODataError>(text) {
        Ok(err) => (err.error.code, err.error.message),
        Err(_) => {
            let trimmed = text.trim();
            let message = if trimmed.is_empty() {
                "empty response body".to_string()
            } else {
                trimmed.chars().take(200).collect()
            };
            (String::new(), message)
        }
    }
}

fn join_code(status: u16, code: &str, message: &str) -> String {
    if code.is_empty() {
        format!("HTTP {}: {}", status, message)
    } else {
        format!("HTTP {}: {}: {}", status, code, message)
    }
}
