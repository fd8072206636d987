/// Error type for directory operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// Tenant, client id or secret missing
    NotConfigured(String),
    /// Token exchange failed, or the directory answered 401/403
    Auth(String),
    /// Transport error after retries
    Network(String),
    /// Non-retryable HTTP status, or 5xx after retries
    Http {
        status: u16,
        code: String,
        message: String,
    },
    /// Still 429 after retries
    RateLimited { attempts: u32 },
    /// Response body did not have the expected shape
    Parse(String),
    /// `@odata.nextLink` repeated the current page
    Pagination(String),
}

impl DirectoryError {
    /// True for a 400 from the directory (request rejected as invalid).
    pub fn is_bad_request(&self) -> bool {
        matches!(self, DirectoryError::Http { status: 400, .. })
    }
}

impl std::fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectoryError::NotConfigured(msg) => write!(f, "directory not configured: {}", msg),
            DirectoryError::Auth(msg) => write!(f, "directory auth failed: {}", msg),
            DirectoryError::Network(msg) => write!(f, "network error: {}", msg),
            DirectoryError::Http { status, code, message } if code.is_empty() => {
                write!(f, "HTTP {}: {}", status, message)
            }
            DirectoryError::Http { status, code, message } => {
                write!(f, "HTTP {}: {}: {}", status, code, message)
            }
            DirectoryError::RateLimited { attempts } => {
                write!(f, "rate limited after {} attempts", attempts)
            }
            DirectoryError::Parse(msg) => write!(f, "unexpected response: {}", msg),
            DirectoryError::Pagination(msg) => write!(f, "pagination error: {}", msg),
        }
    }
}

impl std::error::Error for DirectoryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_display_includes_code_when_present() {
        let err = DirectoryError::Http {
            status: 404,
            code: "ResourceNotFound".into(),
            message: "device not found".into(),
        };
        assert_eq!(err.to_string(), "HTTP 404: ResourceNotFound: device not found");

        let err = DirectoryError::Http {
            status: 503,
            code: String::new(),
            message: "upstream error after 3 retries".into(),
        };
        assert_eq!(err.to_string(), "HTTP 503: upstream error after 3 retries");
        assert!(!err.is_bad_request());
    }

    #[test]
    fn bad_request_detection() {
        let err = DirectoryError::Http {
            status: 400,
            code: "BadRequest".into(),
            message: "invalid displayName".into(),
        };
        assert!(err.is_bad_request());
        assert!(!DirectoryError::RateLimited { attempts: 4 }.is_bad_request());
    }
}
