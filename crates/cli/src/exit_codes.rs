//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract. Scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success (run completed)                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, bad output)   |
//! | 3       | Universal        | I/O error (read input, write report)     |
//! | 60-69   | directives       | Directive file validation and outcomes   |
//! | 70-79   | directory        | Remote directory connection and requests |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use enrollname_directory::DirectoryError;
use enrollname_recon::ReconError;

// =============================================================================
// Universal (0-3)
// =============================================================================

/// Success - command completed. Per-device failures in `apply` still exit 0
/// unless `--strict` is given.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unusable output location.
pub const EXIT_USAGE: u8 = 2;

/// I/O error - cannot read the directive file or write the report.
pub const EXIT_IO: u8 = 3;

// =============================================================================
// Directives (60-69)
// =============================================================================

/// Directive file invalid (missing column, no usable rows, malformed CSV).
pub const EXIT_INPUT_INVALID: u8 = 60;

/// Duplicate desired names found (`validate` only; `apply` reports them per row).
pub const EXIT_INPUT_DUPLICATES: u8 = 61;

/// Partial apply (`--strict` and at least one update failed).
pub const EXIT_PARTIAL_APPLY: u8 = 62;

// =============================================================================
// Directory (70-79)
// =============================================================================

/// Tenant, client id or client secret missing.
pub const EXIT_DIRECTORY_NOT_CONFIGURED: u8 = 70;

/// Auth rejected (token exchange failed, or 401/403).
pub const EXIT_DIRECTORY_AUTH: u8 = 71;

/// Request rejected by the directory (400).
pub const EXIT_DIRECTORY_VALIDATION: u8 = 72;

/// Rate limited after retries (429).
pub const EXIT_DIRECTORY_RATE_LIMIT: u8 = 73;

/// Upstream error (other 4xx, 5xx, bad response) or network failure after retries.
pub const EXIT_DIRECTORY_UPSTREAM: u8 = 74;

// =============================================================================
// Error mapping
// =============================================================================

/// Map a directive/report error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::MissingColumn { .. } | ReconError::NoDirectives { .. } | ReconError::Csv { .. } => {
            EXIT_INPUT_INVALID
        }
        ReconError::InvalidOutput(_) => EXIT_USAGE,
        ReconError::Write { .. } | ReconError::Io(_) => EXIT_IO,
    }
}

/// Map a directory error to its exit code.
pub fn directory_exit_code(err: &DirectoryError) -> u8 {
    match err {
        DirectoryError::NotConfigured(_) => EXIT_DIRECTORY_NOT_CONFIGURED,
        DirectoryError::Auth(_) => EXIT_DIRECTORY_AUTH,
        DirectoryError::RateLimited { .. } => EXIT_DIRECTORY_RATE_LIMIT,
        e if e.is_bad_request() => EXIT_DIRECTORY_VALIDATION,
        DirectoryError::Http { .. }
        | DirectoryError::Network(_)
        | DirectoryError::Parse(_)
        | DirectoryError::Pagination(_) => EXIT_DIRECTORY_UPSTREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_unique() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_IO,
            EXIT_INPUT_INVALID,
            EXIT_INPUT_DUPLICATES,
            EXIT_PARTIAL_APPLY,
            EXIT_DIRECTORY_NOT_CONFIGURED,
            EXIT_DIRECTORY_AUTH,
            EXIT_DIRECTORY_VALIDATION,
            EXIT_DIRECTORY_RATE_LIMIT,
            EXIT_DIRECTORY_UPSTREAM,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn directory_errors_map_by_kind() {
        let bad_request = DirectoryError::Http {
            status: 400,
            code: "BadRequest".into(),
            message: "nope".into(),
        };
        let not_found = DirectoryError::Http {
            status: 404,
            code: String::new(),
            message: "gone".into(),
        };
        assert_eq!(directory_exit_code(&bad_request), EXIT_DIRECTORY_VALIDATION);
        assert_eq!(directory_exit_code(&not_found), EXIT_DIRECTORY_UPSTREAM);
        assert_eq!(
            directory_exit_code(&DirectoryError::Auth("x".into())),
            EXIT_DIRECTORY_AUTH
        );
        assert_eq!(
            directory_exit_code(&DirectoryError::RateLimited { attempts: 4 }),
            EXIT_DIRECTORY_RATE_LIMIT
        );
        assert_eq!(
            directory_exit_code(&DirectoryError::NotConfigured("x".into())),
            EXIT_DIRECTORY_NOT_CONFIGURED
        );
    }

    #[test]
    fn recon_errors_map_by_kind() {
        let err = ReconError::NoDirectives { input: "in.csv".into() };
        assert_eq!(recon_exit_code(&err), EXIT_INPUT_INVALID);
        assert_eq!(recon_exit_code(&ReconError::InvalidOutput("x".into())), EXIT_USAGE);
        assert_eq!(recon_exit_code(&ReconError::Io("x".into())), EXIT_IO);
    }
}
