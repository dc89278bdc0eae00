//! User-facing error message formatting.
//!
//! Matches on typed errors (ExploreError, PolarsError variants, io::ErrorKind) instead of
//! parsing strings.

use crate::error::ExploreError;
use polars::prelude::PolarsError;
use std::io;
use std::path::Path;

/// Short message plus full diagnostic detail, for views that show both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    pub message: String,
    pub detail: String,
}

/// Format an ExploreError, delegating wrapped library errors to their own formatters.
pub fn user_message_from_explore(err: &ExploreError) -> String {
    match err {
        ExploreError::Polars(pe) => user_message_from_polars(pe),
        ExploreError::Io(io_err) => user_message_from_io(io_err, None),
        ExploreError::Json(je) => format!("Invalid JSON at line {}: {}", je.line(), je),
        ExploreError::UnsupportedFormat(kind) => format!(
            "Unsupported file format: {}. Use CSV, TSV, TXT or JSON.",
            kind
        ),
        ExploreError::UnknownField(name) => format!(
            "Column not found: {}. Check spelling and that the column exists.",
            name
        ),
        other => other.to_string(),
    }
}

/// Format a PolarsError as a user-facing message by matching on its variant.
pub fn user_message_from_polars(err: &PolarsError) -> String {
    use polars::prelude::PolarsError as PE;

    match err {
        PE::ColumnNotFound(msg) => format!(
            "Column not found: {}. Check spelling and that the column exists.",
            msg
        ),
        PE::Duplicate(msg) => format!("Duplicate column name in the data: {}", msg),
        PE::IO { error, msg } => {
            user_message_from_io(error.as_ref(), msg.as_ref().map(|m| m.as_ref()))
        }
        PE::NoData(msg) => format!("No data: {}", msg),
        PE::SchemaMismatch(msg) => format!("Schema mismatch: {}", msg),
        PE::ShapeMismatch(msg) => format!("Row shape mismatch: {}", msg),
        PE::InvalidOperation(msg) => format!("Operation not allowed: {}", msg),
        PE::OutOfBounds(msg) => format!("Index or row out of bounds: {}", msg),
        PE::ComputeError(msg) => simplify_compute_message(msg),
        PE::Context { error, msg } => {
            let inner = user_message_from_polars(error);
            format!("{}: {}", msg, inner)
        }
        #[allow(unreachable_patterns)]
        _ => err.to_string(),
    }
}

/// Format an io::Error as a user-facing message by matching on ErrorKind.
pub fn user_message_from_io(err: &io::Error, context: Option<&str>) -> String {
    use std::io::ErrorKind;

    let base: String = match err.kind() {
        ErrorKind::NotFound => {
            let msg = err.to_string();
            // Custom NotFound errors from the loader carry their own explanation.
            if err.get_ref().is_some() {
                msg
            } else {
                "File or directory not found.".to_string()
            }
        }
        ErrorKind::PermissionDenied => "Permission denied. Check read access.".to_string(),
        ErrorKind::InvalidData | ErrorKind::InvalidInput => {
            "Invalid or corrupted data.".to_string()
        }
        ErrorKind::UnexpectedEof => "Unexpected end of file.".to_string(),
        ErrorKind::OutOfMemory => "Out of memory.".to_string(),
        ErrorKind::Other => {
            let msg = err.to_string();
            if msg.contains("Is a directory") {
                return "Path is a directory, not a file.".to_string();
            }
            return if context.is_some() {
                format!("I/O error: {}", msg)
            } else {
                msg
            };
        }
        _ => err.to_string(),
    };

    match context {
        Some(ctx) if !ctx.is_empty() => format!("{} {}", base, ctx),
        _ => base,
    }
}

/// Format a color_eyre Report by downcasting to known error types.
/// Walks the cause chain to find ExploreError, PolarsError or io::Error.
pub fn user_message_from_report(report: &color_eyre::eyre::Report, path: Option<&Path>) -> String {
    let with_path = |msg: String| match path {
        Some(p) => format!("Failed to load {}: {}", p.display(), msg),
        None => msg,
    };

    for cause in report.chain() {
        if let Some(ee) = cause.downcast_ref::<ExploreError>() {
            return with_path(user_message_from_explore(ee));
        }
        if let Some(pe) = cause.downcast_ref::<PolarsError>() {
            return with_path(user_message_from_polars(pe));
        }
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return with_path(user_message_from_io(io_err, None));
        }
    }

    // Fallback: first line of the display, without the trace
    let display = report.to_string();
    let first_line = display.lines().next().unwrap_or("An error occurred");
    with_path(first_line.trim().to_string())
}

/// Short message and the full cause chain of a report.
pub fn describe_failure(report: &color_eyre::eyre::Report, path: Option<&Path>) -> FailureReport {
    let detail = report
        .chain()
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join("\n  caused by: ");
    FailureReport {
        message: user_message_from_report(report, path),
        detail,
    }
}

/// Short message and full detail of an ExploreError.
pub fn describe_explore_error(err: &ExploreError) -> FailureReport {
    let mut detail = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        detail.push_str("\n  caused by: ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    FailureReport {
        message: user_message_from_explore(err),
        detail,
    }
}

/// Light cleanup for ComputeError messages: keep the first sentence.
fn simplify_compute_message(msg: &str) -> String {
    let first = msg.lines().next().unwrap_or(msg).trim();
    let first = first.strip_prefix("ComputeError: ").unwrap_or(first);
    first.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_eyre::eyre::{eyre, Report, WrapErr};

    #[test]
    fn test_user_message_from_io_not_found() {
        let err = io::Error::from(io::ErrorKind::NotFound);
        let msg = user_message_from_io(&err, None);
        assert!(
            msg.contains("not found"),
            "expected 'not found', got: {}",
            msg
        );
    }

    #[test]
    fn test_user_message_from_io_permission_denied() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "Permission denied");
        let msg = user_message_from_io(&err, None);
        assert!(msg.to_lowercase().contains("permission"), "got: {}", msg);
    }

    #[test]
    fn test_user_message_from_polars_column_not_found() {
        let err = PolarsError::ColumnNotFound("foo".into());
        let msg = user_message_from_polars(&err);
        assert!(msg.contains("foo"), "expected 'foo', got: {}", msg);
        assert!(msg.contains("Column not found"), "got: {}", msg);
    }

    #[test]
    fn test_report_downcasts_explore_error() {
        let report = Report::new(ExploreError::UnsupportedFormat("application/pdf".into()))
            .wrap_err("loading table");
        let msg = user_message_from_report(&report, Some(Path::new("doc.pdf")));
        assert!(msg.starts_with("Failed to load doc.pdf"), "got: {}", msg);
        assert!(msg.contains("application/pdf"), "got: {}", msg);
    }

    #[test]
    fn test_report_fallback_first_line() {
        let report = eyre!("first line\nsecond line");
        assert_eq!(user_message_from_report(&report, None), "first line");
    }

    #[test]
    fn test_describe_failure_keeps_chain() {
        let report = Report::new(ExploreError::UnknownField("x".into())).wrap_err("building chart");
        let failure = describe_failure(&report, None);
        assert!(failure.message.contains("Column not found: x"));
        assert!(failure.detail.starts_with("building chart"));
        assert!(failure.detail.contains("caused by: Unknown field"));
    }

    #[test]
    fn test_describe_explore_error() {
        let failure = describe_explore_error(&ExploreError::EmptyPositiveDomain);
        assert_eq!(failure.message, failure.detail);
    }
}
