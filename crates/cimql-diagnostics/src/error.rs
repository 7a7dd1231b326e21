//! Query error types

use crate::{ErrorCode, ErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Error - the query or the candidate cannot be evaluated
    Error,
    /// Warning - evaluation continued past the problem
    Warning,
    /// Information - informational message
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A diagnostic message with context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional context or help
    pub help: Option<String>,
    /// Related notes, e.g. the predicate text being evaluated
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            help: None,
            notes: Vec::new(),
        }
    }

    /// Create a new warning diagnostic
    pub fn warning(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            help: None,
            notes: Vec::new(),
        }
    }

    /// Set help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Add a note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Render for a terminal, with colors
    #[cfg(feature = "colored")]
    pub fn render_colored(&self) -> String {
        use colored::Colorize;

        let severity = match self.severity {
            Severity::Error => self.severity.to_string().red().bold(),
            Severity::Warning => self.severity.to_string().yellow().bold(),
            Severity::Info => self.severity.to_string().blue().bold(),
        };
        let mut out = format!("{}[{}]: {}", severity, self.code, self.message);
        for note in &self.notes {
            out.push_str(&format!("\n  {} {}", "note:".cyan(), note));
        }
        if let Some(help) = &self.help {
            out.push_str(&format!("\n  {} {}", "help:".green(), help));
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.severity, self.code, self.message)?;
        for note in &self.notes {
            write!(f, "\n  note: {}", note)?;
        }
        if let Some(help) = &self.help {
            write!(f, "\n  help: {}", help)?;
        }
        Ok(())
    }
}

/// Main query error type
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    /// Malformed query (scoping, identifier shape, unsupported function)
    #[error("{code}: {message}")]
    Syntax {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },

    /// Evaluation failure against one candidate
    #[error("{code}: {message}")]
    Runtime {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },

    /// Referenced property or class does not exist
    #[error("{code}: {message}")]
    NotFound {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },

    /// System error
    #[error("{code}: {message}")]
    System {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },

    /// Multiple errors collected
    #[error("Multiple errors: {}", .0.len())]
    Multiple(Vec<QueryError>),
}

impl QueryError {
    /// Create a syntax error
    pub fn syntax(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Syntax {
            code,
            message: message.into(),
            context: None,
        }
    }

    /// Create a runtime error
    pub fn runtime(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Runtime {
            code,
            message: message.into(),
            context: None,
        }
    }

    /// Create a not-found error
    pub fn not_found(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            message: message.into(),
            context: None,
        }
    }

    /// Create a system error
    pub fn system(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::System {
            code,
            message: message.into(),
            context: None,
        }
    }

    /// Build an error whose variant follows the code's range
    pub fn from_code(code: ErrorCode, message: impl Into<String>) -> Self {
        ErrorBuilder::new(code, message).build()
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Syntax { code, .. } => *code,
            Self::Runtime { code, .. } => *code,
            Self::NotFound { code, .. } => *code,
            Self::System { code, .. } => *code,
            Self::Multiple(errors) => errors.first().map(|e| e.code()).unwrap_or(ErrorCode::new(0)),
        }
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Syntax { .. } => ErrorKind::Syntax,
            Self::Runtime { .. } => ErrorKind::Runtime,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::System { .. } => ErrorKind::System,
            Self::Multiple(errors) => errors
                .first()
                .map(|e| e.kind())
                .unwrap_or(ErrorKind::System),
        }
    }

    /// Get the message without the code prefix
    pub fn message(&self) -> String {
        match self {
            Self::Syntax { message, .. }
            | Self::Runtime { message, .. }
            | Self::NotFound { message, .. }
            | Self::System { message, .. } => message.clone(),
            Self::Multiple(errors) => errors
                .iter()
                .map(|e| e.message())
                .collect::<Vec<_>>()
                .join("; "),
        }
    }

    /// Attach context, e.g. the expression being evaluated
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        match &mut self {
            Self::Syntax { context, .. }
            | Self::Runtime { context, .. }
            | Self::NotFound { context, .. }
            | Self::System { context, .. } => *context = Some(ctx.into()),
            Self::Multiple(_) => {}
        }
        self
    }

    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Syntax { code, message, context }
            | Self::Runtime { code, message, context }
            | Self::NotFound { code, message, context }
            | Self::System { code, message, context } => {
                let mut diag = Diagnostic::error(*code, message.clone());
                if let Some(ctx) = context {
                    diag = diag.with_note(ctx.clone());
                }
                if let Some(help) = code.info().help {
                    diag = diag.with_help(help);
                }
                diag
            }
            Self::Multiple(errors) => {
                if let Some(first) = errors.first() {
                    let mut diag = first.to_diagnostic();
                    for other in &errors[1..] {
                        diag = diag.with_note(other.to_string());
                    }
                    diag
                } else {
                    Diagnostic::error(ErrorCode::new(0), "Unknown error")
                }
            }
        }
    }
}

/// Builder for creating query errors with fluent API
pub struct ErrorBuilder {
    code: ErrorCode,
    message: String,
    context: Option<String>,
}

impl ErrorBuilder {
    /// Create a new error builder
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
        }
    }

    /// Add context information
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Build the error, picking the variant from the code range
    pub fn build(self) -> QueryError {
        let Self {
            code,
            message,
            context,
        } = self;
        match code.kind() {
            ErrorKind::Syntax => QueryError::Syntax {
                code,
                message,
                context,
            },
            ErrorKind::Runtime => QueryError::Runtime {
                code,
                message,
                context,
            },
            ErrorKind::NotFound => QueryError::NotFound {
                code,
                message,
                context,
            },
            ErrorKind::System => QueryError::System {
                code,
                message,
                context,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CIMQL0002, CIMQL0101, CIMQL0200, CIMQL0401};

    #[test]
    fn test_error_builder() {
        let err = ErrorBuilder::new(CIMQL0002, "standalone symbolic constant #'OK'")
            .context("#'OK' = 2")
            .build();

        assert!(matches!(err, QueryError::Syntax { .. }));
        assert_eq!(err.code(), CIMQL0002);
        assert_eq!(err.kind(), ErrorKind::Syntax);
    }

    #[test]
    fn test_builder_picks_variant_from_range() {
        let err = ErrorBuilder::new(CIMQL0200, "no property Size").build();
        assert!(matches!(err, QueryError::NotFound { .. }));

        let err = QueryError::from_code(CIMQL0401, "bad json");
        assert_eq!(err.kind(), ErrorKind::System);
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = QueryError::runtime(CIMQL0101, "null operand for =")
            .with_context("Size = 4")
            .to_diagnostic();

        let text = diag.to_string();
        assert!(text.contains("CIMQL0101"));
        assert!(text.contains("note: Size = 4"));
        assert!(text.contains("help: Test for null"));
    }

    #[test]
    fn test_multiple_reports_first_kind() {
        let err = QueryError::Multiple(vec![
            QueryError::not_found(CIMQL0200, "no property A"),
            QueryError::runtime(CIMQL0101, "null operand"),
        ]);
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.code(), CIMQL0200);
        assert_eq!(err.to_diagnostic().notes.len(), 1);
    }
}
