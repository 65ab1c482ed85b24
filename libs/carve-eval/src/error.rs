//! # Runtime Errors
//!
//! Errors raised during evaluation. Every error carries the source span
//! of the expression or block that raised it, and a human hint.
//!
//! Cancellation travels through the same channel but is a sentinel, not a
//! failure: check [`RuntimeError::is_cancellation`] before reporting.

use std::fmt;

use carve_mesh::GeometryError;
use carve_parser::{ParseError, Span};
use config::constants::MAX_IMPORT_DEPTH;

// =============================================================================
// RUNTIME ERROR
// =============================================================================

/// A runtime error with source location.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    /// Error kind with details.
    pub kind: RuntimeErrorKind,
    /// Source location.
    pub span: Span,
}

impl RuntimeError {
    /// Create an error.
    pub fn new(kind: RuntimeErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// The cancellation sentinel.
    pub fn cancelled() -> Self {
        Self::new(RuntimeErrorKind::Cancelled, Span::zero())
    }

    /// True when this is the cancellation sentinel.
    pub fn is_cancellation(&self) -> bool {
        matches!(self.kind, RuntimeErrorKind::Cancelled)
    }

    /// A human hint suggesting how to fix the problem.
    pub fn hint(&self) -> String {
        match &self.kind {
            RuntimeErrorKind::TypeMismatch { expected, found } => {
                format!("expected {expected} here, but this value is {found}")
            }
            RuntimeErrorKind::UnknownSymbol { name } => {
                format!("'{name}' is not defined; check the spelling or define it first")
            }
            RuntimeErrorKind::AssertionFailure { message } => {
                if message.is_empty() {
                    "the asserted condition evaluated to false".to_string()
                } else {
                    message.clone()
                }
            }
            RuntimeErrorKind::FileNotFound { path } => {
                format!("no file exists at '{path}'; check the import path")
            }
            RuntimeErrorKind::FileAccessRestricted { path } => {
                format!("'{path}' cannot be read from this document's sandbox")
            }
            RuntimeErrorKind::FileParsingError { path } => {
                format!("'{path}' could not be parsed as a mesh document")
            }
            RuntimeErrorKind::FileTypeMismatch { path, expected } => {
                format!("'{path}' is not a {expected} file")
            }
            RuntimeErrorKind::ImportDepthExceeded { path } => format!(
                "'{path}' nests imports more than {MAX_IMPORT_DEPTH} levels deep; check for an import cycle"
            ),
            RuntimeErrorKind::UnknownFont { name } => {
                format!("the font '{name}' is not available on this system")
            }
            RuntimeErrorKind::ImportError { path, .. } => {
                format!("the imported file '{path}' contains an error")
            }
            RuntimeErrorKind::Geometry(inner) => inner.to_string(),
            RuntimeErrorKind::Cancelled => "the build was cancelled".to_string(),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at line {}, column {}",
            self.kind,
            self.span.start.line + 1,
            self.span.start.column + 1
        )
    }
}

impl std::error::Error for RuntimeError {}

// =============================================================================
// RUNTIME ERROR KIND
// =============================================================================

/// The error wrapped by an `import` statement: either the imported file
/// failed to parse, or it failed to evaluate.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportedError {
    /// Parse failure in the imported source.
    Parse(ParseError),
    /// Runtime failure while evaluating the imported source.
    Runtime(Box<RuntimeError>),
}

/// Kinds of runtime errors.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeErrorKind {
    /// A value had the wrong type for its context.
    TypeMismatch {
        /// What the context required.
        expected: String,
        /// What was found.
        found: String,
    },

    /// Reference to an undefined symbol.
    UnknownSymbol {
        /// The symbol name.
        name: String,
    },

    /// An `assert` condition evaluated to false.
    AssertionFailure {
        /// Optional user message.
        message: String,
    },

    /// Import target does not exist.
    FileNotFound {
        /// Requested path.
        path: String,
    },

    /// Import target exists but cannot be read.
    FileAccessRestricted {
        /// Requested path.
        path: String,
    },

    /// Import target could not be decoded.
    FileParsingError {
        /// Requested path.
        path: String,
    },

    /// Import target has the wrong type for its use.
    FileTypeMismatch {
        /// Requested path.
        path: String,
        /// Expected file type.
        expected: String,
    },

    /// Imports nested past the safety limit, usually an import cycle.
    ImportDepthExceeded {
        /// The import that exceeded the limit.
        path: String,
    },

    /// A font name could not be resolved.
    UnknownFont {
        /// Requested font.
        name: String,
    },

    /// An error inside an imported file, wrapped with the import site.
    ImportError {
        /// Imported path.
        path: String,
        /// The wrapped inner error.
        inner: ImportedError,
        /// Source of the imported file, for rendering the inner caret.
        source: String,
    },

    /// A geometry-kernel error, wrapped with the originating block's span.
    Geometry(GeometryError),

    /// Cooperative cancellation (not a failure).
    Cancelled,
}

impl fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {expected}, found {found}")
            }
            Self::UnknownSymbol { name } => write!(f, "unknown symbol '{name}'"),
            Self::AssertionFailure { message } => {
                if message.is_empty() {
                    write!(f, "assertion failure")
                } else {
                    write!(f, "assertion failure: {message}")
                }
            }
            Self::FileNotFound { path } => write!(f, "file not found: {path}"),
            Self::FileAccessRestricted { path } => {
                write!(f, "file access restricted: {path}")
            }
            Self::FileParsingError { path } => write!(f, "cannot parse file: {path}"),
            Self::FileTypeMismatch { path, expected } => {
                write!(f, "file type mismatch: {path} is not {expected}")
            }
            Self::ImportDepthExceeded { path } => {
                write!(f, "import depth limit exceeded at '{path}'")
            }
            Self::UnknownFont { name } => write!(f, "unknown font '{name}'"),
            Self::ImportError { path, .. } => write!(f, "error in imported file '{path}'"),
            Self::Geometry(inner) => write!(f, "geometry error: {inner}"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl RuntimeError {
    /// Wraps a geometry error with the span of the originating block.
    ///
    /// The kernel's cancellation sentinel stays a sentinel.
    pub fn from_geometry(error: GeometryError, span: Span) -> Self {
        if error.is_cancellation() {
            Self::cancelled()
        } else {
            Self::new(RuntimeErrorKind::Geometry(error), span)
        }
    }
}

// =============================================================================
// DOCUMENT ERROR
// =============================================================================

/// Any failure processing a document: lexing/parsing or evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentError {
    /// The source did not parse; recovered parsers report the first
    /// error.
    Parse(ParseError),
    /// The source evaluated with an error.
    Runtime(RuntimeError),
}

impl DocumentError {
    /// Source span of the error.
    pub fn span(&self) -> Span {
        match self {
            Self::Parse(e) => e.span,
            Self::Runtime(e) => e.span,
        }
    }

    /// Human hint for the error.
    pub fn hint(&self) -> String {
        match self {
            Self::Parse(e) => e.hint(),
            Self::Runtime(e) => e.hint(),
        }
    }

    /// True when the underlying condition is the cancellation sentinel.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Runtime(e) if e.is_cancellation())
    }
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "{e}"),
            Self::Runtime(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DocumentError {}

// =============================================================================
// TESTS
// =============================================================================
