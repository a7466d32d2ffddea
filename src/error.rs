//! Error types produced while dispatching a line.
//!
//! Every failure is recovered close to where it happens and handed back to the
//! caller as a value. Nothing here terminates the process.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The translator could not turn extended-syntax source into plain script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("CompileError: {line}:{column}: {message}")]
pub struct CompileError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

/// The translated text failed standalone validation before execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("SyntaxError: {label}:{line}:{column}: {message}")]
pub struct SyntaxError {
    /// Name of the virtual file the code was submitted under.
    pub label: String,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

/// Category of a failure raised while running validated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// Read or write of a name that was never declared.
    Reference,
    /// Operation applied to a value of the wrong kind.
    Type,
    /// Resource limit exceeded (call depth).
    Range,
    /// A value raised with `throw`.
    Uncaught,
}

impl fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuntimeErrorKind::Reference => "ReferenceError",
            RuntimeErrorKind::Type => "TypeError",
            RuntimeErrorKind::Range => "RangeError",
            RuntimeErrorKind::Uncaught => "Uncaught",
        };
        f.write_str(name)
    }
}

/// A failure raised while executing code inside an evaluation context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub message: String,
}

impl RuntimeError {
    pub fn reference(message: impl Into<String>) -> Self {
        Self {
            kind: RuntimeErrorKind::Reference,
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self {
            kind: RuntimeErrorKind::Type,
            message: message.into(),
        }
    }

    pub fn range(message: impl Into<String>) -> Self {
        Self {
            kind: RuntimeErrorKind::Range,
            message: message.into(),
        }
    }

    pub fn uncaught(message: impl Into<String>) -> Self {
        Self {
            kind: RuntimeErrorKind::Uncaught,
            message: message.into(),
        }
    }
}

/// The error half of an evaluation result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// A meta-command could not fetch its input.
///
/// These never reach the evaluation pipeline: the dispatcher prints them to its
/// error sink and completes the command without a value.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read clipboard: {0}")]
    Clipboard(#[source] io::Error),
    #[error("cannot read '{}': {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Converts a byte offset into a 1-based line and column.
pub(crate) fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_counts_from_one() {
        assert_eq!(line_col("abc", 0), (1, 1));
        assert_eq!(line_col("abc", 2), (1, 3));
        assert_eq!(line_col("a\nbc", 3), (2, 2));
        assert_eq!(line_col("ab", 10), (1, 3));
    }

    #[test]
    fn runtime_error_display_names_kind() {
        let err = RuntimeError::reference("x is not defined");
        assert_eq!(err.to_string(), "ReferenceError: x is not defined");
        let err = RuntimeError::uncaught("'boom'");
        assert_eq!(err.to_string(), "Uncaught: 'boom'");
    }

    #[test]
    fn eval_error_is_transparent() {
        let err: EvalError = CompileError {
            message: "unexpected end of input".to_string(),
            line: 1,
            column: 10,
        }
        .into();
        assert_eq!(err.to_string(), "CompileError: 1:10: unexpected end of input");
    }

    #[test]
    fn load_error_mentions_path() {
        let err = LoadError::File {
            path: PathBuf::from("/tmp/missing.js"),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        };
        assert_eq!(
            err.to_string(),
            "cannot read '/tmp/missing.js': No such file or directory"
        );
    }
}
