//! A REPL command dispatcher in front of a source-to-source compiler.
//!
//! Each input line is either a meta-command (`:help`, `:opts`, `:paste`,
//! `:t`, `:tfile`, `:tpaste`) or source code. Source is compiled from the
//! extended script dialect to plain script under the current
//! [`CompilerOptions`], validated, and run against a caller-owned
//! [`script::Context`] so bindings persist from one line to the next.
//!
//! The main entry point is [`Interpreter`]. The compiler, clipboard and file
//! loader sit behind the [`Transpiler`], [`Clipboard`] and [`SourceLoader`]
//! traits so hosts and tests can swap them.

pub mod clipboard;
pub mod commands;
pub mod compiler;
pub mod env;
pub mod error;
pub mod io_adapters;
pub mod loader;
pub mod options;
pub mod pipeline;
pub mod repl;
pub mod script;

mod interpreter;

pub use clipboard::{Clipboard, SystemClipboard};
pub use compiler::{ScriptCompiler, Transpiler};
pub use error::{CompileError, EvalError, LoadError, RuntimeError, RuntimeErrorKind, SyntaxError};
pub use interpreter::{Interpreter, pasted};
pub use io_adapters::MemWriter;
pub use loader::{FsLoader, SourceLoader};
pub use options::{CompilerOptions, OptionValue};
pub use pipeline::{Completion, EvalResult};
