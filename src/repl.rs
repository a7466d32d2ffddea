//! Interactive read-eval-print loop on top of [`Interpreter`].

use std::io::{self, Write};
use std::path::PathBuf;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::interpreter::Interpreter;
use crate::pipeline::Completion;
use crate::script::Context;

/// REPL configuration
#[derive(Debug, Clone)]
pub struct ReplConfig {
    pub prompt: String,
    /// Prompt shown while brackets are still open
    pub continuation_prompt: String,
    /// History file path
    pub history_file: Option<PathBuf>,
    /// Escalate runtime errors and start over with a fresh context
    pub supervised: bool,
    /// Option patch applied before the first line is read
    pub initial_options: Option<String>,
    /// Virtual file name executed code is attributed to
    pub source_label: String,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: "trepl> ".to_string(),
            continuation_prompt: "... ".to_string(),
            history_file: None,
            supervised: false,
            initial_options: None,
            source_label: "repl".to_string(),
        }
    }
}

impl ReplConfig {
    /// A default interpreter with this configuration applied.
    pub fn interpreter(&self) -> Interpreter {
        let mut interp = Interpreter::default();
        if let Some(patch) = &self.initial_options {
            interp.apply_options(patch);
        }
        if self.supervised {
            interp = interp.supervise();
        }
        interp
    }
}

/// How a completion was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failed,
    /// The failure was escalated; the context should be discarded.
    Escalated,
}

/// Prints a completion: values other than `undefined` to `out`, errors to `err`.
pub fn report(completion: Completion, out: &mut dyn Write, err: &mut dyn Write) -> io::Result<Outcome> {
    match completion {
        Completion::Done(Ok(value)) => {
            if !value.is_undefined() {
                writeln!(out, "{}", value.inspect())?;
            }
            Ok(Outcome::Success)
        }
        Completion::Done(Err(e)) => {
            writeln!(err, "{e}")?;
            Ok(Outcome::Failed)
        }
        Completion::Escalated(e) => {
            writeln!(err, "{e}")?;
            writeln!(err, "(context reset)")?;
            Ok(Outcome::Escalated)
        }
    }
}

/// Whether `input` still has an open bracket outside string literals and
/// comments. An unterminated block comment also counts as open.
pub fn has_unclosed_delimiters(input: &str) -> bool {
    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '/' if chars.peek() == Some(&'/') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut star = false;
                let closed = chars.any(|c| {
                    let done = star && c == '/';
                    star = c == '*';
                    done
                });
                if !closed {
                    return true;
                }
            }
            '"' | '\'' | '`' => quote = Some(ch),
            '{' | '(' | '[' => depth += 1,
            '}' | ')' | ']' => depth -= 1,
            _ => {}
        }
    }

    depth > 0
}

/// Runs the interactive loop until end of input or Ctrl-C.
///
/// Lines are fed to `interp` one complete input at a time; input with open
/// brackets keeps reading continuation lines first.
pub fn run_interactive(interp: &mut Interpreter, config: &ReplConfig) -> rustyline::Result<()> {
    let mut rl = DefaultEditor::new()?;
    if let Some(path) = &config.history_file {
        if let Err(e) = rl.load_history(path) {
            debug!(error = %e, path = %path.display(), "no history loaded");
        }
    }

    let mut ctx = Context::new();
    let mut buffer = String::new();
    loop {
        let prompt = if buffer.is_empty() {
            &config.prompt
        } else {
            &config.continuation_prompt
        };
        match rl.readline(prompt) {
            Ok(line) => {
                if !buffer.is_empty() {
                    buffer.push('\n');
                }
                buffer.push_str(&line);
                if has_unclosed_delimiters(&buffer) {
                    continue;
                }
                let input = std::mem::take(&mut buffer);
                if input.trim().is_empty() {
                    continue;
                }
                rl.add_history_entry(input.as_str())?;
                let completion = interp.evaluate(&input, &mut ctx, &config.source_label);
                let outcome = report(completion, &mut io::stdout(), &mut io::stderr())?;
                if outcome == Outcome::Escalated {
                    ctx = Context::new();
                }
            }
            Err(ReadlineError::Interrupted) if !buffer.is_empty() => buffer.clear(),
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => return Err(err),
        }
    }

    if let Some(path) = &config.history_file {
        rl.save_history(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;
    use crate::io_adapters::MemWriter;
    use crate::script::Value;

    #[test]
    fn open_brackets_continue() {
        assert!(has_unclosed_delimiters("function f() {"));
        assert!(has_unclosed_delimiters("[1,\n2"));
        assert!(!has_unclosed_delimiters("f(1)"));
        assert!(!has_unclosed_delimiters("'{'"));
        assert!(!has_unclosed_delimiters(r#""a \" {""#));
        assert!(!has_unclosed_delimiters("}"));
    }

    #[test]
    fn comments_do_not_open_brackets() {
        assert!(!has_unclosed_delimiters("f() // ("));
        assert!(!has_unclosed_delimiters("f() /* { */"));
        assert!(has_unclosed_delimiters("f( // )"));
        assert!(!has_unclosed_delimiters("f( // )\n)"));
        assert!(has_unclosed_delimiters("1 /* still open"));
        assert!(!has_unclosed_delimiters("'//' + ("));
        assert!(!has_unclosed_delimiters("6 / 2 / (1)"));
    }

    #[test]
    fn default_config() {
        let config = ReplConfig::default();
        assert_eq!(config.prompt, "trepl> ");
        assert_eq!(config.source_label, "repl");
        assert!(!config.supervised);
    }

    #[test]
    fn config_patch_reaches_interpreter() {
        let config = ReplConfig {
            initial_options: Some("+exponentiation".to_string()),
            ..ReplConfig::default()
        };
        assert!(config.interpreter().options().flag("exponentiation"));
    }

    #[test]
    fn report_routes_values_and_errors() {
        let (mut out, out_text) = MemWriter::with_handle();
        let (mut err, err_text) = MemWriter::with_handle();

        let ok = Completion::Done(Ok(Value::str("hi")));
        assert_eq!(report(ok, &mut out, &mut err).unwrap(), Outcome::Success);
        let quiet = Completion::undefined();
        assert_eq!(report(quiet, &mut out, &mut err).unwrap(), Outcome::Success);
        assert_eq!(out_text.contents(), "'hi'\n");

        let failed = Completion::Done(Err(RuntimeError::reference("x is not defined").into()));
        assert_eq!(report(failed, &mut out, &mut err).unwrap(), Outcome::Failed);
        let escalated = Completion::Escalated(RuntimeError::uncaught("1"));
        assert_eq!(report(escalated, &mut out, &mut err).unwrap(), Outcome::Escalated);
        assert_eq!(
            err_text.contents(),
            "ReferenceError: x is not defined\nUncaught: 1\n(context reset)\n"
        );
    }
}
