//! Compile, validate and run one unit of source text.

use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, trace};

use crate::compiler::Transpiler;
use crate::error::{EvalError, RuntimeError};
use crate::options::CompilerOptions;
use crate::script::{Context, Engine, Value};

/// Result of one evaluation: a value or the error that stopped it.
pub type EvalResult = Result<Value, EvalError>;

/// Outcome of dispatching one line.
#[derive(Debug, PartialEq)]
pub enum Completion {
    /// Normal completion.
    Done(EvalResult),
    /// A runtime failure handed to the supervising host instead of the
    /// ordinary result path.
    Escalated(RuntimeError),
}

impl Completion {
    pub fn undefined() -> Self {
        Completion::Done(Ok(Value::Undefined))
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Completion::Done(Ok(_)))
    }
}

static USE_STRICT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""use strict";|'use strict';"#).expect("pragma pattern is valid")
});

/// Removes the first strict-mode pragma, leaving everything else untouched.
pub fn strip_use_strict(code: &str) -> String {
    USE_STRICT.replace(code, "").into_owned()
}

/// Everything the pipeline needs besides the code and the context.
pub struct Pipeline<'a> {
    pub compiler: &'a dyn Transpiler,
    pub options: &'a CompilerOptions,
    pub engine: &'a Engine,
    pub supervised: bool,
}

impl Pipeline<'_> {
    pub fn run(&self, source: &str, ctx: &mut Context, label: &str) -> Completion {
        let compiled = match self.compiler.compile(source, self.options) {
            Ok(code) => code,
            Err(e) => {
                debug!(error = %e, "compile failed");
                return Completion::Done(Err(e.into()));
            }
        };
        let code = strip_use_strict(&compiled);
        trace!(%code, "compiled");
        let script = match self.engine.check(&code, label) {
            Ok(script) => script,
            Err(e) => {
                debug!(error = %e, "validation failed");
                return Completion::Done(Err(e.into()));
            }
        };
        match self.engine.run(&script, ctx) {
            Ok(value) => Completion::Done(Ok(value)),
            Err(e) if self.supervised => {
                debug!(error = %e, "escalating runtime error");
                Completion::Escalated(e)
            }
            Err(e) => Completion::Done(Err(e.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ScriptCompiler;
    use crate::error::{CompileError, RuntimeErrorKind};

    /// Passes source through unchanged behind a prologue.
    struct Identity;

    impl Transpiler for Identity {
        fn compile(&self, source: &str, _: &CompilerOptions) -> Result<String, CompileError> {
            Ok(format!("'use strict';{source}"))
        }
    }

    fn sink_context() -> Context {
        Context::with_console(Box::new(std::io::sink()))
    }

    #[test]
    fn strips_only_first_pragma() {
        assert_eq!(strip_use_strict("\"use strict\";\n1"), "\n1");
        assert_eq!(strip_use_strict("'use strict';'use strict';"), "'use strict';");
        assert_eq!(strip_use_strict("\"use strict';"), "\"use strict';");
        assert_eq!(strip_use_strict("x"), "x");
    }

    #[test]
    fn stages_run_in_order() {
        let options = CompilerOptions::default();
        let engine = Engine::new();
        let pipeline = Pipeline {
            compiler: &ScriptCompiler,
            options: &options,
            engine: &engine,
            supervised: false,
        };
        let mut ctx = sink_context();
        assert_eq!(pipeline.run("1+1", &mut ctx, "repl"), Completion::Done(Ok(2.0.into())));
        assert!(matches!(
            pipeline.run("function(", &mut ctx, "repl"),
            Completion::Done(Err(EvalError::Compile(_)))
        ));
    }

    #[test]
    fn validation_failure_is_syntax_error() {
        let options = CompilerOptions::default();
        let engine = Engine::new();
        let pipeline = Pipeline {
            compiler: &Identity,
            options: &options,
            engine: &engine,
            supervised: false,
        };
        let mut ctx = sink_context();
        match pipeline.run("let x = 1", &mut ctx, "snippet") {
            Completion::Done(Err(EvalError::Syntax(e))) => assert_eq!(e.label, "snippet"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(ctx.binding("x").is_none());
    }

    #[test]
    fn supervised_runtime_errors_escalate() {
        let options = CompilerOptions::default();
        let engine = Engine::new();
        let mut pipeline = Pipeline {
            compiler: &ScriptCompiler,
            options: &options,
            engine: &engine,
            supervised: false,
        };
        let mut ctx = sink_context();
        match pipeline.run("nope", &mut ctx, "repl") {
            Completion::Done(Err(EvalError::Runtime(e))) => {
                assert_eq!(e.kind, RuntimeErrorKind::Reference)
            }
            other => panic!("unexpected {other:?}"),
        }
        pipeline.supervised = true;
        assert!(matches!(
            pipeline.run("nope", &mut ctx, "repl"),
            Completion::Escalated(_)
        ));
    }
}
