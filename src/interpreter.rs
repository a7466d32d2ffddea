use std::io::{self, Write};

use tracing::{debug, warn};

use crate::clipboard::{Clipboard, SystemClipboard};
use crate::commands::{CommandKind, classify, help_text};
use crate::compiler::{ScriptCompiler, Transpiler};
use crate::env::Environment;
use crate::error::LoadError;
use crate::loader::{FsLoader, SourceLoader};
use crate::options::CompilerOptions;
use crate::pipeline::{Completion, Pipeline};
use crate::script::{Context, Engine};

/// Line-oriented command dispatcher in front of the compiler and the engine.
///
/// Each call to [`Interpreter::evaluate`] recognises one command and runs it.
/// Meta-commands (`:help`, `:opts`, `:t`, ...) report on the output sink; any
/// other line is compiled and executed against the caller's [`Context`].
///
/// Example
/// ```
/// use transpile_repl::{Completion, Interpreter};
/// use transpile_repl::script::Context;
///
/// let mut repl = Interpreter::default().with_console(std::io::sink(), std::io::sink());
/// let mut ctx = Context::new();
/// assert_eq!(repl.evaluate("1 + 1", &mut ctx, "repl"), Completion::Done(Ok(2.0.into())));
/// ```
pub struct Interpreter {
    options: CompilerOptions,
    env: Environment,
    compiler: Box<dyn Transpiler>,
    clipboard: Box<dyn Clipboard>,
    loader: Box<dyn SourceLoader>,
    engine: Engine,
    out: Box<dyn Write>,
    err: Box<dyn Write>,
    supervised: bool,
}

impl Default for Interpreter {
    /// Built-in compiler, system clipboard, filesystem loader and the
    /// process stdout/stderr.
    fn default() -> Self {
        let env = Environment::new();
        Self {
            options: CompilerOptions::default(),
            clipboard: Box::new(SystemClipboard::new(&env)),
            env,
            compiler: Box::new(ScriptCompiler),
            loader: Box::new(FsLoader),
            engine: Engine::new(),
            out: Box::new(io::stdout()),
            err: Box::new(io::stderr()),
            supervised: false,
        }
    }
}

impl Interpreter {
    pub fn with_compiler(mut self, compiler: impl Transpiler + 'static) -> Self {
        self.compiler = Box::new(compiler);
        self
    }

    pub fn with_clipboard(mut self, clipboard: impl Clipboard + 'static) -> Self {
        self.clipboard = Box::new(clipboard);
        self
    }

    pub fn with_loader(mut self, loader: impl SourceLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    /// Replaces the environment `:tfile` paths are resolved against.
    ///
    /// The clipboard keeps the `PATH` it was created with.
    pub fn with_environment(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    /// Redirects command output and meta-command errors.
    pub fn with_console(mut self, out: impl Write + 'static, err: impl Write + 'static) -> Self {
        self.out = Box::new(out);
        self.err = Box::new(err);
        self
    }

    /// Marks the host as supervising evaluation: runtime failures come back as
    /// [`Completion::Escalated`] instead of ordinary error results.
    pub fn supervise(mut self) -> Self {
        self.supervised = true;
        self
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Applies an option patch, as `:opts <patch>` does, without printing.
    pub fn apply_options(&mut self, patch: &str) {
        self.options.apply(patch);
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Dispatches one line of input.
    ///
    /// `label` names the virtual file executed code is attributed to.
    pub fn evaluate(&mut self, line: &str, ctx: &mut Context, label: &str) -> Completion {
        let (command, arg) = classify(line);
        debug!(command = command.name, "dispatching");
        match command.kind {
            CommandKind::Help => {
                let text = help_text();
                self.say(text.trim_end_matches('\n'));
                Completion::undefined()
            }
            CommandKind::ListOptions => {
                self.print_options();
                Completion::undefined()
            }
            CommandKind::SetOptions => {
                self.options.apply(arg);
                self.print_options();
                Completion::undefined()
            }
            CommandKind::Paste => match self.clipboard.read() {
                Ok(text) => {
                    self.say(&pasted(&text));
                    self.execute(&text, ctx, label)
                }
                Err(e) => self.report(LoadError::Clipboard(e)),
            },
            CommandKind::Transpile => self.transpile(arg),
            CommandKind::TranspileFile => {
                let path = self.env.resolve(arg.trim());
                match self.loader.read_source(&path) {
                    Ok(source) => self.transpile(&source),
                    Err(source) => self.report(LoadError::File { path, source }),
                }
            }
            CommandKind::TranspilePaste => match self.clipboard.read() {
                Ok(text) => {
                    self.say(&pasted(&text));
                    self.transpile(&text)
                }
                Err(e) => self.report(LoadError::Clipboard(e)),
            },
            CommandKind::Exec => self.execute(arg, ctx, label),
        }
    }

    /// Compiles and runs `source` as one unit, bypassing command recognition.
    pub fn execute(&mut self, source: &str, ctx: &mut Context, label: &str) -> Completion {
        let pipeline = Pipeline {
            compiler: self.compiler.as_ref(),
            options: &self.options,
            engine: &self.engine,
            supervised: self.supervised,
        };
        pipeline.run(source, ctx, label)
    }

    fn transpile(&mut self, source: &str) -> Completion {
        match self.compiler.compile(source, &self.options) {
            Ok(code) => {
                self.say(&code);
                Completion::undefined()
            }
            Err(e) => Completion::Done(Err(e.into())),
        }
    }

    fn print_options(&mut self) {
        let dump = self.options.to_string();
        self.say(&dump);
    }

    fn say(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}") {
            warn!(error = %e, "failed to write command output");
        }
    }

    fn report(&mut self, error: LoadError) -> Completion {
        debug!(%error, "command input unavailable");
        if let Err(e) = writeln!(self.err, "{error}") {
            warn!(error = %e, "failed to write command error");
        }
        Completion::undefined()
    }
}

/// Frames pasted text the way it is echoed back before running.
pub fn pasted(text: &str) -> String {
    let body: Vec<String> = text.split('\n').map(|line| format!("...{line}")).collect();
    format!("<<<\n{}\n>>>", body.join("\n"))
}
