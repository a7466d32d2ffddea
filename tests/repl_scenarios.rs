use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use transpile_repl::env::Environment;
use transpile_repl::io_adapters::Captured;
use transpile_repl::script::{Context, Engine, Value};
use transpile_repl::{
    Clipboard, CompileError, Completion, CompilerOptions, EvalError, Interpreter, MemWriter,
    OptionValue, RuntimeErrorKind, Transpiler,
};

struct FakeClipboard(Option<&'static str>);

impl Clipboard for FakeClipboard {
    fn read(&self) -> io::Result<String> {
        self.0
            .map(str::to_string)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no clipboard utility found on PATH"))
    }
}

struct Session {
    interp: Interpreter,
    ctx: Context,
    out: Captured,
    err: Captured,
    printed: Captured,
}

impl Session {
    fn new() -> Self {
        Self::with(|interp| interp)
    }

    fn with(configure: impl FnOnce(Interpreter) -> Interpreter) -> Self {
        let (out, out_handle) = MemWriter::with_handle();
        let (err, err_handle) = MemWriter::with_handle();
        let (console, printed) = MemWriter::with_handle();
        let interp = Interpreter::default()
            .with_console(out, err)
            .with_clipboard(FakeClipboard(Some("var pasted = 6 * 7\npasted")))
            .with_engine(Engine::with_call_depth(16));
        Self {
            interp: configure(interp),
            ctx: Context::with_console(Box::new(console)),
            out: out_handle,
            err: err_handle,
            printed,
        }
    }

    fn eval(&mut self, line: &str) -> Completion {
        self.interp.evaluate(line, &mut self.ctx, "repl")
    }

    fn value(&mut self, line: &str) -> Value {
        match self.eval(line) {
            Completion::Done(Ok(value)) => value,
            other => panic!("{line:?} did not produce a value: {other:?}"),
        }
    }
}

fn temp_env(dir: &Path) -> Environment {
    Environment {
        vars: HashMap::new(),
        current_dir: dir.to_path_buf(),
    }
}

#[test]
fn one_plus_one() {
    let mut s = Session::new();
    assert_eq!(s.eval("1+1"), Completion::Done(Ok(2.0.into())));
}

#[test]
fn bindings_persist_between_lines() {
    let mut s = Session::new();
    s.value("let greeting = 'hello'");
    s.value("const shout = s => s + '!'");
    assert_eq!(s.value("shout(greeting)"), "hello!".into());
    assert_eq!(s.value("`${greeting} world`"), "hello world".into());
}

#[test]
fn opts_never_executes() {
    let mut s = Session::new();
    assert_eq!(s.eval(":opts"), Completion::undefined());
    assert_eq!(s.out.contents(), format!("{}\n", CompilerOptions::default()));
    assert_eq!(s.ctx.binding_names(), vec!["pow", "print"]);
}

#[test]
fn set_options_updates_and_dumps() {
    let mut s = Session::new();
    s.eval(":opts +generators -classes");
    let opts = s.interp.options();
    assert_eq!(opts.get("generators"), Some(&OptionValue::Bool(true)));
    assert_eq!(opts.get("classes"), Some(&OptionValue::Bool(false)));
    for (name, value) in CompilerOptions::default().iter() {
        if name != "classes" {
            assert_eq!(opts.get(name), Some(value));
        }
    }
    let dump = s.out.contents();
    assert!(dump.contains("  generators: true,\n"));
    assert!(dump.contains("  classes: false,\n"));
    assert!(dump.ends_with("}\n"));
}

#[test]
fn later_token_wins() {
    let mut s = Session::new();
    s.eval(":opts +arrowFunctions -arrowFunctions");
    assert!(!s.interp.options().flag("arrowFunctions"));
}

#[test]
fn mistyped_value_is_ignored() {
    let mut s = Session::new();
    s.eval(":opts classes=notaboolean");
    assert_eq!(s.interp.options().get("classes"), Some(&OptionValue::Bool(true)));
}

#[test]
fn transpile_prints_and_binds_nothing() {
    let mut s = Session::new();
    assert_eq!(s.eval(":t let x = 1"), Completion::undefined());
    assert_eq!(s.out.contents(), "\"use strict\";\nvar x = 1;\n");
    assert!(s.ctx.binding("x").is_none());
}

#[test]
fn compile_error_leaves_context_alone() {
    let mut s = Session::new();
    let before = s.ctx.binding_names();
    assert!(matches!(
        s.eval("function("),
        Completion::Done(Err(EvalError::Compile(_)))
    ));
    assert_eq!(s.ctx.binding_names(), before);
}

#[test]
fn missing_tfile_reports_and_stops() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = Session::with(|interp| interp.with_environment(temp_env(dir.path())));
    assert_eq!(s.eval(":tfile ./missing.js"), Completion::undefined());
    assert_eq!(s.out.contents(), "");
    assert!(s.err.contents().starts_with("cannot read '"));
    assert!(s.err.contents().contains("missing.js"));
}

#[test]
fn tfile_resolves_against_session_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("sq.js"), "const sq = x => x * x;\n").unwrap();
    let mut s = Session::with(|interp| interp.with_environment(temp_env(dir.path())));
    assert_eq!(s.eval(":tfile  sq.js  "), Completion::undefined());
    assert_eq!(
        s.out.contents(),
        "\"use strict\";\nvar sq = function (x) {\n  return x * x;\n};\n"
    );
    assert!(s.ctx.binding("sq").is_none());
}

#[test]
fn paste_echoes_and_runs() {
    let mut s = Session::new();
    assert_eq!(s.value(":paste"), 42.0.into());
    assert_eq!(s.out.contents(), "<<<\n...var pasted = 6 * 7\n...pasted\n>>>\n");
    assert_eq!(s.ctx.binding("pasted"), Some(42.0.into()));
}

#[test]
fn unreadable_clipboard_is_reported() {
    let mut s = Session::with(|interp| interp.with_clipboard(FakeClipboard(None)));
    assert_eq!(s.eval(":tpaste"), Completion::undefined());
    assert_eq!(s.out.contents(), "");
    assert_eq!(
        s.err.contents(),
        "cannot read clipboard: no clipboard utility found on PATH\n"
    );
}

#[test]
fn exponentiation_follows_options() {
    let mut s = Session::new();
    assert!(matches!(s.eval("2 ** 10"), Completion::Done(Err(EvalError::Compile(_)))));
    s.eval(":opts +exponentiation");
    assert_eq!(s.value("2 ** 10"), 1024.0.into());
}

#[test]
fn exponentiation_survives_user_pow() {
    let mut s = Session::new();
    s.eval(":opts +exponentiation");
    s.value("var pow = 0");
    assert_eq!(s.value("2 ** 3"), 8.0.into());
    assert_eq!(s.value("pow"), 0.0.into());
}

#[test]
fn very_long_expression_is_a_compile_error() {
    let mut s = Session::new();
    let line = format!("{}1", "1+".repeat(5000));
    assert!(matches!(s.eval(&line), Completion::Done(Err(EvalError::Compile(_)))));
    let calls = format!("print{}", "()".repeat(5000));
    assert!(matches!(s.eval(&calls), Completion::Done(Err(EvalError::Compile(_)))));
}

#[test]
fn deeply_nested_arrows_fail_to_compile_not_to_validate() {
    let mut s = Session::new();
    for n in [10, 45, 60, 90] {
        let line = format!("{}1", "x => ".repeat(n));
        let done = s.eval(&line);
        assert!(
            !matches!(done, Completion::Done(Err(EvalError::Syntax(_)))),
            "{n} arrows: {done:?}"
        );
    }
    assert!(matches!(
        s.eval(&format!("{}1", "x => ".repeat(60))),
        Completion::Done(Err(EvalError::Compile(_)))
    ));
}

#[test]
fn self_containing_array_stringifies() {
    let mut s = Session::new();
    s.value("var a = []; a[0] = a");
    assert_eq!(s.value("a + ''"), "".into());
    s.value("print(a)");
    assert_eq!(s.printed.contents(), "\n");
    assert_eq!(s.value("a").inspect(), "[ [ [ [Array] ] ] ]");
}

#[test]
fn hex_escapes_in_strings() {
    let mut s = Session::new();
    assert_eq!(s.value("'\\x41'"), "A".into());
    assert!(matches!(s.eval("'\\x4'"), Completion::Done(Err(EvalError::Compile(_)))));
}

#[test]
fn prefix_keys_expand() {
    let mut s = Session::new();
    s.eval(":opts -template");
    assert!(!s.interp.options().flag("templateLiterals"));
    assert!(matches!(s.eval("`x`"), Completion::Done(Err(EvalError::Compile(_)))));
}

#[test]
fn runtime_errors_are_results_by_default() {
    let mut s = Session::new();
    match s.eval("nothing.here") {
        Completion::Done(Err(EvalError::Runtime(e))) => {
            assert_eq!(e.kind, RuntimeErrorKind::Reference)
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn supervised_runtime_errors_escalate() {
    let mut s = Session::with(Interpreter::supervise);
    s.value("var kept = 1");
    assert!(matches!(s.eval("throw 'boom'"), Completion::Escalated(e) if e.message == "'boom'"));
    assert!(matches!(
        s.eval("function("),
        Completion::Done(Err(EvalError::Compile(_)))
    ));
}

#[test]
fn recursion_is_bounded() {
    let mut s = Session::new();
    s.value("function down(n) { return down(n + 1); }");
    match s.eval("down(0)") {
        Completion::Done(Err(EvalError::Runtime(e))) => assert_eq!(e.kind, RuntimeErrorKind::Range),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn print_goes_to_context_console() {
    let mut s = Session::new();
    s.value("print(`total: ${[1, 2, 3].length}`)");
    assert_eq!(s.printed.contents(), "total: 3\n");
    assert_eq!(s.out.contents(), "");
}

#[test]
fn syntax_error_carries_label() {
    struct Passthrough;
    impl Transpiler for Passthrough {
        fn compile(&self, source: &str, _: &CompilerOptions) -> Result<String, CompileError> {
            Ok(source.to_string())
        }
    }
    let mut s = Session::with(|interp| interp.with_compiler(Passthrough));
    match s.interp.evaluate("let y = 2", &mut s.ctx, "scratch.js") {
        Completion::Done(Err(EvalError::Syntax(e))) => {
            assert_eq!(e.label, "scratch.js");
            assert_eq!((e.line, e.column), (1, 1));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn sessions_do_not_share_options() {
    let mut a = Session::new();
    let b = Session::new();
    a.eval(":opts +exponentiation");
    assert!(a.interp.options().flag("exponentiation"));
    assert!(!b.interp.options().flag("exponentiation"));
}

#[test]
fn help_lists_commands() {
    let mut s = Session::new();
    s.eval(":help");
    let text = s.out.contents();
    assert!(text.contains("Available commands:\n"));
    for synopsis in [":help", ":opts", ":paste", ":t <code>", ":tfile <path>", ":tpaste"] {
        assert!(text.contains(&format!("  {synopsis}")), "missing {synopsis}");
    }
}
