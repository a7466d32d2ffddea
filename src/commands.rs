//! The meta-command registry.
//!
//! Commands are recognised by anchored patterns tried in table order. The
//! catch-all `exec` entry is last, so every line matches exactly one command.

use regex::Regex;
use std::sync::LazyLock;

/// What a recognised line asks the interpreter to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Help,
    ListOptions,
    SetOptions,
    Paste,
    Transpile,
    TranspileFile,
    TranspilePaste,
    Exec,
}

/// One entry of the command table.
#[derive(Debug)]
pub struct CommandDescriptor {
    pub name: &'static str,
    pub kind: CommandKind,
    /// Usage line shown by `:help`; `None` for the catch-all.
    pub synopsis: Option<&'static str>,
    pub description: Option<&'static str>,
    pattern: &'static LazyLock<Regex>,
}

impl CommandDescriptor {
    pub fn pattern(&self) -> &Regex {
        self.pattern
    }
}

macro_rules! pattern {
    ($name:ident, $re:literal) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($re).expect("command pattern is valid"));
    };
}

pattern!(HELP, r"^:help\s*$");
pattern!(LSOPTS, r"^:opts\s*$");
pattern!(SETOPTS, r"^:opts\s+");
pattern!(PASTE, r"^:paste\s*$");
pattern!(TRANSPILE, r"^:t\s+");
pattern!(TFILE, r"^:tfile\s+");
pattern!(TPASTE, r"^:tpaste\s*$");
pattern!(EXEC, r"^");

/// All commands in recognition order.
pub static COMMANDS: [CommandDescriptor; 8] = [
    CommandDescriptor {
        name: "help",
        kind: CommandKind::Help,
        synopsis: Some(":help"),
        description: Some("Show this help"),
        pattern: &HELP,
    },
    CommandDescriptor {
        name: "lsopts",
        kind: CommandKind::ListOptions,
        synopsis: Some(":opts"),
        description: Some("Show current compiler options"),
        pattern: &LSOPTS,
    },
    CommandDescriptor {
        name: "setopts",
        kind: CommandKind::SetOptions,
        synopsis: Some(":opts [+|-]<opt>[=<value>]..."),
        description: Some("Set compiler options, e.g. `:opts +generators -classes modules=amd`"),
        pattern: &SETOPTS,
    },
    CommandDescriptor {
        name: "paste",
        kind: CommandKind::Paste,
        synopsis: Some(":paste"),
        description: Some("Compile and run the clipboard contents"),
        pattern: &PASTE,
    },
    CommandDescriptor {
        name: "transpile",
        kind: CommandKind::Transpile,
        synopsis: Some(":t <code>"),
        description: Some("Show the compiled output of <code> without running it"),
        pattern: &TRANSPILE,
    },
    CommandDescriptor {
        name: "tfile",
        kind: CommandKind::TranspileFile,
        synopsis: Some(":tfile <path>"),
        description: Some("Show the compiled output of the file at <path>"),
        pattern: &TFILE,
    },
    CommandDescriptor {
        name: "tpaste",
        kind: CommandKind::TranspilePaste,
        synopsis: Some(":tpaste"),
        description: Some("Show the compiled output of the clipboard contents"),
        pattern: &TPASTE,
    },
    CommandDescriptor {
        name: "exec",
        kind: CommandKind::Exec,
        synopsis: None,
        description: None,
        pattern: &EXEC,
    },
];

/// Finds the command for `line` and the argument text after its prefix.
pub fn classify(line: &str) -> (&'static CommandDescriptor, &str) {
    let line = line.trim_end_matches(['\r', '\n']);
    for descriptor in &COMMANDS {
        if let Some(found) = descriptor.pattern.find(line) {
            return (descriptor, &line[found.end()..]);
        }
    }
    // The catch-all matches every input.
    (&COMMANDS[COMMANDS.len() - 1], line)
}

/// Usage text printed by `:help`.
pub fn help_text() -> String {
    let mut text = format!(
        "{} v{}\nAvailable commands:\n",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
    for descriptor in &COMMANDS {
        if let (Some(synopsis), Some(description)) = (descriptor.synopsis, descriptor.description) {
            text.push_str(&format!("  {synopsis}\n        {description}\n"));
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(line: &str) -> CommandKind {
        classify(line).0.kind
    }

    #[test]
    fn catch_all_is_last_and_only_one_without_synopsis() {
        let last = COMMANDS.last().unwrap();
        assert_eq!(last.kind, CommandKind::Exec);
        assert!(last.synopsis.is_none());
        assert!(COMMANDS[..COMMANDS.len() - 1].iter().all(|d| d.synopsis.is_some()));
    }

    #[test]
    fn names_are_unique() {
        for (i, a) in COMMANDS.iter().enumerate() {
            for b in &COMMANDS[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn meta_commands_are_recognised() {
        assert_eq!(kind(":help"), CommandKind::Help);
        assert_eq!(kind(":help  "), CommandKind::Help);
        assert_eq!(kind(":opts"), CommandKind::ListOptions);
        assert_eq!(kind(":opts +generators"), CommandKind::SetOptions);
        assert_eq!(kind(":paste"), CommandKind::Paste);
        assert_eq!(kind(":t 1 + 1"), CommandKind::Transpile);
        assert_eq!(kind(":tfile a.js"), CommandKind::TranspileFile);
        assert_eq!(kind(":tpaste"), CommandKind::TranspilePaste);
    }

    #[test]
    fn everything_else_executes() {
        assert_eq!(kind("1 + 1"), CommandKind::Exec);
        assert_eq!(kind(""), CommandKind::Exec);
        assert_eq!(kind(":helpme"), CommandKind::Exec);
        assert_eq!(kind(":t"), CommandKind::Exec);
        assert_eq!(kind(":optsx"), CommandKind::Exec);
    }

    #[test]
    fn trailing_newline_is_ignored() {
        assert_eq!(kind(":opts\r\n"), CommandKind::ListOptions);
        assert_eq!(classify("1+1\n").1, "1+1");
    }

    #[test]
    fn argument_follows_prefix() {
        assert_eq!(classify(":opts +a -b").1, "+a -b");
        assert_eq!(classify(":t  x => x").1, "x => x");
        assert_eq!(classify(":tfile ./a.js ").1, "./a.js ");
    }

    #[test]
    fn help_lists_every_meta_command() {
        let text = help_text();
        assert!(text.starts_with(concat!(env!("CARGO_PKG_NAME"), " v")));
        assert!(text.contains("\nAvailable commands:\n"));
        assert!(text.contains("  :tpaste\n        Show the compiled output of the clipboard contents\n"));
        assert_eq!(text.matches("\n  :").count(), 7);
    }
}
