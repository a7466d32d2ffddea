//! Compiler option store and its patch mini-language.
//!
//! The store is an ordered map of option names to typed values. It is created
//! with a fixed default set and then patched in place by the `:opts` command:
//!
//! ```
//! use transpile_repl::options::{CompilerOptions, OptionValue};
//!
//! let mut opts = CompilerOptions::default();
//! opts.apply("+exponentiation -classes modules=amd");
//! assert!(opts.flag("exponentiation"));
//! assert!(!opts.flag("classes"));
//! assert_eq!(opts.get("modules"), Some(&OptionValue::Str("amd".to_string())));
//! ```

use indexmap::IndexMap;
use std::fmt;
use tracing::{debug, trace};

/// Options toggled together by the `experimental` key.
pub const EXPERIMENTAL: [&str; 5] = [
    "symbols",
    "asyncFunctions",
    "arrayComprehension",
    "types",
    "annotations",
];

/// Value of a single compiler option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    Str(String),
    /// Placeholder for options without a meaningful default; never assignable.
    Null,
}

impl OptionValue {
    /// Coerces a patch value: `true`/`false` become booleans, anything else a string.
    fn parse(raw: &str) -> Self {
        match raw {
            "true" => OptionValue::Bool(true),
            "false" => OptionValue::Bool(false),
            other => OptionValue::Str(other.to_string()),
        }
    }

    fn same_type(&self, other: &OptionValue) -> bool {
        matches!(
            (self, other),
            (OptionValue::Bool(_), OptionValue::Bool(_)) | (OptionValue::Str(_), OptionValue::Str(_))
        )
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{b}"),
            OptionValue::Str(s) => write!(f, "'{s}'"),
            OptionValue::Null => f.write_str("null"),
        }
    }
}

/// Mutable compiler configuration consulted by every compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    values: IndexMap<String, OptionValue>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        use OptionValue::{Bool, Null};
        let s = |v: &str| OptionValue::Str(v.to_string());
        let defaults = [
            ("annotations", Bool(false)),
            ("arrayComprehension", Bool(false)),
            ("arrowFunctions", Bool(true)),
            ("asyncFunctions", Bool(false)),
            ("blockBinding", Bool(true)),
            ("classes", Bool(true)),
            ("commentCallback", Bool(false)),
            ("computedPropertyNames", Bool(true)),
            ("debug", Bool(false)),
            ("defaultParameters", Bool(true)),
            ("destructuring", Bool(true)),
            ("exponentiation", Bool(false)),
            ("forOf", Bool(true)),
            ("freeVariableChecker", Bool(false)),
            ("generatorComprehension", Bool(false)),
            ("generators", Bool(true)),
            ("moduleName", Bool(false)),
            ("modules", s("register")),
            ("numericLiterals", Bool(true)),
            ("outputLanguage", s("es5")),
            ("propertyMethods", Bool(true)),
            ("propertyNameShorthand", Bool(true)),
            ("referrer", s("")),
            ("unicodeExpressions", Bool(true)),
            ("restParameters", Bool(true)),
            ("script", Bool(true)),
            ("sourceMaps", Bool(false)),
            ("spread", Bool(true)),
            ("symbols", Bool(false)),
            ("templateLiterals", Bool(true)),
            ("typeAssertionModule", Null),
            ("typeAssertions", Bool(false)),
            ("types", Bool(false)),
            ("unicodeEscapeSequences", Bool(true)),
            ("validate", Bool(false)),
        ];
        Self {
            values: defaults
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }
}

impl CompilerOptions {
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    /// Returns the option as a boolean; missing or non-boolean options read as `false`.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(OptionValue::Bool(true)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Applies a whitespace-separated patch such as `+generators -classes modules=amd`.
    ///
    /// Malformed tokens, unknown keys and type mismatches are skipped silently.
    /// A key that names no option is expanded to every option starting with it.
    pub fn apply(&mut self, patch: &str) {
        for token in patch.split_whitespace() {
            let Some((key, raw)) = split_token(token) else {
                trace!(token, "ignoring malformed option token");
                continue;
            };
            let value = OptionValue::parse(raw);
            if key == "experimental" {
                for name in EXPERIMENTAL {
                    self.set(name, &value);
                }
            } else if self.values.contains_key(key) {
                self.set(key, &value);
            } else {
                let matching: Vec<String> = self
                    .values
                    .keys()
                    .filter(|name| !key.is_empty() && name.starts_with(key))
                    .cloned()
                    .collect();
                if matching.is_empty() {
                    trace!(key, "no option matches");
                }
                for name in matching {
                    self.set(&name, &value);
                }
            }
        }
    }

    fn set(&mut self, name: &str, value: &OptionValue) {
        match self.values.get_mut(name) {
            Some(current) if current.same_type(value) => {
                debug!(option = name, %value, "option updated");
                *current = value.clone();
            }
            Some(current) => {
                debug!(option = name, %current, %value, "type mismatch, option left unchanged");
            }
            None => {}
        }
    }
}

/// Splits one patch token into key and raw value.
fn split_token(token: &str) -> Option<(&str, &str)> {
    if let Some((key, value)) = token.split_once('=') {
        Some((key, value))
    } else if let Some(key) = token.strip_prefix('+') {
        Some((key, "true"))
    } else {
        token.strip_prefix('-').map(|key| (key, "false"))
    }
}

impl fmt::Display for CompilerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{{")?;
        for (name, value) in &self.values {
            writeln!(f, "  {name}: {value},")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_declaration_order() {
        let opts = CompilerOptions::default();
        let names: Vec<&str> = opts.iter().map(|(k, _)| k).collect();
        assert_eq!(names.first(), Some(&"annotations"));
        assert_eq!(names.last(), Some(&"validate"));
        assert_eq!(opts.len(), 35);
        assert_eq!(opts.get("typeAssertionModule"), Some(&OptionValue::Null));
    }

    #[test]
    fn plus_and_minus_set_booleans() {
        let mut opts = CompilerOptions::default();
        opts.apply("+generators -classes");
        assert_eq!(opts.get("generators"), Some(&OptionValue::Bool(true)));
        assert_eq!(opts.get("classes"), Some(&OptionValue::Bool(false)));
        let untouched = CompilerOptions::default();
        for (name, value) in opts.iter() {
            if name != "classes" {
                assert_eq!(untouched.get(name), Some(value), "{name} changed");
            }
        }
    }

    #[test]
    fn last_token_wins() {
        let mut a = CompilerOptions::default();
        a.apply("+symbols -symbols");
        let mut b = CompilerOptions::default();
        b.apply("-symbols");
        assert_eq!(a, b);
    }

    #[test]
    fn type_mismatch_is_ignored() {
        let mut opts = CompilerOptions::default();
        opts.apply("classes=notaboolean");
        assert_eq!(opts.get("classes"), Some(&OptionValue::Bool(true)));
        opts.apply("modules=true");
        assert_eq!(opts.get("modules"), Some(&OptionValue::Str("register".to_string())));
        opts.apply("typeAssertionModule=assert");
        assert_eq!(opts.get("typeAssertionModule"), Some(&OptionValue::Null));
    }

    #[test]
    fn key_value_coerces_booleans() {
        let mut opts = CompilerOptions::default();
        opts.apply("debug=true sourceMaps=false outputLanguage=es6 referrer=a=b");
        assert!(opts.flag("debug"));
        assert!(!opts.flag("sourceMaps"));
        assert_eq!(opts.get("outputLanguage"), Some(&OptionValue::Str("es6".to_string())));
        assert_eq!(opts.get("referrer"), Some(&OptionValue::Str("a=b".to_string())));
    }

    #[test]
    fn experimental_expands_to_preset() {
        let mut opts = CompilerOptions::default();
        opts.apply("+experimental");
        for name in EXPERIMENTAL {
            assert!(opts.flag(name), "{name} should be enabled");
        }
        assert!(!opts.flag("exponentiation"));
    }

    #[test]
    fn unknown_key_expands_by_prefix() {
        let mut opts = CompilerOptions::default();
        opts.apply("-unicode");
        assert!(!opts.flag("unicodeExpressions"));
        assert!(!opts.flag("unicodeEscapeSequences"));
        opts.apply("+generator");
        assert!(opts.flag("generators"));
        assert!(opts.flag("generatorComprehension"));
    }

    #[test]
    fn junk_tokens_change_nothing() {
        let mut opts = CompilerOptions::default();
        opts.apply("nonsense +nosuchoption + - =x");
        assert_eq!(opts, CompilerOptions::default());
    }

    #[test]
    fn dump_lists_every_option() {
        let mut opts = CompilerOptions::default();
        opts.apply("-classes");
        let dump = opts.to_string();
        assert!(dump.starts_with("{\n  annotations: false,\n"));
        assert!(dump.contains("  classes: false,\n"));
        assert!(dump.contains("  modules: 'register',\n"));
        assert!(dump.contains("  typeAssertionModule: null,\n"));
        assert!(dump.ends_with("  validate: false,\n}"));
    }
}
