//! Clipboard access for `:paste` and `:tpaste`.

use std::borrow::Cow;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::env::Environment;

/// Source of pasted text.
pub trait Clipboard {
    fn read(&self) -> io::Result<String>;
}

/// Known clipboard readers, tried in order.
const UTILITIES: &[(&str, &[&str])] = &[
    ("pbpaste", &[]),
    (
        "powershell",
        &["-NoProfile", "-Command", "Get-Clipboard"],
    ),
    ("wl-paste", &["--no-newline"]),
    ("xclip", &["-selection", "clipboard", "-o"]),
    ("xsel", &["--clipboard", "--output"]),
];

/// Reads the system clipboard by running the first platform utility found on
/// the session `PATH`.
#[derive(Debug, Clone)]
pub struct SystemClipboard {
    search_paths: String,
    current_dir: PathBuf,
}

impl SystemClipboard {
    pub fn new(env: &Environment) -> Self {
        Self {
            search_paths: env.get_var("PATH").unwrap_or_default(),
            current_dir: env.current_dir.clone(),
        }
    }

    fn locate(&self) -> Option<(PathBuf, &'static str, &'static [&'static str])> {
        UTILITIES.iter().find_map(|&(name, args)| {
            find_command_path(OsStr::new(&self.search_paths), Path::new(name))
                .map(|path| (path.into_owned(), name, args))
        })
    }
}

impl Clipboard for SystemClipboard {
    fn read(&self) -> io::Result<String> {
        let Some((path, name, args)) = self.locate() else {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "no clipboard utility found on PATH",
            ));
        };
        debug!(utility = name, path = %path.display(), "reading clipboard");
        let output = Command::new(&path)
            .args(args)
            .current_dir(&self.current_dir)
            .output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(io::Error::other(format!(
                "{name} failed ({}): {}",
                output.status,
                stderr.trim()
            )));
        }
        String::from_utf8(output.stdout)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// Resolve a command path the way a typical shell would.
///
/// Absolute and multi-component paths are returned if they exist; a single
/// component is searched for in each directory of `search_paths`.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }
    let mut components = path.components();
    match (components.next(), components.next()) {
        (None, _) => None,
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths).find_map(|dir| {
        let path = dir.join(cmd);
        find_by_path(&path).map(Path::to_path_buf)
    })
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.is_file() { Some(path) } else { None }
}
