use std::fs;
use std::io;
use std::path::Path;

/// Reads source files for `:tfile`.
pub trait SourceLoader {
    fn read_source(&self, path: &Path) -> io::Result<String>;
}

/// Loads UTF-8 files from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn read_source(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}
