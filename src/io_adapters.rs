use std::cell::RefCell;
use std::io::{Result as IoResult, Write};
use std::rc::Rc;

/// Memory-backed writer for capturing console output.
///
/// Used wherever a sink is injectable: the interpreter's output and error
/// streams, and the console a script's `print` writes to.
#[derive(Default)]
pub struct MemWriter {
    buf: Rc<RefCell<Vec<u8>>>,
}

/// Shared view of the bytes a [`MemWriter`] has collected.
#[derive(Clone, Default)]
pub struct Captured {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl Captured {
    /// Everything written so far, decoded lossily.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.borrow()).into_owned()
    }

    /// Returns the collected text and clears the buffer.
    pub fn take(&self) -> String {
        let bytes = std::mem::take(&mut *self.buf.borrow_mut());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl MemWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience: create writer and return (writer, handle).
    pub fn with_handle() -> (Self, Captured) {
        let mw = MemWriter::new();
        let handle = Captured {
            buf: mw.buf.clone(),
        };
        (mw, handle)
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_sees_writes() {
        let (mut writer, handle) = MemWriter::with_handle();
        write!(writer, "hello {}", 42).unwrap();
        assert_eq!(handle.contents(), "hello 42");
        assert_eq!(handle.take(), "hello 42");
        assert_eq!(handle.contents(), "");
    }
}
