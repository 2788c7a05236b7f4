//! Indentation-tracking text builder used by every emitter.
//!
//! Indent guards share the level through `Rc<Cell<usize>>`, so a guard can
//! stay alive while the writer is borrowed mutably for writes:
//!
//! ```
//! use protowiz_core::emit::code_writer::CodeWriter;
//!
//! let mut w = CodeWriter::new();
//! w.block("message GrpcPerson", |w| w.writeln("int32 id = 1;"))
//!     .unwrap();
//! assert_eq!(w.finish(), "message GrpcPerson {\n    int32 id = 1;\n}\n");
//! ```

use std::cell::Cell;
use std::fmt::{self, Write as _};
use std::rc::Rc;

const INDENT: &str = "    ";

pub struct CodeWriter {
    out: String,
    level: Rc<Cell<usize>>,
    at_line_start: bool,
}

impl Default for CodeWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeWriter {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            level: Rc::new(Cell::new(0)),
            at_line_start: true,
        }
    }

    /// Append text, indenting first if a line is starting.
    pub fn write(&mut self, text: &str) -> fmt::Result {
        if text.is_empty() {
            return Ok(());
        }
        if self.at_line_start && !text.trim().is_empty() {
            for _ in 0..self.level.get() {
                self.out.write_str(INDENT)?;
            }
            self.at_line_start = false;
        }
        self.out.write_str(text)
    }

    pub fn writeln(&mut self, text: &str) -> fmt::Result {
        self.write(text)?;
        self.out.write_char('\n')?;
        self.at_line_start = true;
        Ok(())
    }

    pub fn blank_line(&mut self) -> fmt::Result {
        self.out.write_char('\n')?;
        self.at_line_start = true;
        Ok(())
    }

    /// Indentation increases while the guard is alive.
    pub fn indent(&mut self) -> IndentGuard {
        self.level.set(self.level.get() + 1);
        IndentGuard {
            level: Rc::clone(&self.level),
        }
    }

    /// One `//!` line per line of `text`.
    pub fn module_doc(&mut self, text: &str) -> fmt::Result {
        for line in text.lines() {
            if line.is_empty() {
                self.writeln("//!")?;
            } else {
                self.writeln(&format!("//! {line}"))?;
            }
        }
        Ok(())
    }

    /// `header {`, an indented body, then `}`.
    ///
    /// The body may fail with any error that a formatting error converts into.
    pub fn block<F, E>(&mut self, header: &str, body: F) -> Result<(), E>
    where
        F: FnOnce(&mut Self) -> Result<(), E>,
        E: From<fmt::Error>,
    {
        self.writeln(&format!("{header} {{"))?;
        {
            let _indent = self.indent();
            body(self)?;
        }
        self.writeln("}")?;
        Ok(())
    }

    /// A body opened by `{` on its own line, for items ending in a `where` clause.
    pub fn braced<F, E>(&mut self, body: F) -> Result<(), E>
    where
        F: FnOnce(&mut Self) -> Result<(), E>,
        E: From<fmt::Error>,
    {
        self.writeln("{")?;
        {
            let _indent = self.indent();
            body(self)?;
        }
        self.writeln("}")?;
        Ok(())
    }

    #[doc(hidden)]
    pub fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        let text = fmt::format(args);
        self.write(&text)
    }

    #[doc(hidden)]
    pub fn writeln_fmt(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        let text = fmt::format(args);
        self.writeln(&text)
    }

    pub fn finish(self) -> String {
        self.out
    }
}

pub struct IndentGuard {
    level: Rc<Cell<usize>>,
}

impl Drop for IndentGuard {
    fn drop(&mut self) {
        self.level.set(self.level.get().saturating_sub(1));
    }
}

/// `writeln!` for a [`CodeWriter`].
#[macro_export]
macro_rules! cw_writeln {
    ($writer:expr, $($arg:tt)*) => {
        $writer.writeln_fmt(format_args!($($arg)*))
    };
}
