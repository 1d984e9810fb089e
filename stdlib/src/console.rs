use std::cell::{Cell, RefCell};
use std::io::{self, BufRead, Cursor, Write};
use std::rc::Rc;

use tracing::warn;

enum Sink {
    Stdout,
    Buffer(String),
}

enum Source {
    Stdin,
    Buffer(Cursor<Vec<u8>>),
}

/// Text console shared by `print`, `input` and the demo bindings.
///
/// End of input is not an error: `input()` returns an empty string and the
/// console remembers it, see [`Console::eof`].
pub struct Console {
    out: RefCell<Sink>,
    input: RefCell<Source>,
    eof: Cell<bool>,
}

impl Console {
    /// Console on the process stdin/stdout.
    pub fn stdio() -> Rc<Self> {
        Rc::new(Self {
            out: RefCell::new(Sink::Stdout),
            input: RefCell::new(Source::Stdin),
            eof: Cell::new(false),
        })
    }

    /// Console that reads `input` and records everything written.
    pub fn scripted(input: &str) -> Rc<Self> {
        Rc::new(Self {
            out: RefCell::new(Sink::Buffer(String::new())),
            input: RefCell::new(Source::Buffer(Cursor::new(input.as_bytes().to_vec()))),
            eof: Cell::new(false),
        })
    }

    pub fn write(&self, text: &str) {
        match &mut *self.out.borrow_mut() {
            Sink::Stdout => {
                let mut out = io::stdout().lock();
                if let Err(e) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
                    warn!(target: "tether::console", error = %e, "stdout write failed");
                }
            }
            Sink::Buffer(buf) => buf.push_str(text),
        }
    }

    /// Read one line without its terminator. `None` at end of input, which
    /// also raises the EOF flag.
    pub fn read_line(&self) -> Option<String> {
        let mut line = String::new();
        let read = match &mut *self.input.borrow_mut() {
            Source::Stdin => io::stdin().lock().read_line(&mut line),
            Source::Buffer(cursor) => cursor.read_line(&mut line),
        };
        match read {
            Ok(0) => {
                self.eof.set(true);
                None
            }
            Ok(_) => {
                if line.ends_with('\n') {
                    line.pop();
                    if line.ends_with('\r') {
                        line.pop();
                    }
                }
                Some(line)
            }
            Err(e) => {
                warn!(target: "tether::console", error = %e, "stdin read failed");
                self.eof.set(true);
                None
            }
        }
    }

    /// Whether a read has hit end of input.
    pub fn eof(&self) -> bool {
        self.eof.get()
    }

    /// Text written so far; always empty on a stdio console.
    pub fn output(&self) -> String {
        match &*self.out.borrow() {
            Sink::Stdout => String::new(),
            Sink::Buffer(buf) => buf.clone(),
        }
    }
}
