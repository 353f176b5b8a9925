/*!
The text collaborators: where help and error text goes, and where prompt
responses come from.

The process implementations ([`Stdout`], [`Stderr`], [`Stdin`]) are what
standalone invocations use. [`Buffer`] and [`ScriptedInput`] are in-memory
stand ins, for tests and for embedding a command inside another program.
 */

use std::{
    cell::RefCell,
    collections::VecDeque,
    fmt,
    io::{self, BufRead as _, IsTerminal as _, Write as _},
    rc::Rc,
};

/// A sink for help, usage, and error text.
pub trait Output {
    fn write(&self, text: &str) -> io::Result<()>;

    /// Whether this sink renders terminal styling. The core never styles its
    /// own output, but handlers may want to know.
    fn supports_color(&self) -> bool {
        false
    }
}

/**
A source of lines, used only while prompting.

`read_line` returns `Ok(None)` at end of input, which the prompt step turns
into an abort. When `hidden` is true, the implementation should avoid
echoing what's typed; the process implementation relies on the terminal to
do this, since line editing mechanics are outside the scope of parley.
 */
pub trait Input {
    fn read_line(&self, hidden: bool) -> io::Result<Option<String>>;
}

/// The process's standard output
#[derive(Debug, Clone, Copy, Default)]
pub struct Stdout;

impl Output for Stdout {
    fn write(&self, text: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(text.as_bytes())?;
        out.flush()
    }

    fn supports_color(&self) -> bool {
        io::stdout().is_terminal()
    }
}

/// The process's standard error
#[derive(Debug, Clone, Copy, Default)]
pub struct Stderr;

impl Output for Stderr {
    fn write(&self, text: &str) -> io::Result<()> {
        io::stderr().lock().write_all(text.as_bytes())
    }

    fn supports_color(&self) -> bool {
        io::stderr().is_terminal()
    }
}

/// The process's standard input
#[derive(Debug, Clone, Copy, Default)]
pub struct Stdin;

impl Input for Stdin {
    fn read_line(&self, _hidden: bool) -> io::Result<Option<String>> {
        let mut line = String::new();

        match io::stdin().lock().read_line(&mut line)? {
            0 => Ok(None),
            _ => {
                let trimmed = line.trim_end_matches(['\n', '\r']).len();
                line.truncate(trimmed);
                Ok(Some(line))
            }
        }
    }
}

/**
An in-memory [`Output`]. Clones share the same underlying text, so a test
can keep one clone and hand another to an invocation.
 */
#[derive(Clone, Default)]
pub struct Buffer(Rc<RefCell<String>>);

impl Buffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of everything written so far
    #[must_use]
    pub fn contents(&self) -> String {
        self.0.borrow().clone()
    }

    /// Take everything written so far, leaving the buffer empty
    pub fn take(&self) -> String {
        self.0.take()
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Buffer").field(&*self.0.borrow()).finish()
    }
}

impl Output for Buffer {
    fn write(&self, text: &str) -> io::Result<()> {
        self.0.borrow_mut().push_str(text);
        Ok(())
    }
}

/// An [`Input`] that replays a fixed list of lines, then reports end of
/// input.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    lines: RefCell<VecDeque<String>>,
}

impl ScriptedInput {
    pub fn new<I>(lines: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            lines: RefCell::new(lines.into_iter().map(Into::into).collect()),
        }
    }

    /// The number of lines that haven't been read yet
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.lines.borrow().len()
    }
}

impl Input for ScriptedInput {
    fn read_line(&self, _hidden: bool) -> io::Result<Option<String>> {
        Ok(self.lines.borrow_mut().pop_front())
    }
}

impl<T: Output + ?Sized> Output for Rc<T> {
    fn write(&self, text: &str) -> io::Result<()> {
        T::write(self, text)
    }

    fn supports_color(&self) -> bool {
        T::supports_color(self)
    }
}

impl<T: Input + ?Sized> Input for Rc<T> {
    fn read_line(&self, hidden: bool) -> io::Result<Option<String>> {
        T::read_line(self, hidden)
    }
}
