use std::fmt;

/// Script-visible error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    TypeError,
    /// A typed binding could not marshal one of its arguments.
    ArgumentTypeError,
    AttributeError,
    NameError,
    ValueError,
    ZeroDivisionError,
    RecursionError,
    RuntimeError,
    SyntaxError,
    /// Misuse of the explicit value stack by the host.
    StackError,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ArgumentTypeError => "ArgumentTypeError",
            ErrorKind::AttributeError => "AttributeError",
            ErrorKind::NameError => "NameError",
            ErrorKind::ValueError => "ValueError",
            ErrorKind::ZeroDivisionError => "ZeroDivisionError",
            ErrorKind::RecursionError => "RecursionError",
            ErrorKind::RuntimeError => "RuntimeError",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::StackError => "StackError",
        }
    }

    /// Whether an `except <name>:` clause catches this kind.
    ///
    /// `ArgumentTypeError` is a `TypeError`; `Exception` catches everything.
    pub fn matches(self, name: &str) -> bool {
        name == "Exception" || name == self.name() || (self == ErrorKind::ArgumentTypeError && name == "TypeError")
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error raised while executing script code or a bound native call.
#[derive(Debug, Clone, PartialEq)]
pub struct VmError {
    pub kind: ErrorKind,
    pub message: String,
    pub filename: Option<String>,
    pub line: Option<u32>,
}

pub type VmResult<T> = std::result::Result<T, VmError>;

impl VmError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            filename: None,
            line: None,
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    pub fn argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ArgumentTypeError, message)
    }

    pub fn attribute(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AttributeError, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RuntimeError, message)
    }

    pub fn syntax(message: impl Into<String>, line: u32) -> Self {
        Self {
            line: Some(line),
            ..Self::new(ErrorKind::SyntaxError, message)
        }
    }

    /// Attach a source location unless one is already recorded.
    pub fn at(mut self, filename: &str, line: u32) -> Self {
        if self.line.is_none() {
            self.line = Some(line);
        }
        if self.filename.is_none() {
            self.filename = Some(filename.to_string());
        }
        self
    }

    /// Convert an error returned by a raw native callable.
    ///
    /// A `VmError` travelling inside the `anyhow::Error` keeps its kind;
    /// anything else becomes a `RuntimeError` carrying the full context chain.
    pub fn from_native(err: anyhow::Error) -> Self {
        match err.downcast::<VmError>() {
            Ok(vm_err) => vm_err,
            Err(other) => VmError::runtime(format!("{:#}", other)),
        }
    }
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.filename, self.line) {
            (Some(file), Some(line)) => write!(f, "{}:{}: {}: {}", file, line, self.kind, self.message),
            (None, Some(line)) => write!(f, "line {}: {}: {}", line, self.kind, self.message),
            _ => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for VmError {}
