use std::fmt;

/// Registration-time failure. Raised synchronously by the binder and the
/// registry; the offending registration has no effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// `module.name` is already registered in this VM.
    DuplicateClass { module: String, name: String },
    /// The Rust type already backs another class in this VM.
    DuplicateType { type_name: &'static str, existing: String },
    /// A member or module function with this name already exists.
    DuplicateMember { owner: String, name: String },
    MalformedSignature { signature: String, reason: String },
    /// Declared parameter count differs from the native callable's arity.
    ArityMismatch {
        signature: String,
        declared: usize,
        native: usize,
    },
    /// The signature does not start with the implicit `self`/`cls` parameter.
    MissingReceiver { signature: String, expected: &'static str },
    /// A reserved operator name was bound with the wrong shape.
    BadOperator { name: String, reason: String },
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::DuplicateClass { module, name } => {
                write!(f, "class '{}' is already registered in module '{}'", name, module)
            }
            BindError::DuplicateType { type_name, existing } => {
                write!(f, "native type {} is already bound as class '{}'", type_name, existing)
            }
            BindError::DuplicateMember { owner, name } => {
                write!(f, "'{}' already has a member named '{}'", owner, name)
            }
            BindError::MalformedSignature { signature, reason } => {
                write!(f, "malformed signature \"{}\": {}", signature, reason)
            }
            BindError::ArityMismatch {
                signature,
                declared,
                native,
            } => write!(
                f,
                "signature \"{}\" declares {} parameter(s) but the native callable takes {}",
                signature, declared, native
            ),
            BindError::MissingReceiver { signature, expected } => {
                write!(f, "signature \"{}\" must start with '{}'", signature, expected)
            }
            BindError::BadOperator { name, reason } => write!(f, "operator '{}': {}", name, reason),
        }
    }
}

impl std::error::Error for BindError {}
