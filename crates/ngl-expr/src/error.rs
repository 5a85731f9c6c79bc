/// Errors from parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// The source text does not match the grammar.
    Syntax { offset: usize, message: String },
    /// An identifier is not bound anywhere in the environment.
    Reference(String),
    /// An operation was applied to a value that does not support it.
    Type(String),
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Syntax { offset, message } => {
                write!(f, "syntax error at offset {offset}: {message}")
            }
            Self::Reference(name) => write!(f, "{name} is not defined"),
            Self::Type(message) => write!(f, "type error: {message}"),
        }
    }
}

impl std::error::Error for EvalError {}

impl EvalError {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            offset,
            message: message.into(),
        }
    }
}
