use crate::diagnostic::Diagnostic;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("undefined variable `{name}`")]
    UndefinedVariable { name: String },

    #[error("undefined function `{name}`")]
    UndefinedFunction { name: String },

    #[error("call depth exceeded the limit of {limit}")]
    CallDepthExceeded { limit: usize },

    #[error("failed to write program output: {0}")]
    Output(#[from] io::Error),

    #[error("failed to start the interpreter thread: {0}")]
    Spawn(io::Error),
}

impl ExecutionError {
    pub fn undefined_variable(name: impl Into<String>) -> Self {
        Self::UndefinedVariable { name: name.into() }
    }

    pub fn undefined_function(name: impl Into<String>) -> Self {
        Self::UndefinedFunction { name: name.into() }
    }

    /// Convert to a diagnostic for pretty printing. Execution errors carry
    /// no source location.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::UndefinedVariable { name } => Diagnostic::error(self.to_string())
                .with_code("E0201")
                .with_help(format!("assign `{}` before reading, changing or deleting it", name)),
            Self::UndefinedFunction { name } => Diagnostic::error(self.to_string())
                .with_code("E0202")
                .with_help(format!("declare it first with `{} function ...`", name)),
            Self::CallDepthExceeded { .. } => Diagnostic::error(self.to_string())
                .with_code("E0203")
                .with_note("raise the limit with `--max-call-depth`"),
            Self::Output(_) => Diagnostic::error(self.to_string()).with_code("E0204"),
            Self::Spawn(_) => Diagnostic::error(self.to_string())
                .with_code("E0205")
                .with_note("lower `--max-call-depth` or `--max-nesting` to reserve a smaller stack"),
        }
    }
}
