use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use thiserror::Error;

pub type CompileResult<T> = Result<T, CompileError>;

pub struct VecErr<T: Error> {
    pub inner: Vec<T>,
}

impl<T: Error> Debug for VecErr<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(&self.inner).finish()
    }
}

impl<T: Error + Display> Display for VecErr<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(&self.inner).finish()
    }
}

impl<T: Error> std::error::Error for VecErr<T> {}

impl<T: Error> From<Vec<T>> for VecErr<T> {
    fn from(inner: Vec<T>) -> Self {
        VecErr { inner }
    }
}

/// Every way a single stage compilation can fail.
///
/// Errors abort the enclosing compilation at the point of detection; no
/// component catches and retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("unsupported construct '{construct}': {reason}")]
    UnsupportedConstruct { construct: String, reason: String },
    #[error("{stage} shader is missing layout metadata; {hint}")]
    MissingLayoutMetadata {
        stage: &'static str,
        hint: &'static str,
    },
    #[error("unresolved type marker '{0}'")]
    UnresolvedType(String),
    #[error("malformed declaration: {0}")]
    MalformedDeclaration(String),
    #[error("inconsistent indentation on line {line}: {message}")]
    Indentation { line: usize, message: String },
    #[error("syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("unknown symbol '{0}'")]
    UnknownSymbol(String),
}

impl CompileError {
    pub fn unsupported(construct: impl Into<String>, reason: impl Into<String>) -> Self {
        CompileError::UnsupportedConstruct {
            construct: construct.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        CompileError::MalformedDeclaration(message.into())
    }

    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        CompileError::Syntax {
            line,
            message: message.into(),
        }
    }

    pub fn indentation(line: usize, message: impl Into<String>) -> Self {
        CompileError::Indentation {
            line,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "validate")]
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("naga has no frontend for {0} shaders")]
    UnsupportedStage(&'static str),
    #[error("unable to parse GLSL: {0:#?}")]
    GLSLParse(#[from] VecErr<naga::front::glsl::Error>),
    #[error("unable to validate shader: {0}")]
    Validation(String),
}
