use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("template execution error at line {line}: {message}")]
    Exec { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, TemplateError>;

pub(crate) fn parse_err(line: usize, message: impl Into<String>) -> TemplateError {
    TemplateError::Parse {
        line,
        message: message.into(),
    }
}

pub(crate) fn exec_err(line: usize, message: impl Into<String>) -> TemplateError {
    TemplateError::Exec {
        line,
        message: message.into(),
    }
}
