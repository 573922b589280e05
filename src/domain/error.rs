//! Domain error types.

/// A formula compile error with position information.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self, input: &str) -> String {
        let column = input
            .get(..self.position)
            .unwrap_or(input)
            .chars()
            .count();
        let caret = " ".repeat(column) + "^";
        format!(
            "{input}\n{caret}\n{err}",
            input = input,
            caret = caret,
            err = self
        )
    }
}

/// Top-level error type for covid-explorer.
#[derive(Debug, thiserror::Error)]
pub enum ExplorerError {
    #[error("malformed record {index} for {country}: {reason}")]
    MalformedInput {
        country: String,
        index: usize,
        reason: String,
    },

    #[error(transparent)]
    FormulaCompile(#[from] ParseError),

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("invalid state transition: {reason}")]
    State { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&ExplorerError> for std::process::ExitCode {
    fn from(err: &ExplorerError) -> Self {
        let code: u8 = match err {
            ExplorerError::Io(_) => 1,
            ExplorerError::ConfigParse { .. }
            | ExplorerError::ConfigMissing { .. }
            | ExplorerError::ConfigInvalid { .. } => 2,
            ExplorerError::DataSource { .. } | ExplorerError::MalformedInput { .. } => 3,
            ExplorerError::FormulaCompile(_) => 4,
            ExplorerError::State { .. } => 5,
            ExplorerError::Report { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
