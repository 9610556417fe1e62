use thiserror::Error;

pub type PlotResult<T> = Result<T, PlotError>;

#[derive(Debug, Error)]
pub enum PlotError {
    /// A referenced header is missing, has the wrong type, or a structural
    /// precondition (zero axes, zero series, bad width) does not hold.
    #[error("invalid '{parameter}': {message}")]
    Configuration { parameter: String, message: String },

    #[error("this figure can handle only {capacity} subplots")]
    Capacity { capacity: usize },

    #[error("render failed: {0:#}")]
    Render(#[from] anyhow::Error),

    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to load table: {0}")]
    Load(String),
}

impl PlotError {
    pub fn config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        PlotError::Configuration {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Shorthand for the common "column not found" configuration failure.
    pub fn unknown_column(parameter: impl Into<String>, column: &str) -> Self {
        PlotError::config(parameter, format!("column '{}' not found", column))
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, PlotError::Configuration { .. })
    }
}
