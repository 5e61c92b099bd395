use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    /// A required field is empty; callers show an "enter details" state.
    #[error("enter {0} to see results")]
    MissingInput(&'static str),

    #[error("{0}")]
    Domain(String),

    #[error("calculation error: {0}")]
    Numeric(&'static str),
}

impl CalcError {
    pub fn domain(msg: impl Into<String>) -> Self {
        CalcError::Domain(msg.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CalcError::MissingInput(_) => "missing-input",
            CalcError::Domain(_) => "domain",
            CalcError::Numeric(_) => "numeric",
        }
    }
}

pub type CalcResult<T> = Result<T, CalcError>;

/// Rejects NaN and infinities produced by a formula.
pub fn ensure_finite(value: f64, what: &'static str) -> CalcResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::Numeric(what))
    }
}

pub fn require<T>(value: Option<T>, field: &'static str) -> CalcResult<T> {
    value.ok_or(CalcError::MissingInput(field))
}
