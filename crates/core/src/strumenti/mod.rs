//! Calculators behind the "strumenti" pages. Pure functions over validated
//! inputs; amounts are euros rounded to the cent on output.

pub mod interesse_composto;
pub mod irpef;
pub mod mutuo;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrumentoError {
    #[error("invalid input: {field} {reason}")]
    InvalidInput { field: &'static str, reason: String },
}

pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub(crate) fn ensure_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), StrumentoError> {
    if !value.is_finite() || value < min || value > max {
        return Err(StrumentoError::InvalidInput {
            field,
            reason: format!("must be between {min} and {max} (got {value})"),
        });
    }
    Ok(())
}
