use crate::strumenti::{ensure_range, round2, StrumentoError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumuloInput {
    pub initial_capital: f64,
    #[serde(default)]
    pub monthly_contribution: f64,
    pub annual_rate: f64,
    pub years: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumuloYear {
    pub year: u32,
    pub contributed: f64,
    pub value: f64,
    pub interest: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumuloResult {
    pub final_value: f64,
    pub total_contributed: f64,
    pub total_interest: f64,
    pub years: Vec<AccumuloYear>,
}

/// Monthly compounding at `annual_rate / 12`; contributions are paid at the
/// end of each month.
pub fn calcola(input: &AccumuloInput) -> Result<AccumuloResult, StrumentoError> {
    ensure_range("initialCapital", input.initial_capital, 0.0, 1.0e9)?;
    ensure_range("monthlyContribution", input.monthly_contribution, 0.0, 1.0e7)?;
    ensure_range("annualRate", input.annual_rate, -10.0, 30.0)?;
    ensure_range("years", input.years as f64, 1.0, 60.0)?;

    let monthly_rate = input.annual_rate / 100.0 / 12.0;
    let mut value = input.initial_capital;
    let mut contributed = input.initial_capital;
    let mut rows = Vec::with_capacity(input.years as usize);

    for year in 1..=input.years {
        for _ in 0..12 {
            value = value * (1.0 + monthly_rate) + input.monthly_contribution;
            contributed += input.monthly_contribution;
        }
        rows.push(AccumuloYear {
            year,
            contributed: round2(contributed),
            value: round2(value),
            interest: round2(value - contributed),
        });
    }

    Ok(AccumuloResult {
        final_value: round2(value),
        total_contributed: round2(contributed),
        total_interest: round2(value - contributed),
        years: rows,
    })
}
