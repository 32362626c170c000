use crate::strumenti::{ensure_range, round2, StrumentoError};
use serde::{Deserialize, Serialize};

/// IRPEF brackets in force from 2024: upper bound (inclusive) and rate.
pub const SCAGLIONI: [(f64, f64); 3] = [(28_000.0, 0.23), (50_000.0, 0.35), (f64::INFINITY, 0.43)];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrpefInput {
    pub taxable_income: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scaglione {
    pub from: f64,
    pub to: Option<f64>,
    pub rate: f64,
    pub taxable: f64,
    pub tax: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IrpefResult {
    pub gross_tax: f64,
    pub average_rate: f64,
    pub marginal_rate: f64,
    pub net_income: f64,
    pub brackets: Vec<Scaglione>,
}

/// Gross IRPEF before deductions (detrazioni) and regional/municipal surcharges.
pub fn calcola(input: &IrpefInput) -> Result<IrpefResult, StrumentoError> {
    ensure_range("taxableIncome", input.taxable_income, 0.0, 1.0e9)?;

    let income = input.taxable_income;
    let mut lower = 0.0;
    let mut gross_tax = 0.0;
    let mut marginal_rate = SCAGLIONI[0].1;
    let mut brackets = Vec::with_capacity(SCAGLIONI.len());

    for (upper, rate) in SCAGLIONI {
        let taxable = (income.min(upper) - lower).max(0.0);
        let tax = taxable * rate;
        if income > lower {
            marginal_rate = rate;
        }
        gross_tax += tax;
        brackets.push(Scaglione {
            from: lower,
            to: upper.is_finite().then_some(upper),
            rate: rate * 100.0,
            taxable: round2(taxable),
            tax: round2(tax),
        });
        lower = upper;
    }

    let average_rate = if income > 0.0 { gross_tax / income * 100.0 } else { 0.0 };

    Ok(IrpefResult {
        gross_tax: round2(gross_tax),
        average_rate: round2(average_rate),
        marginal_rate: marginal_rate * 100.0,
        net_income: round2(income - gross_tax),
        brackets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tax(income: f64) -> IrpefResult {
        calcola(&IrpefInput {
            taxable_income: income,
        })
        .unwrap()
    }

    #[test]
    fn first_bracket_only() {
        let res = tax(20_000.0);
        assert_eq!(res.gross_tax, 4_600.0);
        assert_eq!(res.marginal_rate, 23.0);
        assert_eq!(res.brackets[1].taxable, 0.0);
    }

    #[test]
    fn spans_two_brackets() {
        let res = tax(40_000.0);
        assert_eq!(res.gross_tax, 10_640.0);
        assert_eq!(res.marginal_rate, 35.0);
        assert_eq!(res.average_rate, 26.6);
        assert_eq!(res.net_income, 29_360.0);
    }

    #[test]
    fn top_bracket() {
        let res = tax(60_000.0);
        assert_eq!(res.gross_tax, 18_440.0);
        assert_eq!(res.marginal_rate, 43.0);
        assert_eq!(res.brackets[2].to, None);
        assert_eq!(res.brackets[2].taxable, 10_000.0);
    }

    #[test]
    fn boundary_income_stays_in_lower_bracket() {
        let res = tax(28_000.0);
        assert_eq!(res.gross_tax, 6_440.0);
        assert_eq!(res.marginal_rate, 23.0);
    }

    #[test]
    fn zero_income() {
        let res = tax(0.0);
        assert_eq!(res.gross_tax, 0.0);
        assert_eq!(res.average_rate, 0.0);
    }
}
