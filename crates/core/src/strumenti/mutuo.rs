use crate::strumenti::{ensure_range, round2, StrumentoError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutuoInput {
    pub principal: f64,
    pub annual_rate: f64,
    pub years: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rata {
    pub month: u32,
    pub instalment: f64,
    pub principal: f64,
    pub interest: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutuoResult {
    pub monthly_instalment: f64,
    pub total_paid: f64,
    pub total_interest: f64,
    pub schedule: Vec<Rata>,
}

/// Constant-instalment (French) amortization with monthly payments.
pub fn calcola(input: &MutuoInput) -> Result<MutuoResult, StrumentoError> {
    ensure_range("principal", input.principal, 1.0, 1.0e8)?;
    ensure_range("annualRate", input.annual_rate, 0.0, 30.0)?;
    ensure_range("years", input.years as f64, 1.0, 40.0)?;

    let months = input.years * 12;
    let r = input.annual_rate / 100.0 / 12.0;
    let instalment = if r == 0.0 {
        input.principal / months as f64
    } else {
        input.principal * r / (1.0 - (1.0 + r).powi(-(months as i32)))
    };

    let mut balance = input.principal;
    let mut total_interest = 0.0;
    let mut schedule = Vec::with_capacity(months as usize);
    for month in 1..=months {
        let interest = balance * r;
        // Last instalment absorbs accumulated float error.
        let principal = if month == months {
            balance
        } else {
            instalment - interest
        };
        balance = (balance - principal).max(0.0);
        total_interest += interest;

        schedule.push(Rata {
            month,
            instalment: round2(principal + interest),
            principal: round2(principal),
            interest: round2(interest),
            balance: round2(balance),
        });
    }

    Ok(MutuoResult {
        monthly_instalment: round2(instalment),
        total_paid: round2(input.principal + total_interest),
        total_interest: round2(total_interest),
        schedule,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_instalment() {
        let res = calcola(&MutuoInput {
            principal: 100_000.0,
            annual_rate: 3.0,
            years: 20,
        })
        .unwrap();
        assert_eq!(res.monthly_instalment, 554.6);
        assert_eq!(res.schedule.len(), 240);
        assert_eq!(res.schedule.last().unwrap().balance, 0.0);
        // First month: interest on the full principal.
        assert_eq!(res.schedule[0].interest, 250.0);
        assert!((res.total_interest - (554.6 * 240.0 - 100_000.0)).abs() < 5.0);
    }

    #[test]
    fn zero_rate_splits_principal_evenly() {
        let res = calcola(&MutuoInput {
            principal: 120_000.0,
            annual_rate: 0.0,
            years: 10,
        })
        .unwrap();
        assert_eq!(res.monthly_instalment, 1000.0);
        assert_eq!(res.total_interest, 0.0);
        assert_eq!(res.total_paid, 120_000.0);
    }

    #[test]
    fn principal_share_grows_over_time() {
        let res = calcola(&MutuoInput {
            principal: 200_000.0,
            annual_rate: 4.0,
            years: 25,
        })
        .unwrap();
        let first = &res.schedule[0];
        let mid = &res.schedule[150];
        assert!(mid.principal > first.principal);
        assert!(mid.interest < first.interest);
    }

    #[test]
    fn rejects_zero_duration() {
        assert!(calcola(&MutuoInput {
            principal: 100_000.0,
            annual_rate: 3.0,
            years: 0,
        })
        .is_err());
    }
}
