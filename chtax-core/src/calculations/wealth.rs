use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::calculations::common::{non_negative, round_half_up};
use crate::models::{CantonCode, MaritalStatus};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WealthTaxError {
    #[error("no wealth tax schedule for canton {0}")]
    NoSchedule(CantonCode),

    #[error("net wealth must not be negative, got {0}")]
    NegativeWealth(Decimal),
}

/// A canton's flat wealth tax above a tax-free allowance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WealthSchedule {
    pub exemption_single: Decimal,
    pub exemption_married: Decimal,
    pub rate: Decimal,
}

impl WealthSchedule {
    pub fn exemption(
        &self,
        status: MaritalStatus,
    ) -> Decimal {
        match status {
            MaritalStatus::Single => self.exemption_single,
            MaritalStatus::Married => self.exemption_married,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WealthSchedules(BTreeMap<CantonCode, WealthSchedule>);

impl WealthSchedules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        canton: CantonCode,
        schedule: WealthSchedule,
    ) {
        self.0.insert(canton, schedule);
    }

    pub fn get(
        &self,
        canton: &CantonCode,
    ) -> Option<&WealthSchedule> {
        self.0.get(canton)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WealthTaxBreakdown {
    pub applies: bool,
    pub net_wealth: Decimal,
    pub exemption: Decimal,
    pub taxable_wealth: Decimal,
    pub rate: Decimal,
    pub wealth_tax: Decimal,
    pub error: Option<String>,
}

impl WealthTaxBreakdown {
    pub fn not_applicable(net_wealth: Decimal) -> Self {
        Self {
            applies: false,
            net_wealth,
            exemption: Decimal::ZERO,
            taxable_wealth: Decimal::ZERO,
            rate: Decimal::ZERO,
            wealth_tax: Decimal::ZERO,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WealthTaxService<'a> {
    schedules: &'a WealthSchedules,
}

impl<'a> WealthTaxService<'a> {
    pub fn new(schedules: &'a WealthSchedules) -> Self {
        Self { schedules }
    }

    pub fn calculate(
        &self,
        canton: &CantonCode,
        marital_status: MaritalStatus,
        net_wealth: Decimal,
    ) -> Result<WealthTaxBreakdown, WealthTaxError> {
        if net_wealth < Decimal::ZERO {
            return Err(WealthTaxError::NegativeWealth(net_wealth));
        }
        let schedule = self
            .schedules
            .get(canton)
            .ok_or_else(|| WealthTaxError::NoSchedule(canton.clone()))?;

        let exemption = schedule.exemption(marital_status);
        let taxable_wealth = non_negative(net_wealth - exemption);

        Ok(WealthTaxBreakdown {
            applies: true,
            net_wealth,
            exemption,
            taxable_wealth,
            rate: schedule.rate,
            wealth_tax: round_half_up(taxable_wealth * schedule.rate),
            error: None,
        })
    }

    /// Like [`WealthTaxService::calculate`], but a failure yields a
    /// non-applying breakdown carrying the error message.
    pub fn calculate_or_record(
        &self,
        canton: &CantonCode,
        marital_status: MaritalStatus,
        net_wealth: Decimal,
    ) -> WealthTaxBreakdown {
        self.calculate(canton, marital_status, net_wealth)
            .unwrap_or_else(|e| {
                warn!(%canton, %net_wealth, error = %e, "wealth tax not computed");
                WealthTaxBreakdown {
                    error: Some(e.to_string()),
                    ..WealthTaxBreakdown::not_applicable(net_wealth)
                }
            })
    }
}
