use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::CalculationError;
use crate::calculations::common::{checked_sum, non_negative, round_half_up};
use crate::calculations::income::{FilingScope, IncomeBreakdown};
use crate::models::{DeductionConfig, MaritalStatus, TaxProfile};

/// Deductions per category. Every amount is non-negative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionBreakdown {
    pub social_security: Decimal,
    pub professional_expenses: Decimal,
    pub pillar_3a: Decimal,
    pub insurance_premiums: Decimal,
    pub children: Decimal,
    pub medical_expenses: Decimal,
    pub alimony: Decimal,
    pub general_deduction: Decimal,
    pub property_costs: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Copy)]
pub struct DeductionCalculator<'a> {
    config: &'a DeductionConfig,
}

impl<'a> DeductionCalculator<'a> {
    pub fn new(config: &'a DeductionConfig) -> Self {
        Self { config }
    }

    /// Deductions for one filing.
    ///
    /// A secondary filing only deducts the costs of its own properties.
    /// `social_security_deductible` is the deductible employee share already
    /// computed for this filing.
    ///
    /// # Errors
    ///
    /// [`CalculationError::AmountOverflow`] when a sum is not representable.
    pub fn calculate(
        &self,
        profile: &TaxProfile,
        income: &IncomeBreakdown,
        scope: FilingScope<'_>,
        social_security_deductible: Decimal,
    ) -> Result<DeductionBreakdown, CalculationError> {
        let property_costs = scope
            .properties(profile)
            .try_fold(Decimal::ZERO, |total, p| total.checked_add(p.deductible_costs()?))
            .map(non_negative)
            .ok_or(CalculationError::AmountOverflow("property costs"))?;
        let children = self
            .config
            .child_deduction
            .checked_mul(Decimal::from(profile.num_children))
            .ok_or(CalculationError::AmountOverflow("child deduction"))?;

        let mut deductions = if scope.is_primary() {
            let elections = &profile.deductions;
            DeductionBreakdown {
                social_security: non_negative(social_security_deductible),
                professional_expenses: self.professional_expenses(income.employment),
                pillar_3a: non_negative(elections.pillar_3a).min(self.config.pillar_3a_max),
                insurance_premiums: self.insurance_premiums(elections.insurance_premiums, profile.marital_status),
                children,
                medical_expenses: self.medical_expenses(elections.medical_expenses, income.total),
                alimony: non_negative(elections.alimony_paid),
                general_deduction: self.config.general_deduction,
                property_costs,
                total: Decimal::ZERO,
            }
        } else {
            DeductionBreakdown {
                property_costs,
                ..DeductionBreakdown::default()
            }
        };

        deductions.total = checked_sum([
            deductions.social_security,
            deductions.professional_expenses,
            deductions.pillar_3a,
            deductions.insurance_premiums,
            deductions.children,
            deductions.medical_expenses,
            deductions.alimony,
            deductions.general_deduction,
            deductions.property_costs,
        ])
        .ok_or(CalculationError::AmountOverflow("total deductions"))?;
        Ok(deductions)
    }

    fn professional_expenses(
        &self,
        employment_income: Decimal,
    ) -> Decimal {
        round_half_up(non_negative(employment_income) * self.config.professional_expense_rate)
            .min(self.config.professional_expense_max)
    }

    /// Itemized premiums when given, otherwise the standard amount.
    fn insurance_premiums(
        &self,
        itemized: Decimal,
        marital_status: MaritalStatus,
    ) -> Decimal {
        if itemized > Decimal::ZERO {
            return itemized;
        }
        match marital_status {
            MaritalStatus::Single => self.config.insurance_premium_single,
            MaritalStatus::Married => self.config.insurance_premium_married,
        }
    }

    /// The part of medical expenses above the income threshold.
    fn medical_expenses(
        &self,
        expenses: Decimal,
        total_income: Decimal,
    ) -> Decimal {
        let threshold = non_negative(total_income) * self.config.medical_expense_threshold_rate;
        round_half_up(non_negative(expenses - threshold))
    }
}
