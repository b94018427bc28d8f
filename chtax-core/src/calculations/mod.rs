//! Tax calculators and the pipeline that combines them.
//!
//! Every calculator is a thin value borrowing its reference data, so the
//! same [`TaxReference`] can serve any number of threads.

pub mod aggregator;
pub mod canton;
pub mod church;
pub mod common;
pub mod computation;
pub mod deductions;
pub mod error;
pub mod federal;
pub mod income;
pub mod municipal;
pub mod reference;
pub mod service;
pub mod social_security;
pub mod wealth;

#[cfg(test)]
pub(crate) mod test_support;

pub use aggregator::{FilingAggregator, FilingOutcome, MultiFilingSummary};
pub use canton::{
    AssessmentMethod, CantonRegistry, CantonRule, CantonTaxBreakdown, CantonTaxCalculator, CantonTaxError,
    FamilyAdjustment,
};
pub use church::{ChurchRates, ChurchTaxBreakdown, ChurchTaxService, Denomination};
pub use computation::Computed;
pub use deductions::{DeductionBreakdown, DeductionCalculator};
pub use error::CalculationError;
pub use federal::FederalTaxCalculator;
pub use income::{FilingScope, IncomeBreakdown};
pub use municipal::{MunicipalMultipliers, MunicipalTax};
pub use reference::TaxReference;
pub use service::TaxCalculationService;
pub use social_security::{
    EmploymentKind, Scheme, SocialSecurityCalculator, SocialSecurityContribution, SocialSecurityError,
    SocialSecuritySummary,
};
pub use wealth::{WealthSchedule, WealthSchedules, WealthTaxBreakdown, WealthTaxError, WealthTaxService};
