use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{Answers, CantonCode, MaritalStatus};

/// Income declared per source, before any deduction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeSources {
    pub employment: Decimal,
    pub self_employment: Decimal,
    pub capital: Decimal,
    /// Rental income not attached to a listed property.
    pub rental: Decimal,
    pub pension: Decimal,
    pub foreign: Decimal,
    pub other: Decimal,
}

/// Terms of the employment relationship that drive social insurance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmploymentTerms {
    /// Percentage of a full-time position, `100` for full time.
    pub work_percentage: Decimal,
    /// Employer-supplied non-occupational accident rate, if known.
    pub nbu_rate: Option<Decimal>,
}

impl Default for EmploymentTerms {
    fn default() -> Self {
        Self {
            work_percentage: Decimal::ONE_HUNDRED,
            nbu_rate: None,
        }
    }
}

/// Amounts the taxpayer elected to deduct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionElections {
    pub pillar_3a: Decimal,
    /// Itemized premiums; zero means "use the standard amount".
    pub insurance_premiums: Decimal,
    pub medical_expenses: Decimal,
    pub alimony_paid: Decimal,
}

/// A property the taxpayer owns, possibly in another canton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyEntry {
    pub canton: CantonCode,
    #[serde(default)]
    pub municipality: Option<String>,
    pub annual_rental_income: Decimal,
    pub mortgage_interest: Decimal,
    pub maintenance_costs: Decimal,
}

impl PropertyEntry {
    /// Mortgage interest plus maintenance, the deductible property costs.
    /// `None` if the sum overflows.
    pub fn deductible_costs(&self) -> Option<Decimal> {
        self.mortgage_interest.checked_add(self.maintenance_costs)
    }
}

/// Typed view of a taxpayer's answers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxProfile {
    pub marital_status: MaritalStatus,
    pub num_children: u32,
    pub age: Option<u32>,
    /// Canton of residence as answered. Filings carry their own canton; a
    /// primary filing elsewhere is calculated with a warning.
    pub canton: Option<CantonCode>,
    pub municipality: Option<String>,
    pub income: IncomeSources,
    pub employment: EmploymentTerms,
    pub deductions: DeductionElections,
    pub pays_church_tax: bool,
    pub denomination: Option<String>,
    pub has_wealth: bool,
    pub net_wealth: Decimal,
    pub properties: Vec<PropertyEntry>,
}

impl TaxProfile {
    /// Builds a profile from raw answers. Never fails: unparseable values
    /// fall back to zero or "not answered".
    pub fn from_answers(answers: &Answers) -> Self {
        let marital_status = answers
            .text("marital_status")
            .map(|s| MaritalStatus::parse(&s))
            .unwrap_or_default();

        let work_percentage = answers
            .optional_amount("work_percentage")
            .filter(|wp| *wp > Decimal::ZERO)
            .unwrap_or(Decimal::ONE_HUNDRED);

        let properties = answers
            .list("properties")
            .iter()
            .filter_map(property_from_answers)
            .collect::<Vec<_>>();

        let profile = Self {
            marital_status,
            num_children: answers.count("num_children"),
            age: answers.optional_count("age"),
            canton: answers.text("canton").map(CantonCode::new),
            municipality: answers.text("municipality"),
            income: IncomeSources {
                employment: answers.amount("employment_income"),
                self_employment: answers.amount("self_employment_income"),
                capital: answers.amount("capital_income"),
                rental: answers.amount("rental_income"),
                pension: answers.amount("pension_income"),
                foreign: answers.amount("foreign_income"),
                other: answers.amount("other_income"),
            },
            employment: EmploymentTerms {
                work_percentage,
                nbu_rate: answers.optional_amount("nbu_rate").filter(|r| !r.is_zero()),
            },
            deductions: DeductionElections {
                pillar_3a: answers.amount("pillar_3a"),
                insurance_premiums: answers.amount("insurance_premiums"),
                medical_expenses: answers.amount("medical_expenses"),
                alimony_paid: answers.amount("alimony_paid"),
            },
            pays_church_tax: answers.flag("pays_church_tax") || answers.flag("church_member"),
            denomination: answers.text("denomination"),
            has_wealth: answers.flag("has_wealth"),
            net_wealth: answers.amount("net_wealth"),
            properties,
        };

        debug!(
            marital_status = %profile.marital_status,
            num_children = profile.num_children,
            properties = profile.properties.len(),
            "profile built from answers"
        );

        profile
    }

    /// Properties located in `canton`.
    pub fn properties_in<'a>(
        &'a self,
        canton: &'a CantonCode,
    ) -> impl Iterator<Item = &'a PropertyEntry> + 'a {
        self.properties.iter().filter(move |p| &p.canton == canton)
    }
}

fn property_from_answers(answers: &Answers) -> Option<PropertyEntry> {
    let Some(canton) = answers.text("canton") else {
        warn!("property entry without canton; skipping");
        return None;
    };

    Some(PropertyEntry {
        canton: CantonCode::new(canton),
        municipality: answers.text("municipality"),
        annual_rental_income: answers.amount("annual_rental_income"),
        mortgage_interest: answers.amount("mortgage_interest"),
        maintenance_costs: answers.amount("maintenance_costs"),
    })
}
