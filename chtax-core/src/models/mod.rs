mod answers;
mod calculation_result;
mod canton;
mod filing;
mod marital_status;
mod profile;
mod tax_bracket;
mod tax_table;
mod tax_year_config;

pub use answers::{Answers, ParseAmountError, parse_amount};
pub use calculation_result::CalculationResult;
pub use canton::CantonCode;
pub use filing::{Filing, FilingId};
pub use marital_status::MaritalStatus;
pub use profile::{DeductionElections, EmploymentTerms, IncomeSources, PropertyEntry, TaxProfile};
pub use tax_bracket::TaxBracket;
pub use tax_table::{JurisdictionTaxTable, TaxTableError};
pub use tax_year_config::{
    AhvConfig, AlvConfig, BvgAgeBand, BvgConfig, DeductionConfig, NbuConfig, SelfEmployedAhvConfig,
    SocialSecurityConfig, TaxYearConfig, TaxYearConfigError,
};
