use std::collections::BTreeMap;
use std::io::Read;

use chtax_core::calculations::{
    AssessmentMethod, CantonRegistry, CantonRule, ChurchRates, Denomination, FamilyAdjustment,
    MunicipalMultipliers, WealthSchedule, WealthSchedules,
};
use chtax_core::{
    CantonCode, JurisdictionTaxTable, MaritalStatus, TaxBracket, TaxReference, TaxTableError, TaxYearConfig,
    TaxYearConfigError,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

/// Jurisdiction code of the federal table in bracket files.
pub const FEDERAL_JURISDICTION: &str = "CH";

/// Errors that can occur when loading reference data.
#[derive(Debug, Error)]
pub enum ReferenceDataError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid marital status '{0}'")]
    InvalidMaritalStatus(String),

    #[error("Invalid assessment method '{method}' for canton {canton}")]
    InvalidMethod { canton: String, method: String },

    #[error("Canton {0}: {1}")]
    IncompleteRule(String, &'static str),

    #[error("Invalid denomination '{0}'")]
    InvalidDenomination(String),

    #[error("Invalid {jurisdiction} table: {source}")]
    InvalidTable {
        jurisdiction: String,
        #[source]
        source: TaxTableError,
    },

    #[error("No {0} brackets found")]
    MissingTable(String),

    #[error("Tax year mismatch: expected {expected}, found {found} in {source_name}")]
    YearMismatch {
        expected: i32,
        found: i32,
        source_name: &'static str,
    },

    #[error("Invalid tax year configuration: {0}")]
    InvalidConfig(#[from] TaxYearConfigError),

    #[error("Tax year {0} has no built-in reference data")]
    UnsupportedYear(i32),
}

impl From<csv::Error> for ReferenceDataError {
    fn from(err: csv::Error) -> Self {
        ReferenceDataError::CsvParse(err.to_string())
    }
}

impl From<toml::de::Error> for ReferenceDataError {
    fn from(err: toml::de::Error) -> Self {
        ReferenceDataError::TomlParse(err.to_string())
    }
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

fn parse_records<R: Read, T: DeserializeOwned>(reader: R) -> Result<Vec<T>, ReferenceDataError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();

    for result in csv_reader.deserialize() {
        let record: T = result?;
        records.push(record);
    }

    Ok(records)
}

// ─────────────────────────────────────────────────────────────────────────────
// bracket tables
// ─────────────────────────────────────────────────────────────────────────────

/// One row of a bracket file. `max_income` is empty for the top bracket.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BracketRecord {
    pub tax_year: i32,
    pub jurisdiction: String,
    pub marital_status: String,
    pub min_income: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub max_income: Option<Decimal>,
    pub rate: Decimal,
    pub fixed_amount: Decimal,
}

/// Loader for progressive bracket files, federal and cantonal alike.
pub struct BracketLoader;

impl BracketLoader {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<BracketRecord>, ReferenceDataError> {
        parse_records(reader)
    }

    /// Groups records into one validated table per jurisdiction.
    ///
    /// # Errors
    ///
    /// A record for another tax year, an unknown marital status, or a
    /// schedule that is not a contiguous cover of `[0, ∞)`.
    pub fn build_tables(
        tax_year: i32,
        records: &[BracketRecord],
    ) -> Result<BTreeMap<String, JurisdictionTaxTable>, ReferenceDataError> {
        let mut grouped: BTreeMap<String, BTreeMap<MaritalStatus, Vec<TaxBracket>>> = BTreeMap::new();

        for record in records {
            if record.tax_year != tax_year {
                return Err(ReferenceDataError::YearMismatch {
                    expected: tax_year,
                    found: record.tax_year,
                    source_name: "brackets",
                });
            }
            let status = parse_marital_status(&record.marital_status)?;
            grouped
                .entry(record.jurisdiction.trim().to_string())
                .or_default()
                .entry(status)
                .or_default()
                .push(TaxBracket::new(
                    record.min_income,
                    record.max_income,
                    record.rate,
                    record.fixed_amount,
                ));
        }

        grouped
            .into_iter()
            .map(|(jurisdiction, schedules)| {
                JurisdictionTaxTable::new(schedules)
                    .map(|table| (jurisdiction.clone(), table))
                    .map_err(|source| ReferenceDataError::InvalidTable { jurisdiction, source })
            })
            .collect()
    }
}

/// Strict parse for reference data; answers use the lenient
/// [`MaritalStatus::parse`] instead.
fn parse_marital_status(s: &str) -> Result<MaritalStatus, ReferenceDataError> {
    match s.trim() {
        "single" => Ok(MaritalStatus::Single),
        "married" => Ok(MaritalStatus::Married),
        other => Err(ReferenceDataError::InvalidMaritalStatus(other.to_string())),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// canton rules
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CantonRecord {
    pub code: String,
    pub name: String,
    pub method: String,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub child_reduction_rate: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub child_reduction_cap: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub quotient_single: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub quotient_married: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub quotient_per_child: Option<Decimal>,
}

impl CantonRecord {
    fn family_adjustment(&self) -> Result<FamilyAdjustment, ReferenceDataError> {
        match (self.child_reduction_rate, self.child_reduction_cap) {
            (None, None) => Ok(FamilyAdjustment::None),
            (Some(rate), Some(cap)) => Ok(FamilyAdjustment::PercentPerChild { rate, cap }),
            _ => Err(ReferenceDataError::IncompleteRule(
                self.code.clone(),
                "child reduction needs both rate and cap",
            )),
        }
    }

    fn method(&self) -> Result<AssessmentMethod, ReferenceDataError> {
        match self.method.trim() {
            "brackets" => Ok(AssessmentMethod::Brackets),
            "household_quotient" => match (self.quotient_single, self.quotient_married, self.quotient_per_child) {
                (Some(single), Some(married), Some(per_child)) => Ok(AssessmentMethod::HouseholdQuotient {
                    single,
                    married,
                    per_child,
                }),
                _ => Err(ReferenceDataError::IncompleteRule(
                    self.code.clone(),
                    "household quotient needs single, married and per-child factors",
                )),
            },
            other => Err(ReferenceDataError::InvalidMethod {
                canton: self.code.clone(),
                method: other.to_string(),
            }),
        }
    }
}

pub struct CantonLoader;

impl CantonLoader {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<CantonRecord>, ReferenceDataError> {
        parse_records(reader)
    }

    /// Joins canton rules with their bracket tables.
    ///
    /// # Errors
    ///
    /// [`ReferenceDataError::MissingTable`] when a canton has no brackets.
    /// Bracket tables without a canton row are ignored with a warning.
    pub fn build_registry(
        records: &[CantonRecord],
        tables: &BTreeMap<String, JurisdictionTaxTable>,
    ) -> Result<CantonRegistry, ReferenceDataError> {
        let mut registry = CantonRegistry::new();

        for record in records {
            let code = record.code.trim();
            let tables = tables
                .get(code)
                .ok_or_else(|| ReferenceDataError::MissingTable(code.to_string()))?;

            registry.insert(CantonRule {
                code: CantonCode::new(code),
                name: record.name.clone(),
                tables: tables.clone(),
                family_adjustment: record.family_adjustment()?,
                method: record.method()?,
            });
        }

        for jurisdiction in tables.keys() {
            if !registry.contains(&CantonCode::new(jurisdiction.as_str())) {
                warn!(%jurisdiction, "bracket table without canton rule; ignoring");
            }
        }

        debug!(cantons = registry.len(), "canton registry built");
        Ok(registry)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// municipal, church and wealth tables
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MunicipalRecord {
    pub tax_year: i32,
    pub canton: String,
    pub municipality: String,
    pub multiplier: Decimal,
}

pub struct MunicipalLoader;

impl MunicipalLoader {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<MunicipalRecord>, ReferenceDataError> {
        parse_records(reader)
    }

    pub fn build(records: &[MunicipalRecord]) -> MunicipalMultipliers {
        let mut multipliers = MunicipalMultipliers::new();
        for record in records {
            multipliers.insert(
                record.tax_year,
                CantonCode::new(record.canton.trim()),
                &record.municipality,
                record.multiplier,
            );
        }
        multipliers
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChurchRecord {
    pub canton: String,
    pub denomination: String,
    pub rate: Decimal,
    pub voluntary: bool,
}

pub struct ChurchLoader;

impl ChurchLoader {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<ChurchRecord>, ReferenceDataError> {
        parse_records(reader)
    }

    pub fn build(records: &[ChurchRecord]) -> Result<ChurchRates, ReferenceDataError> {
        let mut rates = ChurchRates::new();
        for record in records {
            let canton = CantonCode::new(record.canton.trim());
            let denomination = Denomination::parse(&record.denomination)
                .ok_or_else(|| ReferenceDataError::InvalidDenomination(record.denomination.clone()))?;
            if record.voluntary {
                rates.mark_voluntary(canton.clone());
            }
            rates.insert(canton, denomination, record.rate);
        }
        Ok(rates)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct WealthRecord {
    pub canton: String,
    pub exemption_single: Decimal,
    pub exemption_married: Decimal,
    pub rate: Decimal,
}

pub struct WealthLoader;

impl WealthLoader {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<WealthRecord>, ReferenceDataError> {
        parse_records(reader)
    }

    pub fn build(records: &[WealthRecord]) -> WealthSchedules {
        let mut schedules = WealthSchedules::new();
        for record in records {
            schedules.insert(
                CantonCode::new(record.canton.trim()),
                WealthSchedule {
                    exemption_single: record.exemption_single,
                    exemption_married: record.exemption_married,
                    rate: record.rate,
                },
            );
        }
        schedules
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// year configuration and assembly
// ─────────────────────────────────────────────────────────────────────────────

/// Parses and validates a year configuration.
pub fn parse_config(toml_source: &str) -> Result<TaxYearConfig, ReferenceDataError> {
    let config: TaxYearConfig = toml::from_str(toml_source)?;
    config.validate()?;
    Ok(config)
}

/// Raw sources of one tax year, one string per file.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceSources<'a> {
    pub config: &'a str,
    pub federal_brackets: &'a str,
    pub canton_brackets: &'a str,
    pub cantons: &'a str,
    pub municipal_multipliers: &'a str,
    pub church_rates: &'a str,
    pub wealth: &'a str,
}

impl ReferenceSources<'_> {
    /// Parses every source and assembles the year's [`TaxReference`].
    pub fn load(&self) -> Result<TaxReference, ReferenceDataError> {
        let config = parse_config(self.config)?;
        self.load_with_config(config)
    }

    /// Like [`ReferenceSources::load`] with an already parsed configuration,
    /// e.g. one overridden by the user.
    pub fn load_with_config(
        &self,
        config: TaxYearConfig,
    ) -> Result<TaxReference, ReferenceDataError> {
        config.validate()?;
        let tax_year = config.tax_year;

        let federal_records = BracketLoader::parse(self.federal_brackets.as_bytes())?;
        let mut federal_tables = BracketLoader::build_tables(tax_year, &federal_records)?;
        let federal = federal_tables
            .remove(FEDERAL_JURISDICTION)
            .ok_or_else(|| ReferenceDataError::MissingTable(FEDERAL_JURISDICTION.to_string()))?;

        let canton_records = BracketLoader::parse(self.canton_brackets.as_bytes())?;
        let canton_tables = BracketLoader::build_tables(tax_year, &canton_records)?;
        let cantons = CantonLoader::build_registry(&CantonLoader::parse(self.cantons.as_bytes())?, &canton_tables)?;

        let municipal_records = MunicipalLoader::parse(self.municipal_multipliers.as_bytes())?;
        if let Some(other) = municipal_records.iter().find(|r| r.tax_year != tax_year) {
            return Err(ReferenceDataError::YearMismatch {
                expected: tax_year,
                found: other.tax_year,
                source_name: "municipal multipliers",
            });
        }

        Ok(TaxReference {
            federal,
            cantons,
            municipal: MunicipalLoader::build(&municipal_records),
            church: ChurchLoader::build(&ChurchLoader::parse(self.church_rates.as_bytes())?)?,
            wealth: WealthLoader::build(&WealthLoader::parse(self.wealth.as_bytes())?),
            config,
        })
    }
}
