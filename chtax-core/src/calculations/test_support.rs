//! Shared fixtures for unit tests. Figures follow the 2024 constants; bracket
//! tables are small synthetic ones with easy arithmetic.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::calculations::{
    AssessmentMethod, CantonRegistry, CantonRule, ChurchRates, Denomination, FamilyAdjustment,
    MunicipalMultipliers, TaxReference, WealthSchedule, WealthSchedules,
};
use crate::models::{
    AhvConfig, AlvConfig, BvgAgeBand, BvgConfig, CantonCode, DeductionConfig, JurisdictionTaxTable,
    MaritalStatus, NbuConfig, SelfEmployedAhvConfig, SocialSecurityConfig, TaxBracket, TaxYearConfig,
};

pub fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_test_writer()
        .finish();
    tracing::subscriber::set_default(subscriber)
}

pub fn test_year_config() -> TaxYearConfig {
    TaxYearConfig {
        tax_year: 2024,
        fallback_cantonal_rate: dec!(0.08),
        default_municipal_multiplier: dec!(1.0),
        social_security: SocialSecurityConfig {
            ahv: AhvConfig {
                employee_rate: dec!(0.053),
                employer_rate: dec!(0.053),
            },
            alv: AlvConfig {
                total_rate: dec!(0.011),
                ceiling: dec!(148200),
                solidarity_total_rate: dec!(0.005),
            },
            nbu: NbuConfig {
                default_rate: dec!(0.016),
                min_rate: dec!(0.007),
                max_rate: dec!(0.03),
                min_work_percentage: dec!(20),
            },
            bvg: BvgConfig {
                entry_threshold: dec!(22050),
                coordination_deduction: dec!(25725),
                min_coordinated_salary: dec!(3675),
                max_coordinated_salary: dec!(88200),
                age_bands: vec![
                    BvgAgeBand { from_age: 25, to_age: 34, rate: dec!(0.07) },
                    BvgAgeBand { from_age: 35, to_age: 44, rate: dec!(0.10) },
                    BvgAgeBand { from_age: 45, to_age: 54, rate: dec!(0.15) },
                    BvgAgeBand { from_age: 55, to_age: 65, rate: dec!(0.18) },
                ],
            },
            self_employed: SelfEmployedAhvConfig {
                low_income_limit: dec!(9800),
                low_income_rate: dec!(0.05371),
                mid_income_limit: dec!(58800),
                mid_income_contribution: dec!(4000),
                high_income_rate: dec!(0.10),
            },
        },
        deductions: DeductionConfig {
            professional_expense_rate: dec!(0.03),
            professional_expense_max: dec!(4000),
            pillar_3a_max: dec!(7056),
            insurance_premium_single: dec!(1750),
            insurance_premium_married: dec!(3500),
            child_deduction: dec!(6600),
            medical_expense_threshold_rate: dec!(0.05),
            general_deduction: dec!(3000),
        },
    }
}

/// Single: 0% to 10k, 5% to 50k, 10% above. Married: 0% to 20k, 4% above.
pub fn test_table() -> JurisdictionTaxTable {
    JurisdictionTaxTable::new(BTreeMap::from([
        (MaritalStatus::Single, single_brackets()),
        (
            MaritalStatus::Married,
            vec![
                TaxBracket::new(dec!(0), Some(dec!(20000)), dec!(0), dec!(0)),
                TaxBracket::new(dec!(20000), None, dec!(0.04), dec!(0)),
            ],
        ),
    ]))
    .unwrap()
}

pub fn single_brackets() -> Vec<TaxBracket> {
    vec![
        TaxBracket::new(dec!(0), Some(dec!(10000)), dec!(0), dec!(0)),
        TaxBracket::new(dec!(10000), Some(dec!(50000)), dec!(0.05), dec!(0)),
        TaxBracket::new(dec!(50000), None, dec!(0.10), dec!(2000)),
    ]
}

pub fn brackets_rule(
    code: &str,
    family_adjustment: FamilyAdjustment,
) -> CantonRule {
    CantonRule {
        code: CantonCode::from(code),
        name: code.to_string(),
        tables: test_table(),
        family_adjustment,
        method: AssessmentMethod::Brackets,
    }
}

pub fn quotient_rule(
    code: &str,
    single: Decimal,
    married: Decimal,
    per_child: Decimal,
) -> CantonRule {
    CantonRule {
        code: CantonCode::from(code),
        name: code.to_string(),
        tables: JurisdictionTaxTable::single_schedule(single_brackets()).unwrap(),
        family_adjustment: FamilyAdjustment::None,
        method: AssessmentMethod::HouseholdQuotient {
            single,
            married,
            per_child,
        },
    }
}

/// Reference for 2024 with cantons ZH, GE and VS, and a broken canton `BR`
/// whose quotient is zero so that every evaluation fails.
pub fn test_reference() -> TaxReference {
    let mut cantons = CantonRegistry::new();
    cantons.insert(brackets_rule(
        "ZH",
        FamilyAdjustment::PercentPerChild {
            rate: dec!(0.02),
            cap: dec!(0.10),
        },
    ));
    cantons.insert(brackets_rule("GE", FamilyAdjustment::None));
    cantons.insert(brackets_rule("VS", FamilyAdjustment::None));
    cantons.insert(quotient_rule("BR", dec!(0), dec!(0), dec!(0)));

    let mut municipal = MunicipalMultipliers::new();
    municipal.insert(2024, CantonCode::from("ZH"), "Zürich", dec!(1.19));
    municipal.insert(2024, CantonCode::from("GE"), "Genève", dec!(0.455));
    municipal.insert(2024, CantonCode::from("VS"), "Sion", dec!(1.10));

    let mut church = ChurchRates::new();
    church.insert(CantonCode::from("ZH"), Denomination::Reformed, dec!(0.10));
    church.insert(CantonCode::from("ZH"), Denomination::Catholic, dec!(0.10));
    church.insert(CantonCode::from("VS"), Denomination::Catholic, dec!(0.05));
    church.mark_voluntary(CantonCode::from("GE"));

    let mut wealth = WealthSchedules::new();
    wealth.insert(
        CantonCode::from("ZH"),
        WealthSchedule {
            exemption_single: dec!(80000),
            exemption_married: dec!(159000),
            rate: dec!(0.003),
        },
    );

    TaxReference {
        config: test_year_config(),
        federal: test_table(),
        cantons,
        municipal,
        church,
        wealth,
    }
}
