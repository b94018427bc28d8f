use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::round_half_up;
use crate::models::CantonCode;

/// Recognised church denominations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Denomination {
    Reformed,
    Catholic,
    ChristCatholic,
}

impl Denomination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reformed => "reformed",
            Self::Catholic => "catholic",
            Self::ChristCatholic => "christ_catholic",
        }
    }

    /// Parses an answer or data value. `None` for unknown names and for an
    /// explicit "none".
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "reformed" | "protestant" | "evangelical_reformed" | "reformiert" => Some(Self::Reformed),
            "catholic" | "roman_catholic" | "katholisch" | "römisch_katholisch" => Some(Self::Catholic),
            "christ_catholic" | "old_catholic" | "christkatholisch" => Some(Self::ChristCatholic),
            _ => None,
        }
    }
}

impl std::fmt::Display for Denomination {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Church tax rates as a fraction of cantonal tax.
#[derive(Debug, Clone, Default)]
pub struct ChurchRates {
    rates: BTreeMap<(CantonCode, Denomination), Decimal>,
    voluntary: BTreeSet<CantonCode>,
}

impl ChurchRates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        canton: CantonCode,
        denomination: Denomination,
        rate: Decimal,
    ) {
        self.rates.insert((canton, denomination), rate);
    }

    /// Marks a canton whose church contribution is voluntary and not levied
    /// with the tax.
    pub fn mark_voluntary(
        &mut self,
        canton: CantonCode,
    ) {
        self.voluntary.insert(canton);
    }

    pub fn is_voluntary(
        &self,
        canton: &CantonCode,
    ) -> bool {
        self.voluntary.contains(canton)
    }

    pub fn rate(
        &self,
        canton: &CantonCode,
        denomination: Denomination,
    ) -> Option<Decimal> {
        self.rates.get(&(canton.clone(), denomination)).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChurchTaxBreakdown {
    pub applies: bool,
    pub canton: CantonCode,
    pub denomination: Option<Denomination>,
    pub rate: Decimal,
    pub amount: Decimal,
    pub voluntary: bool,
    pub note: Option<String>,
}

impl ChurchTaxBreakdown {
    fn not_levied(
        canton: &CantonCode,
        denomination: Option<Denomination>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            applies: false,
            canton: canton.clone(),
            denomination,
            rate: Decimal::ZERO,
            amount: Decimal::ZERO,
            voluntary: false,
            note: Some(note.into()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChurchTaxService<'a> {
    rates: &'a ChurchRates,
}

impl<'a> ChurchTaxService<'a> {
    pub fn new(rates: &'a ChurchRates) -> Self {
        Self { rates }
    }

    /// Church tax as a share of `cantonal_tax`.
    pub fn calculate(
        &self,
        cantonal_tax: Decimal,
        canton: &CantonCode,
        pays_church_tax: bool,
        denomination: Option<&str>,
    ) -> ChurchTaxBreakdown {
        if !pays_church_tax {
            return ChurchTaxBreakdown::not_levied(canton, None, "not a member of a recognised church");
        }

        let Some(raw) = denomination else {
            return ChurchTaxBreakdown::not_levied(canton, None, "no denomination given");
        };
        if raw.trim().eq_ignore_ascii_case("none") {
            return ChurchTaxBreakdown::not_levied(canton, None, "no denomination");
        }
        let Some(denomination) = Denomination::parse(raw) else {
            return ChurchTaxBreakdown::not_levied(canton, None, format!("unknown denomination '{raw}'"));
        };

        if self.rates.is_voluntary(canton) {
            return ChurchTaxBreakdown {
                voluntary: true,
                ..ChurchTaxBreakdown::not_levied(
                    canton,
                    Some(denomination),
                    format!("church contribution in {canton} is voluntary and not levied with the tax"),
                )
            };
        }

        let Some(rate) = self.rates.rate(canton, denomination) else {
            return ChurchTaxBreakdown::not_levied(
                canton,
                Some(denomination),
                format!("no {denomination} church tax rate for {canton}"),
            );
        };

        ChurchTaxBreakdown {
            applies: true,
            canton: canton.clone(),
            denomination: Some(denomination),
            rate,
            amount: round_half_up(cantonal_tax * rate),
            voluntary: false,
            note: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calculations::test_support::test_reference;

    #[test]
    fn member_pays_share_of_cantonal_tax() {
        let reference = test_reference();

        let church = ChurchTaxService::new(&reference.church).calculate(dec!(5509.50), &CantonCode::from("ZH"), true, Some("reformed"));

        assert!(church.applies);
        assert_eq!(church.amount, dec!(550.95));
        assert_eq!(church.denomination, Some(Denomination::Reformed));
    }

    #[test]
    fn non_member_pays_nothing() {
        let reference = test_reference();

        let church = ChurchTaxService::new(&reference.church).calculate(dec!(5000), &CantonCode::from("ZH"), false, Some("catholic"));

        assert!(!church.applies);
        assert_eq!(church.amount, dec!(0));
    }

    #[test]
    fn denomination_none_opts_out() {
        let reference = test_reference();

        let church = ChurchTaxService::new(&reference.church).calculate(dec!(5000), &CantonCode::from("ZH"), true, Some("None"));

        assert!(!church.applies);
    }

    #[test]
    fn geneva_is_voluntary() {
        let reference = test_reference();

        let church = ChurchTaxService::new(&reference.church).calculate(dec!(5000), &CantonCode::from("GE"), true, Some("catholic"));

        assert!(!church.applies);
        assert!(church.voluntary);
        assert_eq!(church.amount, dec!(0));
    }

    #[test]
    fn canton_without_rate_for_denomination() {
        let reference = test_reference();

        let church = ChurchTaxService::new(&reference.church).calculate(dec!(5000), &CantonCode::from("VS"), true, Some("reformed"));

        assert!(!church.applies);
        assert!(church.note.unwrap().contains("reformed"));
    }

    #[test]
    fn parse_accepts_aliases() {
        assert_eq!(Denomination::parse("Protestant"), Some(Denomination::Reformed));
        assert_eq!(Denomination::parse("roman catholic"), Some(Denomination::Catholic));
        assert_eq!(Denomination::parse("old-catholic"), Some(Denomination::ChristCatholic));
        assert_eq!(Denomination::parse("none"), None);
        assert_eq!(Denomination::parse("jedi"), None);
    }
}
