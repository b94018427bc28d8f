//! Human-readable rendering of a multi-filing summary.

use std::fmt;

use chtax_core::calculations::{FilingOutcome, MultiFilingSummary};

/// Table of every filing followed by the grand total, warnings and errors.
pub struct SummaryReport<'a>(pub &'a MultiFilingSummary);

impl fmt::Display for SummaryReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let summary = self.0;

        writeln!(
            f,
            "{:>6}  {:>4}  {:<6}  {:<9}  {:>12}  {:>12}  {:>12}  {:>10}  {:>10}  {:>12}",
            "filing", "year", "canton", "kind", "federal", "cantonal", "municipal", "church", "wealth", "total"
        )?;

        for outcome in &summary.filings {
            write_row(f, outcome)?;
        }

        writeln!(f, "grand total: {:.2}", summary.grand_total)?;

        for result in summary.succeeded() {
            for warning in &result.warnings {
                writeln!(f, "warning (filing {}): {}", result.filing_id, warning)?;
            }
        }
        for outcome in summary.filings.iter().filter(|o| o.error.is_some()) {
            writeln!(
                f,
                "failed (filing {}, {}): {}",
                outcome.filing_id,
                outcome.canton,
                outcome.error.as_deref().unwrap_or_default()
            )?;
        }
        Ok(())
    }
}

fn write_row(
    f: &mut fmt::Formatter<'_>,
    outcome: &FilingOutcome,
) -> fmt::Result {
    let kind = if outcome.is_primary { "primary" } else { "secondary" };
    write!(f, "{:>6}  {:>4}  {:<6}  {:<9}", outcome.filing_id, outcome.tax_year, outcome.canton, kind)?;

    match &outcome.result {
        Some(r) => writeln!(
            f,
            "  {:>12.2}  {:>12.2}  {:>12.2}  {:>10.2}  {:>10.2}  {:>12.2}",
            r.federal_tax, r.cantonal_tax, r.municipal_tax, r.church_tax, r.wealth_tax, r.total_tax
        ),
        None => writeln!(f, "  {:>12}  {:>12}  {:>12}  {:>10}  {:>10}  {:>12}", "-", "-", "-", "-", "-", "error"),
    }
}

#[cfg(test)]
mod tests {
    use chtax_core::calculations::FilingAggregator;
    use chtax_core::{CantonCode, Filing, IncomeSources, TaxProfile};
    use rust_decimal_macros::dec;

    use super::*;

    fn summary() -> MultiFilingSummary {
        let service = chtax_data::builtin::service().unwrap();
        let profile = TaxProfile {
            municipality: Some("Zürich".to_string()),
            income: IncomeSources {
                employment: dec!(100000),
                ..IncomeSources::default()
            },
            ..TaxProfile::default()
        };
        let filings = vec![
            Filing::primary(1, 2024, CantonCode::from("ZH"), profile.clone()),
            Filing::secondary(2, 2024, CantonCode::from("XX"), profile),
        ];
        FilingAggregator::new(&service).calculate_all_user_filings(&filings).unwrap()
    }

    #[test]
    fn report_lists_filings_and_grand_total() {
        let text = SummaryReport(&summary()).to_string();

        let lines: Vec<_> = text.lines().collect();
        assert!(lines[0].contains("municipal"));
        assert!(lines[1].contains("primary"));
        assert!(lines[1].ends_with("14634.81"));
        assert!(lines[2].ends_with("error"));
        assert!(text.contains("grand total: 14634.81"));
    }

    #[test]
    fn report_names_failed_filings() {
        let text = SummaryReport(&summary()).to_string();

        assert!(text.contains("failed (filing 2, XX): No calculator available for canton XX"));
    }
}
