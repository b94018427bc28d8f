//! Multi-filing orchestration for one taxpayer.

use std::collections::BTreeMap;

use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::calculations::common::checked_sum;
use crate::calculations::service::store_result;
use crate::calculations::{CalculationError, TaxCalculationService};
use crate::db::CalculationStore;
use crate::models::{CalculationResult, CantonCode, Filing, FilingId};

/// Outcome of one filing inside a multi-filing run. Exactly one of `result`
/// and `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingOutcome {
    pub filing_id: FilingId,
    pub tax_year: i32,
    pub canton: CantonCode,
    pub is_primary: bool,
    pub total_tax: Decimal,
    pub result: Option<CalculationResult>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiFilingSummary {
    /// Primary filing first, then secondaries in input order.
    pub filings: Vec<FilingOutcome>,
    pub grand_total: Decimal,
    pub failed: usize,
}

impl MultiFilingSummary {
    pub fn succeeded(&self) -> impl Iterator<Item = &CalculationResult> {
        self.filings.iter().filter_map(|f| f.result.as_ref())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FilingAggregator<'a> {
    service: &'a TaxCalculationService,
}

impl<'a> FilingAggregator<'a> {
    pub fn new(service: &'a TaxCalculationService) -> Self {
        Self { service }
    }

    /// Computes every filing independently and in parallel.
    ///
    /// A filing that fails is reported with its error and a zero total; the
    /// others are unaffected.
    ///
    /// # Errors
    ///
    /// [`CalculationError::MultiplePrimaryFilings`] when a tax year has more
    /// than one primary filing. Nothing is computed in that case.
    ///
    /// [`CalculationError::AmountOverflow`] when the filing totals cannot be
    /// summed into a grand total.
    pub fn calculate_all_user_filings(
        &self,
        filings: &[Filing],
    ) -> Result<MultiFilingSummary, CalculationError> {
        check_single_primary(filings)?;

        let mut ordered: Vec<&Filing> = filings.iter().collect();
        ordered.sort_by_key(|f| !f.is_primary);

        let outcomes: Vec<FilingOutcome> = ordered
            .into_par_iter()
            .map(|filing| self.outcome(filing))
            .collect();

        let grand_total = checked_sum(outcomes.iter().map(|o| o.total_tax))
            .ok_or(CalculationError::AmountOverflow("grand total"))?;
        let failed = outcomes.iter().filter(|o| o.error.is_some()).count();

        info!(filings = outcomes.len(), failed, %grand_total, "filings calculated");

        Ok(MultiFilingSummary {
            filings: outcomes,
            grand_total,
            failed,
        })
    }

    /// Appends every successful result of `summary` to `store`. Returns the
    /// number of snapshots written.
    pub async fn store_all(
        &self,
        store: &dyn CalculationStore,
        summary: &MultiFilingSummary,
    ) -> Result<usize, CalculationError> {
        let mut stored = 0;
        for result in summary.succeeded() {
            store_result(store, result).await?;
            stored += 1;
        }
        Ok(stored)
    }

    fn outcome(
        &self,
        filing: &Filing,
    ) -> FilingOutcome {
        let (result, error) = match self.service.calculate(filing) {
            Ok(result) => (Some(result), None),
            Err(e) => {
                warn!(filing_id = filing.id, canton = %filing.canton, error = %e, "filing failed");
                (None, Some(e.to_string()))
            }
        };

        FilingOutcome {
            filing_id: filing.id,
            tax_year: filing.tax_year,
            canton: filing.canton.clone(),
            is_primary: filing.is_primary,
            total_tax: result.as_ref().map_or(Decimal::ZERO, |r| r.total_tax),
            result,
            error,
        }
    }
}

fn check_single_primary(filings: &[Filing]) -> Result<(), CalculationError> {
    let mut primaries: BTreeMap<i32, Vec<FilingId>> = BTreeMap::new();
    for filing in filings.iter().filter(|f| f.is_primary) {
        primaries.entry(filing.tax_year).or_default().push(filing.id);
    }

    match primaries.into_iter().find(|(_, ids)| ids.len() > 1) {
        Some((tax_year, filing_ids)) => Err(CalculationError::MultiplePrimaryFilings { tax_year, filing_ids }),
        None => Ok(()),
    }
}
