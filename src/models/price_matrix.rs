use serde::{Deserialize, Serialize};

use crate::models::Catalog;
use crate::utils::error::Result;

/// Whole-unit retail price. Zero never denotes a real price.
pub type Price = u64;

/// Sentinel for "no price could be determined".
pub const UNRESOLVED: Price = 0;

/// One company's prices, aligned to the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceColumn {
    pub company: String,
    pub prices: Vec<Price>,
}

impl PriceColumn {
    pub fn new(company: impl Into<String>, prices: Vec<Price>) -> Self {
        Self {
            company: company.into(),
            prices,
        }
    }

    pub fn unresolved(company: impl Into<String>, len: usize) -> Self {
        Self::new(company, vec![UNRESOLVED; len])
    }

    pub fn resolved_count(&self) -> usize {
        self.prices.iter().filter(|&&p| p != UNRESOLVED).count()
    }
}

/// Prices for one run: the baseline column plus one column per competitor,
/// all the same length as the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct PriceMatrix {
    catalog: Catalog,
    baseline: PriceColumn,
    competitors: Vec<PriceColumn>,
}

impl PriceMatrix {
    pub fn new(
        catalog: Catalog,
        baseline: PriceColumn,
        competitors: Vec<PriceColumn>,
    ) -> Result<Self> {
        catalog.ensure_aligned(&format!("Baseline '{}'", baseline.company), baseline.prices.len())?;
        for column in &competitors {
            let what = format!("Price column '{}'", column.company);
            catalog.ensure_aligned(&what, column.prices.len())?;
        }

        Ok(Self {
            catalog,
            baseline,
            competitors,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn baseline(&self) -> &PriceColumn {
        &self.baseline
    }

    pub fn competitors(&self) -> &[PriceColumn] {
        &self.competitors
    }

    pub fn price(&self, company: &str, index: usize) -> Option<Price> {
        let column = if self.baseline.company == company {
            Some(&self.baseline)
        } else {
            self.competitors.iter().find(|c| c.company == company)
        };
        column.and_then(|c| c.prices.get(index).copied())
    }

    /// Competitor cells holding a real price.
    pub fn resolved_cells(&self) -> usize {
        self.competitors.iter().map(PriceColumn::resolved_count).sum()
    }

    /// Competitor cells still at the sentinel, whether unsourced or exhausted.
    pub fn unresolved_cells(&self) -> usize {
        self.competitors.len() * self.catalog.len() - self.resolved_cells()
    }
}
