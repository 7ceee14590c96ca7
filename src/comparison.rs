use serde::{Deserialize, Serialize};

use crate::models::{Price, PriceMatrix, UNRESOLVED};
use crate::utils::error::{AppError, Result};

/// A competitor undercuts when it has a real price that is no higher than
/// ours. Ties count: matching a competitor is not beating it.
pub fn is_undercut(baseline: Price, competitor: Price) -> bool {
    competitor != UNRESOLVED && baseline >= competitor
}

/// Per-index undercut flags for one competitor against the baseline. Fails
/// when the two sequences differ in length.
pub fn compare(baseline: &[Price], competitor: &[Price]) -> Result<Vec<bool>> {
    if baseline.len() != competitor.len() {
        return Err(AppError::Validation(format!(
            "Cannot compare {} competitor prices against {} baseline prices",
            competitor.len(),
            baseline.len()
        )));
    }
    Ok(flag_aligned(baseline, competitor))
}

// Columns of a PriceMatrix are aligned on construction.
fn flag_aligned(baseline: &[Price], competitor: &[Price]) -> Vec<bool> {
    baseline
        .iter()
        .zip(competitor)
        .map(|(&ours, &theirs)| is_undercut(ours, theirs))
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompanyFlags {
    pub company: String,
    pub flags: Vec<bool>,
}

impl CompanyFlags {
    pub fn count(&self) -> usize {
        self.flags.iter().filter(|&&f| f).count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Undercut {
    pub company: String,
    pub model: String,
    pub index: usize,
    pub baseline: Price,
    pub competitor: Price,
}

impl Undercut {
    /// How much cheaper the competitor is; zero for a tie.
    pub fn difference(&self) -> Price {
        self.baseline - self.competitor
    }
}

/// Outcome of comparing every competitor column against the baseline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComparisonReport {
    pub companies: Vec<CompanyFlags>,
    pub undercuts: Vec<Undercut>,
    pub any_undercut: bool,
}

impl ComparisonReport {
    pub fn from_matrix(matrix: &PriceMatrix) -> Self {
        let baseline = &matrix.baseline().prices;

        let companies: Vec<CompanyFlags> = matrix
            .competitors()
            .iter()
            .map(|column| CompanyFlags {
                company: column.company.clone(),
                flags: flag_aligned(baseline, &column.prices),
            })
            .collect();

        let undercuts: Vec<Undercut> = companies
            .iter()
            .zip(matrix.competitors())
            .flat_map(|(flags, column)| {
                flags
                    .flags
                    .iter()
                    .enumerate()
                    .filter(|(_, flagged)| **flagged)
                    .map(move |(index, _)| Undercut {
                        company: column.company.clone(),
                        model: matrix.catalog().model(index).unwrap_or_default().to_string(),
                        index,
                        baseline: baseline[index],
                        competitor: column.prices[index],
                    })
            })
            .collect();

        let any_undercut = companies.iter().any(|c| c.flags.iter().any(|&f| f));

        Self {
            companies,
            undercuts,
            any_undercut,
        }
    }

    pub fn flags_for(&self, company: &str) -> Option<&[bool]> {
        self.companies
            .iter()
            .find(|c| c.company == company)
            .map(|c| c.flags.as_slice())
    }

    /// Companies undercutting the baseline at catalog `index`.
    pub fn undercutters_at(&self, index: usize) -> Vec<&str> {
        self.companies
            .iter()
            .filter(|c| c.flags.get(index).copied().unwrap_or(false))
            .map(|c| c.company.as_str())
            .collect()
    }

    pub fn undercut_count(&self) -> usize {
        self.undercuts.len()
    }
}
