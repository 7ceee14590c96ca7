use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::utils::error::{AppError, Result};

/// Ordered list of model names. Its positions are the index space shared by
/// every company's links, every price column and the baseline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Catalog {
    models: Vec<String>,
}

impl TryFrom<Vec<String>> for Catalog {
    type Error = AppError;

    fn try_from(models: Vec<String>) -> Result<Self> {
        Self::new(models)
    }
}

impl From<Catalog> for Vec<String> {
    fn from(catalog: Catalog) -> Self {
        catalog.models
    }
}

impl Catalog {
    pub fn new(models: Vec<String>) -> Result<Self> {
        if models.is_empty() {
            return Err(AppError::Validation("Catalog must contain at least one model".into()));
        }

        let mut seen = HashSet::with_capacity(models.len());
        for model in &models {
            if model.trim().is_empty() {
                return Err(AppError::Validation("Catalog model names must not be empty".into()));
            }
            if !seen.insert(model.as_str()) {
                return Err(AppError::Validation(format!("Duplicate catalog model: {}", model)));
            }
        }

        Ok(Self { models })
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn model(&self, index: usize) -> Option<&str> {
        self.models.get(index).map(String::as_str)
    }

    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(String::as_str)
    }

    /// Fails unless a sequence of `len` entries lines up with the catalog.
    pub fn ensure_aligned(&self, what: &str, len: usize) -> Result<()> {
        if len != self.models.len() {
            return Err(AppError::Validation(format!(
                "{} has {} entries but the catalog has {} models",
                what,
                len,
                self.models.len()
            )));
        }
        Ok(())
    }
}
