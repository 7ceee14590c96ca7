use serde::{Deserialize, Serialize};

use crate::models::Catalog;
use crate::utils::error::Result;

/// Where the price lives on a competitor's product page: the first element
/// matching `selector`, read through `attribute`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractionRule {
    pub selector: String,
    pub attribute: String,
}

impl ExtractionRule {
    pub fn new(selector: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            attribute: attribute.into(),
        }
    }
}

/// A competitor with one (possibly absent) product link per catalog model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Company {
    pub title: String,
    pub rule: ExtractionRule,
    links: Vec<Option<String>>,
}

impl Company {
    /// Builds a company whose links line up with `catalog`. Blank links mean
    /// the company has no page for that model.
    pub fn new(
        title: impl Into<String>,
        rule: ExtractionRule,
        links: Vec<String>,
        catalog: &Catalog,
    ) -> Result<Self> {
        let title = title.into();
        catalog.ensure_aligned(&format!("Company '{}' links", title), links.len())?;

        let links = links
            .into_iter()
            .map(|link| {
                let link = link.trim();
                (!link.is_empty()).then(|| link.to_string())
            })
            .collect();

        Ok(Self { title, rule, links })
    }

    pub fn link(&self, index: usize) -> Option<&str> {
        self.links.get(index).and_then(|l| l.as_deref())
    }

    /// Catalog positions that have a link, with the link.
    pub fn sourced_links(&self) -> impl Iterator<Item = (usize, &str)> {
        self.links
            .iter()
            .enumerate()
            .filter_map(|(index, link)| link.as_deref().map(|l| (index, l)))
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}
