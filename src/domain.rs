use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::Serialize;

use crate::error::HarvestError;

/// Identifiers requested per esearch page (`retmax`).
pub const PAGE_SIZE: usize = 5000;
/// Identifiers submitted per esummary call.
pub const CHUNK_SIZE: usize = 100;
/// Total esummary attempts per chunk before it is given up.
pub const MAX_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganismQuery {
    pub name: String,
    pub contact: String,
}

impl OrganismQuery {
    pub fn new(name: impl Into<String>, contact: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contact: contact.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TaxonomyId(String);

impl TaxonomyId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Gene search term scoped to this organism and everything below it.
    pub fn gene_search_term(&self) -> String {
        format!("txid{}[Organism:exp]", self.0)
    }
}

impl fmt::Display for TaxonomyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaxonomyId {
    type Err = HarvestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        let is_valid = !normalized.is_empty() && normalized.chars().all(|ch| ch.is_ascii_digit());
        if !is_valid {
            return Err(HarvestError::InvalidTaxonomyId(value.to_string()));
        }
        Ok(Self(normalized.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneRecord {
    pub id: String,
    pub name: String,
}

/// Result of one chunk after its retry budget is spent or a response parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Success(Vec<GeneRecord>),
    Failure { attempts: usize, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One gene name per line.
    #[default]
    Names,
    /// `id<TAB>name` per line.
    Tsv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Names => write!(f, "names"),
            OutputFormat::Tsv => write!(f, "tsv"),
        }
    }
}

/// Splits a page into consecutive chunks of at most `size` ids.
pub fn split_into_chunks(page: &[String], size: usize) -> impl Iterator<Item = &[String]> {
    page.chunks(size.max(1))
}

/// Integer percentage, truncated, of `processed` against `total`.
pub fn percent(processed: usize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    processed.saturating_mul(100) / total
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_taxonomy_id_valid() {
        let id: TaxonomyId = " 9606 ".parse().unwrap();
        assert_eq!(id.as_str(), "9606");
    }

    #[test]
    fn parse_taxonomy_id_invalid() {
        assert_matches!(
            "txid9606".parse::<TaxonomyId>(),
            Err(HarvestError::InvalidTaxonomyId(_))
        );
        assert_matches!("".parse::<TaxonomyId>(), Err(HarvestError::InvalidTaxonomyId(_)));
    }

    #[test]
    fn search_term_is_scoped_by_taxid() {
        let id: TaxonomyId = "9606".parse().unwrap();
        assert_eq!(id.gene_search_term(), "txid9606[Organism:exp]");
    }

    #[test]
    fn chunks_never_exceed_size() {
        let page = (0..250).map(|n| n.to_string()).collect::<Vec<_>>();
        let sizes = split_into_chunks(&page, CHUNK_SIZE)
            .map(|chunk| chunk.len())
            .collect::<Vec<_>>();
        assert_eq!(sizes, vec![100, 100, 50]);
    }

    #[test]
    fn percent_truncates() {
        assert_eq!(percent(5000, 6000), 83);
        assert_eq!(percent(10000, 6000), 166);
        assert_eq!(percent(1, 0), 0);
    }
}
