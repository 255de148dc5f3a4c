//! Pure filtering stages applied to a candidate batch of postings.
//!
//! All term comparisons are case-insensitive substring containment. Stages
//! preserve input order and perform no I/O.

use serde::{Deserialize, Serialize};

use crate::job::{JobRecord, LinkSet};

/// Term lists consumed by the filter stages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Postings whose title contains any of these are dropped.
    pub excluded_titles: Vec<String>,
    /// A description must mention at least one of these (when non-empty).
    pub positions: Vec<String>,
    /// A description must mention at least one of these (when non-empty).
    pub levels: Vec<String>,
    /// A description mentioning any of these is rejected.
    pub excluded_descriptions: Vec<String>,
}

/// Why [`check_description`] rejected a description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Empty,
    NoPosition,
    NoLevel,
    ExcludedTerms(Vec<String>),
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Empty => write!(f, "description is empty"),
            Rejection::NoPosition => write!(f, "no matching position"),
            Rejection::NoLevel => write!(f, "no matching level"),
            Rejection::ExcludedTerms(terms) => {
                write!(f, "contains excluded terms: {}", terms.join(", "))
            }
        }
    }
}

fn contains_ci(haystack_lower: &str, term: &str) -> bool {
    haystack_lower.contains(&term.to_lowercase())
}

/// Drop every record whose title contains an excluded term.
pub fn filter_excluded_titles(records: Vec<JobRecord>, excluded: &[String]) -> Vec<JobRecord> {
    if excluded.is_empty() {
        return records;
    }
    records
        .into_iter()
        .filter(|record| {
            let title = record.title.to_lowercase();
            !excluded.iter().any(|term| contains_ci(&title, term))
        })
        .collect()
}

/// Drop every record whose link is already known.
///
/// Repeated links inside `records` are not collapsed here.
pub fn filter_novel(records: Vec<JobRecord>, known: &LinkSet) -> Vec<JobRecord> {
    if known.is_empty() {
        return records;
    }
    records
        .into_iter()
        .filter(|record| !known.contains(&record.link))
        .collect()
}

/// Detailed form of [`validate_description`].
pub fn check_description(text: &str, criteria: &FilterCriteria) -> Result<(), Rejection> {
    if text.trim().is_empty() {
        return Err(Rejection::Empty);
    }
    let lower = text.to_lowercase();

    if !criteria.positions.iter().any(|p| contains_ci(&lower, p)) {
        return Err(Rejection::NoPosition);
    }

    if !criteria.levels.iter().any(|l| contains_ci(&lower, l)) {
        return Err(Rejection::NoLevel);
    }

    let found: Vec<String> = criteria
        .excluded_descriptions
        .iter()
        .filter(|term| contains_ci(&lower, term))
        .cloned()
        .collect();
    if !found.is_empty() {
        return Err(Rejection::ExcludedTerms(found));
    }

    Ok(())
}

/// Advisory content check for sources that inspect full descriptions.
pub fn validate_description(text: &str, criteria: &FilterCriteria) -> bool {
    check_description(text, criteria).is_ok()
}
