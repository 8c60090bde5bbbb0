//! Resolver types.

use serde::Serialize;

/// How many hits each filter stage removed for one query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterReport {
    pub candidates: usize,
    pub dropped_other_document: usize,
    pub dropped_over_threshold: usize,
    pub dropped_no_keyword: usize,
    pub kept: usize,
}
