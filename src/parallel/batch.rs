//! Catalogue-wide evaluation. Each ability is independent, so abilities are
//! spread over the pool with no shared state beyond the modifier table.

use rayon::prelude::*;

use crate::data::catalog::AbilityCatalog;
use crate::data::modifiers::ModifierTable;
use crate::engine::{self, EngineSettings, Evaluation, Explanation};
use crate::error::Result;
use crate::parallel::pool::WorkerPool;

/// Per-ability results in name order. One failing ability does not stop
/// the others.
pub fn evaluate_catalog(
    catalog: &AbilityCatalog,
    table: &ModifierTable,
    settings: &EngineSettings,
    pool: &WorkerPool,
) -> Vec<(String, Result<Evaluation>)> {
    let entries: Vec<_> = catalog.iter().collect();
    let results = pool.install(|| {
        entries
            .par_iter()
            .map(|(name, raw)| (name.to_string(), engine::evaluate(table, settings, name, raw)))
            .collect::<Vec<_>>()
    });
    tracing::debug!(abilities = results.len(), "evaluated catalogue");
    results
}

pub fn explain_catalog(
    catalog: &AbilityCatalog,
    table: &ModifierTable,
    settings: &EngineSettings,
    pool: &WorkerPool,
) -> Vec<(String, Result<Explanation>)> {
    let entries: Vec<_> = catalog.iter().collect();
    pool.install(|| {
        entries
            .par_iter()
            .map(|(name, raw)| (name.to_string(), engine::explain(table, settings, name, raw)))
            .collect()
    })
}

/// Single-threaded equivalent of [evaluate_catalog].
pub fn evaluate_catalog_sequential(
    catalog: &AbilityCatalog,
    table: &ModifierTable,
    settings: &EngineSettings,
) -> Vec<(String, Result<Evaluation>)> {
    catalog
        .iter()
        .map(|(name, raw)| (name.to_string(), engine::evaluate(table, settings, name, raw)))
        .collect()
}
