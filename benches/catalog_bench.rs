//! Compare sequential vs parallel evaluation of a whole catalogue.
//!
//! Run with: `cargo bench --bench catalog`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_yaml::Mapping;
use spellcost::engine::EngineSettings;
use spellcost::parallel::{evaluate_catalog, evaluate_catalog_sequential, WorkerPool};
use spellcost::{AbilityCatalog, ModifierTable};

const MODIFIERS: &str = include_str!("../data/modifiers.yaml");
const SPELLS: &str = include_str!("../data/spells.yaml");

/// The shipped spells, each repeated under `copies` names so the
/// catalogue is large enough to spread over workers.
fn catalog(copies: usize) -> AbilityCatalog {
    let base = AbilityCatalog::from_yaml_str(SPELLS).unwrap_or_default();
    let entries = (0..copies).flat_map(|copy| {
        base.iter()
            .map(move |(name, raw)| (format!("{name} #{copy}"), raw.clone()))
            .collect::<Vec<(String, Mapping)>>()
    });
    AbilityCatalog::from_entries(entries)
}

fn bench_catalog_sequential_vs_parallel(c: &mut Criterion) {
    let table = match ModifierTable::from_yaml_str(MODIFIERS) {
        Ok(table) => table,
        Err(err) => panic!("shipped modifier table should parse: {err}"),
    };
    let settings = EngineSettings::default();
    let catalog = catalog(64);

    let mut group = c.benchmark_group("catalog");
    group.sample_size(20);

    group.bench_function("sequential", |b| {
        b.iter(|| black_box(evaluate_catalog_sequential(&catalog, &table, &settings)));
    });

    group.bench_function("parallel", |b| {
        b.iter(|| {
            black_box(evaluate_catalog(
                &catalog,
                &table,
                &settings,
                &WorkerPool::default(),
            ))
        });
    });

    group.finish();
}

fn bench_single_attack_ability(c: &mut Criterion) {
    let table = match ModifierTable::from_yaml_str(MODIFIERS) {
        Ok(table) => table,
        Err(err) => panic!("shipped modifier table should parse: {err}"),
    };
    let settings = EngineSettings::default();
    let raw: Mapping = serde_yaml::from_str(
        "attack subeffects:\n  success: {damage: high, range: close}\n  failure: {damage: low}\n",
    )
    .unwrap_or_default();

    c.bench_function("explain_attack_ability", |b| {
        b.iter(|| black_box(spellcost::explain(&table, &settings, "ray", &raw).map(|e| e.level)));
    });
}

criterion_group!(
    benches,
    bench_catalog_sequential_vs_parallel,
    bench_single_attack_ability
);
criterion_main!(benches);
