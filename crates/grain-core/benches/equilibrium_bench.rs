use criterion::{criterion_group, criterion_main, Criterion};
use grain_core::aggregate::GrainSystem;
use grain_core::bin::ZoneEnvironment;
use grain_core::charge::{solve_charge, ChargeRates, ChargeSolverConfig};
use grain_core::emissivity::EmissivityTable;
use grain_core::optics::GrainOptics;
use grain_types::config::{
    Composition, DepthLaw, EmissivityGridConfig, GrainBinConfig, GrainRunConfig, SolverConfig,
};
use grain_types::error::GrainResult;
use grain_types::state::{Element, EnergyMesh, GasState, RadiationField};
use std::hint::black_box;

struct Exponential;

impl ChargeRates for Exponential {
    fn label(&self) -> &str {
        "bench"
    }
    fn lowest_charge(&self) -> i64 {
        -40
    }
    fn rate_pair(&mut self, z: i64, _slot: usize) -> GrainResult<(f64, f64)> {
        let x = (z + 40) as f64;
        let dn = if z > -40 { 0.1 * (0.05 * x).exp() } else { 0.0 };
        Ok((50.0 * (-0.08 * x).exp(), dn))
    }
}

fn bin_config(label: &str, composition: Composition, radius_cm: f64) -> GrainBinConfig {
    GrainBinConfig {
        label: label.to_string(),
        composition,
        radius_cm,
        density: if composition.is_carbonaceous() { 2.2 } else { 3.3 },
        atom_weight: if composition.is_carbonaceous() { 12.01 } else { 20.0 },
        work_function_ev: if composition.is_carbonaceous() { 4.4 } else { 8.0 },
        band_gap_ev: if composition.is_carbonaceous() { 0.0 } else { 5.0 },
        capacitance: None,
        thermionic_efficiency: 1.0,
        yield_coefficient: 1.0,
        depletion: 1.0,
        grains_per_h: 1.0e-12,
        elements: vec![],
        depth_law: DepthLaw::Standard,
        sublimation_temperature: None,
        n_charge_states: 2,
    }
}

fn bench_charge_solve(c: &mut Criterion) {
    let config = ChargeSolverConfig {
        n_states: 3,
        bracket_max: 50,
    };
    c.bench_function("charge_solve_cold", |b| {
        b.iter(|| black_box(solve_charge(&mut Exponential, black_box(config), None).unwrap()))
    });
}

fn bench_emissivity_table(c: &mut Criterion) {
    let mesh = EnergyMesh::geometric(1.0e-5, 1.0e3, 400).unwrap();
    let optics = GrainOptics::analytic(&mesh, 1.0e-5, 1.0e-12).unwrap();
    let grid = EmissivityGridConfig::default();
    c.bench_function("emissivity_table_200x400", |b| {
        b.iter(|| black_box(EmissivityTable::new(&grid, &mesh, &optics).unwrap()))
    });
}

fn bench_zone_solve(c: &mut Criterion) {
    let mesh = EnergyMesh::geometric(1.0e-5, 1.0e3, 300).unwrap();
    let field = RadiationField::diluted_blackbody(&mesh, 3.0e4, 1.0e-14);
    let gas = GasState {
        temperature: 8.0e3,
        eden: 1.0,
        hden: 1.1,
        h2_density: 0.0,
        co_density: 0.0,
        total_cooling: 1.0e-22,
        ion_densities: vec![vec![0.1, 1.0]],
    };
    let elements = vec![Element::new(0, 1.00794, vec![1.0]).unwrap()];
    let env = ZoneEnvironment {
        zone: 0,
        mesh: &mesh,
        field: &field,
        gas: &gas,
        elements: &elements,
    };
    let config = GrainRunConfig {
        solver: SolverConfig::default(),
        emissivity: EmissivityGridConfig::default(),
        metallicity: 1.0,
        pah_law: Default::default(),
        auger_data: None,
        bins: vec![
            bin_config("silicate 0.1um", Composition::Silicate, 1.0e-5),
            bin_config("graphite 0.1um", Composition::Carbonaceous, 1.0e-5),
            bin_config("graphite 5nm", Composition::Carbonaceous, 5.0e-7),
            bin_config("silicate 5nm", Composition::Silicate, 5.0e-7),
        ],
    };

    let mut cold = GrainSystem::analytic(config.clone(), &mesh).unwrap();
    c.bench_function("zone_solve_4_bins_cold", |b| {
        b.iter(|| {
            for bin in cold.bins_mut() {
                bin.last = None;
            }
            black_box(cold.solve_zone(&env, false).unwrap())
        })
    });

    let mut warm = GrainSystem::analytic(config, &mesh).unwrap();
    warm.solve_zone(&env, false).unwrap();
    c.bench_function("zone_solve_4_bins_warm", |b| {
        b.iter(|| black_box(warm.solve_zone(&env, false).unwrap()))
    });
}

criterion_group!(benches, bench_charge_solve, bench_emissivity_table, bench_zone_solve);
criterion_main!(benches);
