use criterion::{Criterion, black_box, criterion_group, criterion_main};
use glam::Vec2;
use strata_terrain::*;

fn bench_noise_map(c: &mut Criterion) {
    let config = NoiseConfig {
        seed: 42,
        ..Default::default()
    };
    c.bench_function("noise_map_97", |bencher| {
        bencher.iter(|| black_box(generate_noise_map(97, &config, black_box(Vec2::ZERO))))
    });
}

fn bench_composite_two_layers(c: &mut Criterion) {
    let entries = vec![
        LayerEntry::default(),
        LayerEntry {
            enabled: true,
            layer: HeightLayer {
                id: "detail".to_string(),
                noise: NoiseConfig {
                    seed: 7,
                    octaves: 3,
                    scale: 12.0,
                    ..Default::default()
                },
                amplitude: 4.0,
                ..Default::default()
            },
        },
    ];
    c.bench_function("composite_two_layers_97", |bencher| {
        bencher.iter(|| black_box(composite(97, &entries, black_box(Vec2::new(96.0, 0.0)))))
    });
}

fn bench_poisson(c: &mut Criterion) {
    let field = composite_layer(97, &HeightLayer::default(), Vec2::ZERO);
    let spec = PoissonSampleSpec::default();
    c.bench_function("poisson_230", |bencher| {
        bencher.iter(|| black_box(generate_points(&spec, Vec2::splat(230.0), &field, 1)))
    });
}

criterion_group!(benches, bench_noise_map, bench_composite_two_layers, bench_poisson);
criterion_main!(benches);
