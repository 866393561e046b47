use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use site_etl::config::{EtlConfig, StandardizerConfig};
use site_etl::models::{RawField, RawPlantRecord};
use site_etl::processors::{NameStandardizer, SiteProcessor};

const PLACES: [&str; 6] = [
    "SF",
    "San Mateo Cnty",
    "Oaklnd",
    "Kern County",
    "Springfield",
    "San Fransisco",
];
const ZONING: [&str; 4] = ["Industrial", "Commercial", "Agricultural", "Residential"];

fn create_test_records(count: usize) -> Vec<RawPlantRecord> {
    (0..count)
        .map(|i| RawPlantRecord {
            plant_code: Some(RawField::Number(i as f64)),
            plant_name: Some(format!("Plant {}", i)),
            city: Some(PLACES[i % PLACES.len()].to_string()),
            latitude: Some(RawField::Number(34.0 + (i % 500) as f64 * 0.01)),
            longitude: Some(RawField::Number(-122.0 + (i % 300) as f64 * 0.01)),
            capacity: Some(RawField::Number((i % 997) as f64 * 2.5)),
            zoning: Some(ZONING[i % ZONING.len()].to_string()),
            status: Some("Operating".to_string()),
            ..Default::default()
        })
        .collect()
}

fn benchmark_standardizer(c: &mut Criterion) {
    let standardizer = NameStandardizer::new(&StandardizerConfig::default());

    c.bench_function("standardize_exact", |b| {
        b.iter(|| standardizer.standardize(black_box(Some("San Mateo County"))))
    });

    c.bench_function("standardize_fuzzy", |b| {
        b.iter(|| standardizer.standardize(black_box(Some("San Fransisco"))))
    });
}

fn benchmark_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform");

    for count in [100, 1_000, 10_000] {
        let records = create_test_records(count);
        let processor = SiteProcessor::new(&EtlConfig::default()).unwrap();

        group.bench_with_input(BenchmarkId::new("process", count), &records, |b, records| {
            b.iter(|| processor.process(black_box(records.clone()), None).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_standardizer, benchmark_transform);
criterion_main!(benches);
