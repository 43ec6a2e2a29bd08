use aemet_weather::{Catalog, DistanceMetric, LatLon, RawRecord};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

// A 0.05 degree grid over the Iberian peninsula, roughly one point per town.
fn town_grid() -> Vec<RawRecord> {
    let mut records = Vec::new();
    for i in 0..180 {
        for j in 0..260 {
            let latitude = 36.0 + i as f64 * 0.05;
            let longitude = -9.3 + j as f64 * 0.05;
            let record = json!({
                "id": format!("id{i:03}{j:03}"),
                "latitud_dec": latitude.to_string(),
                "longitud_dec": longitude.to_string(),
            });
            if let Some(record) = record.as_object() {
                records.push(record.clone());
            }
        }
    }
    records
}

fn bench_nearest(c: &mut Criterion) {
    let catalog = Catalog::towns(town_grid());
    let target = LatLon(40.4168, -3.7038);

    c.bench_function("nearest_great_circle", |b| {
        b.iter(|| catalog.nearest(black_box(target), 40.0, DistanceMetric::GreatCircle))
    });
    c.bench_function("nearest_geodesic", |b| {
        b.iter(|| catalog.nearest(black_box(target), 40.0, DistanceMetric::Geodesic))
    });
}

criterion_group!(benches, bench_nearest);
criterion_main!(benches);
