//! Benchmarks for index aggregation and batch assessment

use agroclim_analysis::index::{ndvi_sample, IndexParams};
use agroclim_analysis::pipeline::{assess_batch, RegionSeries};
use agroclim_analysis::PipelineConfig;
use agroclim_core::{BandGrid, ClimateSample, Crop, RasterObservation, Region};
use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn create_band(size: usize, base: f64) -> BandGrid {
    let values: Vec<f64> = (0..size * size)
        .map(|i| base + ((i * 7) % 200) as f64 / 1000.0)
        .collect();
    BandGrid::from_vec(size, size, values).unwrap()
}

fn create_observation(size: usize) -> RasterObservation {
    RasterObservation::new(
        "bench",
        date(2020, 3, 15),
        create_band(size, 0.10),
        create_band(size, 0.35),
        create_band(size, 0.20),
    )
    .unwrap()
}

fn create_batch(regions: usize, years: usize) -> Vec<RegionSeries> {
    (0..regions)
        .map(|r| {
            let id = format!("region-{r}");
            let region =
                Region::from_bbox(id.as_str(), id.as_str(), (18.0, -34.0, 19.0, -33.0), Crop::Maize)
                    .unwrap();
            let mut observations = Vec::new();
            let mut climate = Vec::new();
            for i in 0..years {
                let d = date(2010 + i as i32, 1, 15);
                observations.push(
                    RasterObservation::new(
                        id.as_str(),
                        d,
                        BandGrid::filled(16, 16, 0.10 + 0.001 * r as f64).unwrap(),
                        BandGrid::filled(16, 16, 0.35 - 0.002 * i as f64).unwrap(),
                        BandGrid::filled(16, 16, 0.20).unwrap(),
                    )
                    .unwrap(),
                );
                climate.push(
                    ClimateSample::new(
                        id.as_str(),
                        d,
                        18.0 + 0.05 * i as f64,
                        90.0 - 0.5 * (r + i) as f64,
                        false,
                    )
                    .unwrap(),
                );
            }
            RegionSeries { region, observations, climate }
        })
        .collect()
}

fn bench_ndvi_sample(c: &mut Criterion) {
    let mut group = c.benchmark_group("index/ndvi_sample");
    let params = IndexParams::default();
    for size in [256, 512, 1024, 2048] {
        let obs = create_observation(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| ndvi_sample(black_box(&obs), black_box(&params)).unwrap())
        });
    }
    group.finish();
}

fn bench_assess_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline/assess_batch");
    let config = PipelineConfig::default();
    for regions in [4, 16, 64] {
        let batch = create_batch(regions, 14);
        group.bench_with_input(BenchmarkId::from_parameter(regions), &regions, |b, _| {
            b.iter(|| assess_batch(black_box(&batch), black_box(&config)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_ndvi_sample, bench_assess_batch);
criterion_main!(benches);
