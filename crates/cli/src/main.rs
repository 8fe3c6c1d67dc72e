//! Agroclim CLI - Climate and vegetation risk assessment for farming regions

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use agroclim_analysis::index::{
    crop_health_index, moisture_mean, ndvi_grid, ndvi_sample, IndexParams,
};
use agroclim_analysis::loader::{ClimateSeriesLoader, RasterBandLoader};
use agroclim_analysis::pipeline::{assess_batch, RegionSeries};
use agroclim_analysis::projection::{project_yield, project_yield_series};
use agroclim_analysis::PipelineConfig;
use agroclim_core::{
    reference_regions, Crop, DateRange, EmissionScenario, RasterObservation, RegionalTrendSummary,
};

mod loaders;
use loaders::{
    read_band, read_mask, write_band, GeoTiffBandLoader, JsonClimateLoader, StudyManifest,
};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "agroclim")]
#[command(author, version, about = "Climate and vegetation risk assessment for farming regions", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in region catalogue
    Regions {
        /// Emit the catalogue as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compute vegetation indices for one satellite scene
    Index {
        /// Red band file (GeoTIFF)
        #[arg(long)]
        red: PathBuf,
        /// NIR band file (GeoTIFF)
        #[arg(long)]
        nir: PathBuf,
        /// SWIR band file (GeoTIFF)
        #[arg(long)]
        swir: PathBuf,
        /// Cloud mask raster; nonzero pixels are treated as cloudy
        #[arg(long)]
        mask: Option<PathBuf>,
        /// Multiplier from stored values to reflectance (Sentinel-2 L2A: 0.0001)
        #[arg(long, default_value = "1.0")]
        scale: f64,
        /// Region identifier recorded on the sample
        #[arg(long, default_value = "scene")]
        region: String,
        /// Acquisition date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// Minimum usable-pixel fraction required to accept the scene
        #[arg(long, default_value = "0.1")]
        min_valid: f64,
        /// Write the per-pixel NDVI grid to this GeoTIFF
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Assess climate and vegetation risk for the regions of a study
    Assess {
        /// Study manifest: regions, climate records and scene list (JSON)
        manifest: PathBuf,
        /// Climate records (JSON array) used instead of the manifest's
        #[arg(long)]
        climate: Option<PathBuf>,
        /// Start of the assessment window (defaults to the earliest record)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// End of the assessment window (defaults to the latest record)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Pipeline configuration overrides (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write summaries as JSON instead of a text report
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Assembled scenes kept in the in-memory cache
        #[arg(long, default_value = "32")]
        cache_scenes: usize,
    },
    /// Project yield impacts from saved summaries
    Project {
        /// Summaries file produced by `assess --output`
        summaries: PathBuf,
        /// Region to project (defaults to every region in the file)
        #[arg(long)]
        region: Option<String>,
        /// Crop to project: wheat, maize, sugarcane, sorghum, millet
        #[arg(long)]
        crop: String,
        /// Emission scenario: rcp26, rcp45, rcp85
        #[arg(long, default_value = "rcp85")]
        scenario: String,
        /// Target year
        #[arg(long, default_value = "2050")]
        year: i32,
        /// Project every year from the end of the history to the target
        #[arg(long)]
        series: bool,
        /// Pipeline configuration overrides (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write projections as JSON instead of a text report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn done(name: &str, path: &PathBuf, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let config = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .with_context(|| format!("Failed to read config {}", p.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Invalid config {}", p.display()))?
        }
        None => PipelineConfig::default(),
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn parse_scenario(s: &str) -> Result<EmissionScenario> {
    match s.to_lowercase().replace(['.', ' ', '-'], "").as_str() {
        "rcp26" | "low" => Ok(EmissionScenario::rcp26()),
        "rcp45" | "moderate" | "mid" => Ok(EmissionScenario::rcp45()),
        "rcp85" | "high" => Ok(EmissionScenario::rcp85()),
        _ => anyhow::bail!("Unknown scenario: {}. Use rcp26, rcp45, or rcp85.", s),
    }
}

/// Explicit bounds win; anything missing falls back to the extent of the
/// manifest's dated records.
fn study_range(
    study: &StudyManifest,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<DateRange> {
    let mut dates = study
        .climate
        .iter()
        .map(|s| s.date)
        .chain(study.scenes.iter().map(|s| s.date));
    let first = dates.next();
    let (min, max) = dates.fold((first, first), |(lo, hi), d| {
        (lo.map(|l| l.min(d)), hi.map(|h| h.max(d)))
    });
    let start = from
        .or(min)
        .context("Manifest has no dated records; pass --from")?;
    let end = to
        .or(max)
        .context("Manifest has no dated records; pass --to")?;
    Ok(DateRange::new(start, end)?)
}

fn print_summary(s: &RegionalTrendSummary) {
    println!("{}", s.region);
    println!("  span         : {} .. {}", s.span.start, s.span.end);
    println!(
        "  temperature  : {:+.3} degC/yr (mean {:.1} degC)",
        s.temperature_slope, s.mean_temperature_c
    );
    println!(
        "  rainfall     : {:+.2} mm/yr (mean {:.1} mm)",
        s.rainfall_slope, s.mean_rainfall_mm
    );
    println!("  ndvi         : {:+.4} /yr", s.ndvi_slope);
    println!(
        "  correlation  : {:+.2} over {} pairs",
        s.ndvi_rainfall_correlation, s.correlation_pairs
    );
    println!(
        "  drought      : {:.0}% of records",
        s.drought_frequency * 100.0
    );
    println!(
        "  risk         : {:.2} ({}) driven by {}{}",
        s.risk_score,
        s.risk_level(),
        s.dominant_driver,
        if s.fallback_normalization {
            " [fallback normalization]"
        } else {
            ""
        }
    );
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        // ── Regions ──────────────────────────────────────────────────
        Commands::Regions { json } => {
            let regions = reference_regions();
            if json {
                println!("{}", serde_json::to_string_pretty(&regions)?);
            } else {
                for r in &regions {
                    let (min_lon, min_lat, max_lon, max_lat) = r.bounds();
                    println!("{} - {}", r.id, r.name);
                    println!("  crop: {}", r.primary_crop);
                    println!(
                        "  bbox: [{:.1}, {:.1}, {:.1}, {:.1}]",
                        min_lon, min_lat, max_lon, max_lat
                    );
                }
            }
        }

        // ── Index ────────────────────────────────────────────────────
        Commands::Index {
            red,
            nir,
            swir,
            mask,
            scale,
            region,
            date,
            min_valid,
            output,
        } => {
            let params = IndexParams {
                min_valid_fraction: min_valid,
                ..Default::default()
            };
            params.validate()?;

            let pb = spinner("Reading bands...");
            let red_band = read_band(&red, scale).context("Failed to read red band")?;
            let nir_band = read_band(&nir, scale).context("Failed to read NIR band")?;
            let swir_band = read_band(&swir, scale).context("Failed to read SWIR band")?;
            pb.finish_and_clear();

            let mut obs =
                RasterObservation::new(region.as_str(), date, red_band, nir_band, swir_band)?;
            if let Some(mask_path) = &mask {
                obs = obs
                    .with_cloud_mask(read_mask(mask_path)?)
                    .context("Failed to apply cloud mask")?;
            }
            let (rows, cols) = obs.shape();
            info!(
                "Scene: {} x {}, cloud fraction {:.2}",
                cols,
                rows,
                obs.cloud_fraction()
            );

            let start = Instant::now();
            let sample = ndvi_sample(&obs, &params)?;
            let moisture = moisture_mean(&obs, &params)?;
            let elapsed = start.elapsed();

            println!("{} ({})", region, date);
            println!(
                "  NDVI        : {:+.4} (coverage {:.1}%)",
                sample.ndvi,
                sample.coverage * 100.0
            );
            println!("  moisture    : {:+.4}", moisture);
            println!("  crop health : {:.1}/100", crop_health_index(sample.ndvi));

            if let Some(path) = output {
                write_band(&path, &ndvi_grid(&obs, &params))?;
                done("NDVI grid", &path, elapsed);
            } else {
                println!("  Processing time: {:.2?}", elapsed);
            }
        }

        // ── Assess ───────────────────────────────────────────────────
        Commands::Assess {
            manifest,
            climate,
            from,
            to,
            config,
            output,
            cache_scenes,
        } => {
            let config = load_config(config.as_deref())?;
            let mut study = StudyManifest::from_file(&manifest)
                .with_context(|| format!("Failed to read manifest {}", manifest.display()))?;
            if let Some(path) = &climate {
                study.climate = read_json(path)?;
            }
            let range = study_range(&study, from, to)?;
            let regions = study.study_regions();

            let base = manifest.parent().map(Path::to_path_buf).unwrap_or_default();
            let mut band_loader = GeoTiffBandLoader::new(base, study.scenes, cache_scenes);
            let mut climate_loader = JsonClimateLoader::new(study.climate);
            if climate_loader.is_empty() {
                warn!("no climate records loaded; every region will fail trend analysis");
            }
            info!(
                "Assessing {} regions over {} .. {} ({} scenes, {} climate records)",
                regions.len(),
                range.start,
                range.end,
                band_loader.scene_count(),
                climate_loader.len()
            );

            let pb = spinner("Loading scenes...");
            let mut batch = Vec::with_capacity(regions.len());
            for region in regions {
                let observations = band_loader
                    .load_observations(&region.id, range)
                    .with_context(|| format!("Failed to load scenes for {}", region.id))?;
                let climate = climate_loader.load_climate(&region.id, range)?;
                batch.push(RegionSeries {
                    region,
                    observations,
                    climate,
                });
            }
            pb.finish_and_clear();

            let start = Instant::now();
            let result = assess_batch(&batch, &config)?;
            let elapsed = start.elapsed();

            for f in &result.failures {
                eprintln!("{}: {} failed: {}", f.region, f.stage, f.error);
            }
            if result.summaries.is_empty() {
                anyhow::bail!(
                    "No region produced a summary ({} failures)",
                    result.failures.len()
                );
            }

            match output {
                Some(path) => {
                    write_json(&result.summaries, &path)?;
                    done("Summaries", &path, elapsed);
                }
                None => {
                    println!(
                        "Assessed {} regions ({} failures)\n",
                        result.summaries.len(),
                        result.failures.len()
                    );
                    for s in &result.summaries {
                        print_summary(s);
                    }
                    println!("  Processing time: {:.2?}", elapsed);
                }
            }
        }

        // ── Project ──────────────────────────────────────────────────
        Commands::Project {
            summaries,
            region,
            crop,
            scenario,
            year,
            series,
            config,
            output,
        } => {
            let config = load_config(config.as_deref())?;
            let crop: Crop = crop.parse()?;
            let scenario = parse_scenario(&scenario)?;
            let all: Vec<RegionalTrendSummary> = read_json(&summaries)?;
            if all.is_empty() {
                anyhow::bail!("{} holds no summaries", summaries.display());
            }
            let selected: Vec<&RegionalTrendSummary> = match region.as_deref() {
                Some(id) => {
                    let found = all
                        .iter()
                        .find(|s| s.region.as_str() == id)
                        .with_context(|| format!("No summary for region '{}'", id))?;
                    vec![found]
                }
                None => all.iter().collect(),
            };

            let start = Instant::now();
            let mut projections = Vec::new();
            for summary in selected {
                if series {
                    let first = summary.span.end.year() + 1;
                    projections.extend(project_yield_series(
                        summary,
                        crop,
                        &scenario,
                        first,
                        year,
                        &config.projection,
                    )?);
                } else {
                    projections.push(project_yield(
                        summary,
                        crop,
                        &scenario,
                        year,
                        &config.projection,
                    )?);
                }
            }
            let elapsed = start.elapsed();

            match output {
                Some(path) => {
                    write_json(&projections, &path)?;
                    done("Projections", &path, elapsed);
                }
                None => {
                    for p in &projections {
                        println!(
                            "{} {} {} {}: {:+.1}% [{:+.1} .. {:+.1}]{}",
                            p.region,
                            p.crop,
                            p.scenario,
                            p.target_year,
                            p.yield_change_pct,
                            p.band_low_pct,
                            p.band_high_pct,
                            if p.clipped { " (clipped)" } else { "" }
                        );
                    }
                    println!("  Processing time: {:.2?}", elapsed);
                }
            }
        }
    }

    Ok(())
}
