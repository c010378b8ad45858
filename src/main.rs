// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use std::fs;
use std::path::{Path, PathBuf};

use aqi_dashboard::analytics::{self, DEFAULT_TOP_LIMIT};
use aqi_dashboard::{
    classify, estimate, load_csv, logging, predict_with_category, render_blocks,
    AirQualityRecord, AqiSummary, Config, HealthProfile, LinearModel, MitigationAction,
    PollutantReadings, RecommendationTable,
};

#[derive(Parser, Debug)]
#[command(name = "aqi-dashboard", version, about = "Air Quality Index dashboard")]
struct Cli {
    /// JSON config file; environment variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive terminal dashboard (default)
    Ui,
    /// Classify an AQI value
    Classify {
        #[arg(allow_negative_numbers = true)]
        aqi: f64,
    },
    /// Health recommendations for an AQI value
    Recommend {
        #[arg(allow_negative_numbers = true)]
        aqi: f64,
        #[arg(long = "profile")]
        profiles: Vec<HealthProfile>,
    },
    /// Predict AQI from pollutant levels
    Predict {
        #[arg(long, default_value_t = 80.0)]
        pm25: f64,
        #[arg(long, default_value_t = 100.0)]
        pm10: f64,
        #[arg(long, default_value_t = 40.0)]
        no2: f64,
        #[arg(long, default_value_t = 1.0)]
        co: f64,
        #[arg(long, default_value_t = 30.0)]
        o3: f64,
        #[arg(long = "profile")]
        profiles: Vec<HealthProfile>,
    },
    /// Estimate the effect of planting trees or removing cars
    Impact {
        action: ImpactKind,
        #[arg(long)]
        count: u32,
        #[arg(long, allow_negative_numbers = true)]
        aqi: f64,
    },
    /// List cities in the dataset
    Cities,
    /// AQI statistics for one city
    Summary { city: String },
    /// Compare two cities
    Compare { first: String, second: String },
    /// Average AQI per city and month
    Heatmap,
    /// Most polluted cities by mean AQI
    Top {
        #[arg(long, default_value_t = DEFAULT_TOP_LIMIT)]
        limit: usize,
    },
    /// Export a city's records as CSV
    Export {
        city: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Current AQI and weather from the live providers
    #[cfg(feature = "live")]
    Live { city: String },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ImpactKind {
    Trees,
    Cars,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Ui);

    // The TUI owns the terminal, so it stays quiet unless asked.
    let level = match command {
        Command::Ui if !cli.verbose => LevelFilter::Off,
        _ => logging::default_level(cli.verbose),
    };
    logging::init(level);

    let config = Config::load(cli.config.as_deref())?;
    log::debug!("Config: {:?}", config);

    match command {
        Command::Ui => run_ui_mode(&config),
        Command::Classify { aqi } => run_classify(aqi),
        Command::Recommend { aqi, profiles } => run_recommend(&config, aqi, &profiles),
        Command::Predict { pm25, pm10, no2, co, o3, profiles } => {
            let readings = PollutantReadings::new(pm25, pm10, no2, co, o3);
            run_predict(&config, &readings, &profiles)
        }
        Command::Impact { action, count, aqi } => run_impact(action, count, aqi),
        Command::Cities => run_cities(&config),
        Command::Summary { city } => run_summary(&config, &city),
        Command::Compare { first, second } => run_compare(&config, &first, &second),
        Command::Heatmap => run_heatmap(&config),
        Command::Top { limit } => run_top(&config, limit),
        Command::Export { city, out } => run_export(&config, &city, out.as_deref()),
        #[cfg(feature = "live")]
        Command::Live { city } => run_live(&config, &city),
    }
}

fn load_records(config: &Config) -> Result<Vec<AirQualityRecord>> {
    println!("📂 Loading {:?}...", config.data_path);
    let records = load_csv(&config.data_path)?;
    println!("✓ Loaded {} records\n", records.len());
    Ok(records)
}

fn load_recommendations(config: &Config) -> Result<RecommendationTable> {
    match &config.recommendations_path {
        Some(path) => RecommendationTable::from_file(path),
        None => Ok(RecommendationTable::builtin()),
    }
}

fn print_summary(city: &str, summary: Option<&AqiSummary>) {
    match summary {
        Some(s) => {
            println!("🏙️  {}", city);
            println!("   Mean AQI: {:.2} ({})", s.mean, s.mean_category);
            println!("   Min AQI:  {:.2}", s.min);
            println!("   Max AQI:  {:.2}", s.max);
            println!("   Days:     {}", s.count);
        }
        None => println!("⚠️  No data for {}", city),
    }
}

fn run_classify(aqi: f64) -> Result<()> {
    let category = classify(aqi);
    println!("🌫️  AQI {:.1} → {} ({})", aqi, category, category.color_hex());
    Ok(())
}

fn run_recommend(config: &Config, aqi: f64, profiles: &[HealthProfile]) -> Result<()> {
    let table = load_recommendations(config)?;
    let category = classify(aqi);

    println!("🌫️  AQI {:.1} → {}\n", aqi, category);
    println!("{}", render_blocks(&table.recommend_for_profiles(category, profiles)));
    Ok(())
}

fn run_predict(config: &Config, readings: &PollutantReadings, profiles: &[HealthProfile]) -> Result<()> {
    let model = LinearModel::from_file(&config.model_path)?;
    let table = load_recommendations(config)?;
    let prediction = predict_with_category(&model, readings);

    println!("🤖 Predicted AQI: {:.2}", prediction.aqi);
    println!("   Category: {}\n", prediction.category);
    println!("💬 AQI Assistant");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{}", render_blocks(&table.recommend_for_profiles(prediction.category, profiles)));
    Ok(())
}

fn run_impact(kind: ImpactKind, count: u32, aqi: f64) -> Result<()> {
    let action = match kind {
        ImpactKind::Trees => MitigationAction::PlantTrees { count },
        ImpactKind::Cars => MitigationAction::RemoveCars { count },
    };
    if !action.ui_range().contains(&count) {
        log::warn!("{} count {} is outside the usual range {:?}", action.label(), count, action.ui_range());
    }

    let result = estimate(action, aqi);

    println!("🌳 {}: {}", action.label(), count);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("   Current AQI:     {:.2} ({})", aqi, classify(aqi));
    println!("   New AQI:         {:.2} ({})", result.new_aqi, result.resulting_category);
    println!("   AQI reduction:   {:.3}", result.aqi_reduction);
    println!("   PM2.5 reduction: {:.3} µg/m³", result.pm25_reduction);
    if let Some(no2) = result.no2_reduction {
        println!("   NO2 reduction:   {:.3} µg/m³", no2);
    }
    println!("   CO2 reduction:   {:.1} tonnes/year", result.co2_reduction);
    Ok(())
}

fn run_cities(config: &Config) -> Result<()> {
    let records = load_records(config)?;
    for city in analytics::cities(&records) {
        println!("{}", city);
    }
    Ok(())
}

fn run_summary(config: &Config, city: &str) -> Result<()> {
    let records = load_records(config)?;
    let summary = analytics::summary(&records, city);
    print_summary(city, summary.as_ref());

    let shares = analytics::pollutant_contribution(&records, city);
    if !shares.is_empty() {
        println!("\n🧪 Pollutant contribution");
        for share in shares {
            println!("   {:<6} {:>8.2} {:>6.1}%", share.pollutant.label(), share.mean, share.percent);
        }
    }
    Ok(())
}

fn run_compare(config: &Config, first: &str, second: &str) -> Result<()> {
    let records = load_records(config)?;
    let comparison = analytics::compare(&records, first, second);

    print_summary(&comparison.first.city, comparison.first.summary.as_ref());
    println!();
    print_summary(&comparison.second.city, comparison.second.summary.as_ref());

    if let Some(diff) = comparison.mean_difference() {
        println!("\n📊 Mean AQI difference ({} − {}): {:+.2}", first, second, diff);
    }
    Ok(())
}

fn run_heatmap(config: &Config) -> Result<()> {
    let records = load_records(config)?;
    let heatmap = analytics::monthly_heatmap(&records);

    print!("{:<20}", "City");
    for month in 1..=12 {
        print!("{:>7}", month);
    }
    println!();

    for row in &heatmap.rows {
        print!("{:<20}", row.city);
        for value in &row.months {
            match value {
                Some(v) => print!("{:>7.1}", v),
                None => print!("{:>7}", "-"),
            }
        }
        println!();
    }
    Ok(())
}

fn run_top(config: &Config, limit: usize) -> Result<()> {
    let records = load_records(config)?;

    println!("🏭 Top {} most polluted cities", limit);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for (rank, entry) in analytics::top_polluted(&records, limit).iter().enumerate() {
        println!("{:>3}. {:<20} {:>8.2}  {}", rank + 1, entry.city, entry.mean_aqi, entry.category);
    }
    Ok(())
}

fn run_export(config: &Config, city: &str, out: Option<&Path>) -> Result<()> {
    let records = load_records(config)?;
    let selected = analytics::city_records(&records, city);
    if selected.is_empty() {
        bail!("No records for city: {}", city);
    }

    let csv = aqi_dashboard::export_csv(&selected)?;
    match out {
        Some(path) => {
            fs::write(path, csv).with_context(|| format!("Failed to write {:?}", path))?;
            println!("💾 Wrote {} rows to {:?}", selected.len(), path);
        }
        None => print!("{}", csv),
    }
    Ok(())
}

#[cfg(feature = "live")]
fn run_live(config: &Config, city: &str) -> Result<()> {
    use aqi_dashboard::live::{live_aqi_status, weather_status};
    use aqi_dashboard::{LiveStatus, OpenWeatherClient, WaqiClient};

    let aqi_client = WaqiClient::new(&config.live)?;
    let weather_client = OpenWeatherClient::new(&config.live)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let (aqi, weather) = runtime.block_on(async {
        tokio::join!(
            live_aqi_status(&aqi_client, city),
            weather_status(&weather_client, city)
        )
    });

    println!("📡 Live conditions: {}", city);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    match aqi {
        LiveStatus::Available(reading) => {
            println!("   AQI: {:.0} ({}) at {}", reading.aqi, reading.category, reading.station);
            if let Some(dominant) = reading.dominant_pollutant {
                println!("   Dominant pollutant: {}", dominant);
            }
        }
        LiveStatus::Unavailable => println!("   AQI: unavailable"),
    }
    match weather {
        LiveStatus::Available(w) => {
            println!("   Weather: {}, {:.1}°C", w.description, w.temperature_c);
            println!("   Humidity: {:.0}%  Wind: {:.1} m/s", w.humidity_percent, w.wind_speed_ms);
        }
        LiveStatus::Unavailable => println!("   Weather: unavailable"),
    }
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config) -> Result<()> {
    use aqi_dashboard::ModelPort;

    println!("🖥️  Loading AQI Dashboard UI...\n");

    if !config.data_path.exists() {
        eprintln!("❌ Dataset not found at {:?}", config.data_path);
        eprintln!("   Set AQI_DATA_PATH or pass --config.");
        std::process::exit(1);
    }

    let records = load_records(config)?;

    let model: Option<Box<dyn ModelPort>> = match LinearModel::from_file(&config.model_path) {
        Ok(model) => Some(Box::new(model)),
        Err(e) => {
            eprintln!("⚠️  Prediction model unavailable: {:#}", e);
            None
        }
    };

    let recommendations = load_recommendations(config)?;

    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(records, model, recommendations);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin aqi-server --features server");
    std::process::exit(1);
}
