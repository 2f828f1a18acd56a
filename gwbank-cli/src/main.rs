use clap::Parser;
use gwbank::{
    Approximant, CachedBankConfig, CachedFilterBank, FilterBank, FilterBankConfig,
    GeneratorOptions, JsonCache, LoadStatus, Psd, SpaGenerator, TemplateFilter,
    DEFAULT_CACHE_SAMPLE_RATE,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "GwBank CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ModeConfig {
    #[default]
    Synthesize,
    Cached,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PsdConfig {
    Flat { level: f64 },
    File { path: String },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OptionsJson {
    phase_order: Option<u32>,
    f_final: Option<f64>,
}

impl From<OptionsJson> for GeneratorOptions {
    fn from(value: OptionsJson) -> Self {
        Self {
            phase_order: value.phase_order,
            f_final: value.f_final,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    template_path: String,
    output_path: Option<String>,
    mode: ModeConfig,
    approximant: String,
    filter_length: usize,
    delta_f: f64,
    f_lower: f64,
    psd: Option<PsdConfig>,
    options: OptionsJson,
    cache_path: Option<String>,
    sample_rate: f64,
    parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            template_path: String::new(),
            output_path: None,
            mode: ModeConfig::Synthesize,
            approximant: Approximant::SpaTmplt.name().to_string(),
            filter_length: 1025,
            delta_f: 0.25,
            f_lower: 30.0,
            psd: None,
            options: OptionsJson::default(),
            cache_path: None,
            sample_rate: DEFAULT_CACHE_SAMPLE_RATE,
            parallel: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct FilterRecord {
    index: usize,
    mass1: f64,
    mass2: f64,
    end_frequency: Option<f64>,
    end_idx: Option<usize>,
    sigma: Option<f64>,
    length_in_time: Option<f64>,
}

impl FilterRecord {
    fn new(index: usize, filter: &TemplateFilter<'_, gwbank::num_complex::Complex64>) -> Self {
        Self {
            index,
            mass1: filter.params().mass1,
            mass2: filter.params().mass2,
            end_frequency: filter.end_frequency(),
            end_idx: filter.end_idx(),
            sigma: filter.sigma(),
            length_in_time: filter.length_in_time(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    templates: usize,
    fallback_reason: Option<String>,
    filters: Vec<FilterRecord>,
}

fn fallback_reason(status: &LoadStatus) -> Option<String> {
    match status {
        LoadStatus::Parsed => None,
        LoadStatus::Fallback { reason } => Some(reason.to_string()),
    }
}

fn load_psd(config: &Config) -> Result<Option<Psd>, Box<dyn std::error::Error>> {
    let psd = match &config.psd {
        None => None,
        Some(PsdConfig::Flat { level }) => {
            Some(Psd::flat(config.filter_length, config.delta_f, *level)?)
        }
        Some(PsdConfig::File { path }) => {
            let values: Vec<f64> = serde_json::from_str(&fs::read_to_string(path)?)?;
            Some(Psd::new(values, config.delta_f)?)
        }
    };
    Ok(psd)
}

fn run_synthesize(config: Config) -> Result<Output, Box<dyn std::error::Error>> {
    let approximant: Approximant = config.approximant.parse()?;
    let psd = load_psd(&config)?;
    let cfg = FilterBankConfig::new(
        approximant,
        config.filter_length,
        config.delta_f,
        config.f_lower,
    )
    .with_options(config.options.into());
    let bank: FilterBank<_> = FilterBank::open(&config.template_path, cfg, SpaGenerator, psd)?;

    let filters = if config.parallel {
        bank.par_get_all()?
    } else {
        bank.iter().collect::<Result<Vec<_>, _>>()?
    };
    Ok(Output {
        templates: bank.len(),
        fallback_reason: fallback_reason(bank.load_status()),
        filters: filters
            .iter()
            .enumerate()
            .map(|(index, filter)| FilterRecord::new(index, filter))
            .collect(),
    })
}

fn run_cached(config: Config) -> Result<Output, Box<dyn std::error::Error>> {
    let cache_path = config
        .cache_path
        .as_deref()
        .ok_or("cache_path must be set in cached mode")?;
    let psd = load_psd(&config)?.ok_or("psd must be set in cached mode")?;
    let cache = JsonCache::open(cache_path)?;
    let cfg = CachedBankConfig {
        sample_rate: config.sample_rate,
        ..CachedBankConfig::new(config.filter_length, config.delta_f, config.f_lower)
    };
    let bank: CachedFilterBank<_> =
        CachedFilterBank::open(&config.template_path, cache, cfg, psd)?;

    let mut filters = Vec::with_capacity(bank.len());
    for (index, filter) in bank.iter().enumerate() {
        filters.push(FilterRecord::new(index, &filter?));
    }
    Ok(Output {
        templates: bank.len(),
        fallback_reason: fallback_reason(bank.load_status()),
        filters,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("gwbank=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.template_path.is_empty() {
        return Err("template_path must be set in the config".into());
    }

    let output_path = config.output_path.clone();
    let output = match config.mode {
        ModeConfig::Synthesize => run_synthesize(config)?,
        ModeConfig::Cached => run_cached(config)?,
    };
    tracing::info!(
        templates = output.templates,
        filters = output.filters.len(),
        "bank evaluated"
    );
    let json = serde_json::to_string_pretty(&output)?;

    match output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
