//! Building Energy Estimation CLI
//!
//! Scores building and weather records with trained regression artifacts
//! and draws exploratory plots of energy datasets.

use clap::{Args, Parser, Subcommand};
use energy::{Config, Result};

#[derive(Parser)]
#[command(name = "energy")]
#[command(about = "Building energy consumption estimation", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new project with default config and vocabularies
    Init,
    /// List available model artifacts
    Models,
    /// Estimate energy consumption for one building record
    Predict {
        /// Model artifact to use (defaults to the only or first listed model)
        #[arg(long)]
        model: Option<String>,
        /// Read the record from a JSON file
        #[arg(long, conflicts_with = "interactive")]
        record: Option<String>,
        /// Fill in the record through a terminal form
        #[arg(short, long)]
        interactive: bool,
        /// Derive hour, day, month and day of week from a timestamp
        #[arg(long)]
        timestamp: Option<String>,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
        #[command(flatten)]
        fields: RecordArgs,
    },
    /// Model management commands
    Model {
        #[command(subcommand)]
        action: ModelCommands,
    },
    /// Show the category codes of each vocabulary
    Vocab,
    /// Exploratory plots of a CSV dataset
    Plot {
        #[command(subcommand)]
        kind: PlotCommands,
    },
}

#[derive(Subcommand)]
enum ModelCommands {
    /// Show artifact information
    Info {
        /// Artifact file name
        name: String,
    },
}

#[derive(Subcommand)]
enum PlotCommands {
    /// Box plot and histogram of a numeric column
    Distribution {
        /// Input CSV file
        data: String,
        /// Numeric column
        column: String,
        /// Output image (defaults to <output_dir>/<column>_distribution.png)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Box plot and kernel density curve of a numeric column
    Density {
        data: String,
        column: String,
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Frequency of each label in a column
    Count {
        data: String,
        column: String,
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Mean of a numeric column per category
    Trend {
        data: String,
        /// Category column for the x axis
        category: String,
        /// Numeric column to average
        #[arg(default_value = "meter_reading")]
        value: String,
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Correlation heatmap of numeric columns
    Heatmap {
        data: String,
        /// Columns to include (defaults to every numeric column)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Record fields given on the command line
#[derive(Args, Debug, Default)]
struct RecordArgs {
    #[arg(long)]
    building_id: Option<u32>,
    #[arg(long)]
    meter: Option<String>,
    #[arg(long)]
    primary_use: Option<String>,
    #[arg(long)]
    square_feet: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    air_temperature: Option<f64>,
    #[arg(long)]
    cloud_coverage: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    precip_depth_1_hr: Option<f64>,
    #[arg(long)]
    sea_level_pressure: Option<f64>,
    #[arg(long)]
    wind_direction: Option<f64>,
    #[arg(long)]
    wind_speed: Option<f64>,
    #[arg(long)]
    relative_humidity: Option<f64>,
    #[arg(long)]
    hour: Option<u8>,
    #[arg(long)]
    dayofweek: Option<u8>,
    #[arg(long)]
    month: Option<u8>,
    #[arg(long)]
    day: Option<u8>,
    /// 0 or 1
    #[arg(long)]
    isholiday: Option<u8>,
    #[arg(long)]
    season: Option<String>,
    /// 0 or 1
    #[arg(long)]
    isdaytime: Option<u8>,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use table, json, or csv.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    // Run command
    let result = match cli.command {
        Commands::Init => commands::init(&cli.config),
        Commands::Models => commands::models(&config),
        Commands::Predict {
            model,
            record,
            interactive,
            timestamp,
            format,
            fields,
        } => commands::predict(&config, model, record, interactive, timestamp, format, fields),
        Commands::Model { action } => match action {
            ModelCommands::Info { name } => commands::model_info(&config, &name),
        },
        Commands::Vocab => commands::vocab(&config),
        Commands::Plot { kind } => commands::plot(&config, kind),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use energy::analysis::{self, Frame};
    use energy::features::temporal::calendar_parts;
    use energy::features::EncoderBank;
    use energy::form::Form;
    use energy::predict::inference::format_estimate;
    use energy::predict::{ArtifactLoader, DirectoryLister, ModelLister, Predictor};
    use energy::{BuildingRecord, CategoricalField, EnergyError};
    use std::path::{Path, PathBuf};

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        let vocab_dir = &config.artifacts.vocabulary_dir;
        EncoderBank::with_defaults().save(vocab_dir)?;
        println!("Wrote default vocabularies to {}/", vocab_dir);

        std::fs::create_dir_all(&config.artifacts.models_dir)?;
        std::fs::create_dir_all(&config.plots.output_dir)?;
        println!(
            "Created {}/ and {}/ directories",
            config.artifacts.models_dir, config.plots.output_dir
        );

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!(
            "  2. Copy trained .{} artifacts into {}/",
            config.artifacts.model_extension, config.artifacts.models_dir
        );
        println!("  3. Run 'energy models' to check they are found");
        println!("  4. Run 'energy predict --interactive' to make an estimate");

        Ok(())
    }

    fn load_encoders(config: &Config) -> Result<EncoderBank> {
        let bank = EncoderBank::load(&config.artifacts.vocabulary_dir)?;
        log::debug!("Loaded vocabularies from {}", config.artifacts.vocabulary_dir);
        Ok(bank)
    }

    pub fn models(config: &Config) -> Result<()> {
        let names = DirectoryLister::from_config(&config.artifacts).list_models()?;

        if names.is_empty() {
            println!("No models found in {}", config.artifacts.models_dir);
            return Ok(());
        }

        println!("Available models");
        println!("───────────────────────────────");
        for name in &names {
            println!("  {}", name);
        }

        Ok(())
    }

    pub fn predict(
        config: &Config,
        model: Option<String>,
        record_file: Option<String>,
        interactive: bool,
        timestamp: Option<String>,
        format: OutputFormat,
        fields: RecordArgs,
    ) -> Result<()> {
        let encoders = load_encoders(config)?;
        let predictor = Predictor::new(
            &encoders,
            DirectoryLister::from_config(&config.artifacts),
            ArtifactLoader::from_config(&config.artifacts),
        );

        let stdin = std::io::stdin();
        let mut form = Form::new(stdin.lock(), std::io::stdout());

        let model_name = match model {
            Some(name) => name,
            None if interactive => form.choose_model(&predictor.available_models()?)?,
            None => match predictor.available_models()?.into_iter().next() {
                Some(name) => name,
                None => {
                    log::warn!(
                        "No .{} artifacts in {}",
                        config.artifacts.model_extension,
                        config.artifacts.models_dir
                    );
                    return Err(EnergyError::NoModels);
                }
            },
        };

        let mut record = if let Some(path) = record_file {
            BuildingRecord::from_json_file(&path)?
        } else if interactive {
            form.record(&encoders)?
        } else {
            record_from_args(fields)?
        };

        if let Some(ts) = timestamp {
            let parts = calendar_parts(&ts)?;
            log::debug!("Calendar fields from {}: {:?}", ts, parts);
            parts.apply(&mut record);
        }

        let estimate = predictor.predict(&record, &model_name)?;

        match format {
            OutputFormat::Table => {
                print!("{}", format_estimate(&estimate, &record));
            }
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "model": estimate.model,
                    "target": estimate.target,
                    "value": estimate.value,
                    "record": record,
                });
                let text = serde_json::to_string_pretty(&json)
                    .map_err(|e| EnergyError::Parse(e.to_string()))?;
                println!("{}", text);
            }
            OutputFormat::Csv => {
                println!("building_id,meter,primary_use,model,{}", estimate.target);
                println!(
                    "{},{},\"{}\",{},{}",
                    record.building_id,
                    record.meter,
                    record.primary_use,
                    estimate.model,
                    estimate.value
                );
            }
        }

        Ok(())
    }

    fn record_from_args(args: RecordArgs) -> Result<BuildingRecord> {
        let mut missing = Vec::new();
        macro_rules! need {
            ($field:ident) => {
                match args.$field {
                    Some(v) => v,
                    None => {
                        missing.push(stringify!($field));
                        Default::default()
                    }
                }
            };
        }
        let flag = |name: &str, value: u8| match value {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(EnergyError::Parse(format!(
                "--{} must be 0 or 1, got {}",
                name, other
            ))),
        };

        let record = BuildingRecord {
            building_id: need!(building_id),
            meter: need!(meter),
            primary_use: need!(primary_use),
            square_feet: need!(square_feet),
            air_temperature: need!(air_temperature),
            cloud_coverage: need!(cloud_coverage),
            precip_depth_1_hr: need!(precip_depth_1_hr),
            sea_level_pressure: need!(sea_level_pressure),
            wind_direction: need!(wind_direction),
            wind_speed: need!(wind_speed),
            relative_humidity: need!(relative_humidity),
            hour: need!(hour),
            dayofweek: need!(dayofweek),
            month: need!(month),
            day: need!(day),
            isholiday: flag("isholiday", need!(isholiday))?,
            season: need!(season),
            isdaytime: flag("isdaytime", need!(isdaytime))?,
        };

        if !missing.is_empty() {
            return Err(EnergyError::Parse(format!(
                "Missing record fields: --{}. Use --record <file> or --interactive instead.",
                missing.join(", --").replace('_', "-")
            )));
        }
        Ok(record)
    }

    pub fn model_info(config: &Config, name: &str) -> Result<()> {
        let available = DirectoryLister::from_config(&config.artifacts).list_models()?;
        if !available.iter().any(|n| n == name) {
            return Err(EnergyError::ModelNotFound(name.to_string()));
        }

        let artifact = ArtifactLoader::from_config(&config.artifacts).load_artifact(name)?;
        let header = artifact.header();

        println!("Model Information");
        println!("───────────────────────────────");
        println!(
            "  Path:           {}",
            Path::new(&config.artifacts.models_dir).join(name).display()
        );
        println!("  Target:         {}", header.target);
        println!("  Schema version: {}", header.schema_version);
        println!("  Hidden layers:  {:?}", header.hidden_dims);
        println!("  Parameters:     {}", artifact.num_params());
        println!("  Features:       {}", header.feature_columns.join(", "));

        Ok(())
    }

    pub fn vocab(config: &Config) -> Result<()> {
        let encoders = load_encoders(config)?;

        for field in CategoricalField::ALL {
            let encoder = encoders.encoder(field);
            println!("{} ({} labels)", field, encoder.len());
            println!("───────────────────────────────");
            for (code, label) in encoder.vocabulary().iter().enumerate() {
                println!("  {:>3}  {}", code, label);
            }
            println!();
        }

        Ok(())
    }

    fn output_path(config: &Config, output: Option<String>, default_name: String) -> Result<PathBuf> {
        match output {
            Some(path) => Ok(PathBuf::from(path)),
            None => {
                std::fs::create_dir_all(&config.plots.output_dir)?;
                Ok(Path::new(&config.plots.output_dir).join(default_name))
            }
        }
    }

    pub fn plot(config: &Config, kind: PlotCommands) -> Result<()> {
        let size = (config.plots.width, config.plots.height);

        let path = match kind {
            PlotCommands::Distribution {
                data,
                column,
                output,
            } => {
                let frame = Frame::from_csv_path(&data)?;
                let path = output_path(config, output, format!("{}_distribution.png", column))?;
                let title = format!("Distribution of {}", column);
                analysis::distribution_plot(&frame, &column, &title, &path, size)?;
                path
            }
            PlotCommands::Density {
                data,
                column,
                output,
            } => {
                let frame = Frame::from_csv_path(&data)?;
                let path = output_path(config, output, format!("{}_density.png", column))?;
                let title = format!("Density of {}", column);
                analysis::density_plot(&frame, &column, &title, &path, size)?;
                path
            }
            PlotCommands::Count {
                data,
                column,
                output,
            } => {
                let frame = Frame::from_csv_path(&data)?;
                let path = output_path(config, output, format!("{}_count.png", column))?;
                let title = format!("Count of {}", column);
                analysis::count_plot(&frame, &column, &title, &path, size)?;
                path
            }
            PlotCommands::Trend {
                data,
                category,
                value,
                output,
            } => {
                let frame = Frame::from_csv_path(&data)?;
                let path =
                    output_path(config, output, format!("{}_by_{}.png", value, category))?;
                let title = format!("Mean {} by {}", value, category);
                analysis::trend_plot(&frame, &category, &value, &title, &path, size)?;
                path
            }
            PlotCommands::Heatmap {
                data,
                columns,
                output,
            } => {
                let frame = Frame::from_csv_path(&data)?;
                let selected: Vec<&str> = if columns.is_empty() {
                    frame.numeric_column_names()
                } else {
                    columns.iter().map(String::as_str).collect()
                };
                let path = output_path(config, output, "correlation_heatmap.png".to_string())?;
                analysis::correlation_heatmap(&frame, &selected, "Correlation", &path, size)?;
                path
            }
        };

        println!("Saved plot to {}", path.display());
        Ok(())
    }
}
