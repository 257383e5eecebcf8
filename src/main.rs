use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    process,
};

use clap::{Parser, Subcommand};
use log::info;

use lapstate::{
    AnalyzerConfig, LapStateError, LapSummary, ReportFormat, ReportRow, SegmentClassifier,
    console::{banner, prompt_dataset_choice},
    telemetry::load_telemetry_csv,
    writer::{export_report, read_report},
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Config file to use instead of the one in the user config directory
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify every sample of a lap and write the annotated report
    Analyze(AnalyzeArgs),
    /// Print the segment breakdown of an existing report
    Summarize {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long, value_enum, default_value_t = ReportFormat::Csv)]
        format: ReportFormat,
    },
    /// Write the default configuration file
    InitConfig {
        #[arg(long)]
        force: bool,
    },
}

#[derive(clap::Args, Debug, Default)]
struct AnalyzeArgs {
    /// Dataset to analyse, 0 or 1. Asked on the console when neither this nor --input is set
    #[arg(short, long)]
    driver: Option<i64>,

    #[arg(short, long)]
    input: Option<PathBuf>,

    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long, value_enum)]
    format: Option<ReportFormat>,

    #[arg(long)]
    no_summary: bool,
}

fn analyze(config: &AnalyzerConfig, args: &AnalyzeArgs) -> Result<(), LapStateError> {
    println!("{}", banner(&config.title));

    let input = match (&args.input, args.driver) {
        (Some(input), _) => input.clone(),
        (None, Some(choice)) => config.dataset(choice).path.clone(),
        (None, None) => {
            let choice =
                prompt_dataset_choice(config, &mut io::stdin().lock(), &mut io::stdout())?;
            config.dataset(choice).path.clone()
        }
    };

    let series = load_telemetry_csv(&input, &config.columns, config.sample_limit)?;
    let classifier = SegmentClassifier::new(&config.classifier);

    let output = args.output.as_ref().unwrap_or(&config.output);
    let format = args.format.unwrap_or(config.report_format);
    let rows = {
        let mut progress = io::stdout().lock();
        let rows = export_report(output, format, &series, &classifier, &mut progress);
        progress
            .flush()
            .map_err(|e| LapStateError::WriterError { source: e })?;
        rows
    };

    if !args.no_summary {
        // the summary does not depend on the report being written
        let rows = rows.unwrap_or_else(|| {
            series
                .iter()
                .zip(classifier.classify_series(&series))
                .map(|(sample, state)| ReportRow::new(sample, state))
                .collect()
        });
        println!();
        print!("{}", LapSummary::from_rows(&rows, config.sector_bounds));
    }
    Ok(())
}

fn summarize(
    config: &AnalyzerConfig,
    input: &Path,
    format: ReportFormat,
) -> Result<(), LapStateError> {
    let rows = read_report(input, format)?;
    print!("{}", LapSummary::from_rows(&rows, config.sector_bounds));
    Ok(())
}

fn init_config(path: Option<&Path>, force: bool) -> Result<(), LapStateError> {
    let path = AnalyzerConfig::init(path, force)?;
    info!("Wrote default config to {}", path.display());
    println!("Config written to {}", path.display());
    Ok(())
}

fn run(cli: &Args) -> Result<(), LapStateError> {
    let config_path = cli.config.as_deref();
    match &cli.command {
        Some(Commands::InitConfig { force }) => init_config(config_path, *force),
        Some(Commands::Summarize { input, format }) => {
            summarize(&AnalyzerConfig::load(config_path)?, input, *format)
        }
        Some(Commands::Analyze(args)) => analyze(&AnalyzerConfig::load(config_path)?, args),
        None => analyze(&AnalyzerConfig::load(config_path)?, &AnalyzeArgs::default()),
    }
}

fn main() {
    #[cfg(debug_assertions)]
    colog::init();

    let cli = Args::parse();
    if let Err(e) = run(&cli) {
        eprintln!("{}", e);
        process::exit(1);
    }
}
