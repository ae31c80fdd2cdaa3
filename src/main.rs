use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use winter_stream::broker::{self, NoopPublisher, Publisher};
use winter_stream::config::{AppConfig, LoggingConfig};
use winter_stream::file_writer::LogWriter;
use winter_stream::generator::MessageGenerator;
use winter_stream::logging::init_logging;
use winter_stream::producer::{run_producer, ProducerOptions};
use winter_stream::report::{generate_report, ReportFormat};
use winter_stream::tail::FileTail;
use winter_stream::{Consumer, Database, Pipeline, SentimentAnalyzer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Extra configuration file, applied after config/default and config/local
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate messages into the live data file and, if reachable, Kafka
    Produce {
        /// Stop after this many messages
        #[arg(long)]
        max_messages: Option<u64>,

        /// Stop after this many seconds
        #[arg(long)]
        run_for_secs: Option<u64>,

        /// Seconds between messages (overrides configuration)
        #[arg(long)]
        interval_secs: Option<u64>,

        /// Seed for reproducible messages
        #[arg(long)]
        seed: Option<u64>,

        /// Skip Kafka and write the file only
        #[arg(long)]
        no_broker: bool,
    },
    /// Tail the live data file and store sentiment scores
    ConsumeFile {
        /// Stop after this many messages
        #[arg(long)]
        max_messages: Option<u64>,

        /// Process what is in the file now, then exit
        #[arg(long)]
        once: bool,

        /// Delete the store before consuming
        #[arg(long)]
        fresh: bool,
    },
    /// Subscribe to the Kafka topic and store sentiment scores
    ConsumeKafka {
        /// Stop after this many messages
        #[arg(long)]
        max_messages: Option<u64>,

        /// Delete the store before consuming
        #[arg(long)]
        fresh: bool,
    },
    /// Render the average sentiment per category
    Report {
        /// Output path for the chart (CSV goes next to it)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Which files to write
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Both)]
        format: ReportFormat,
    },
}

#[allow(clippy::print_stderr)]
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load(cli.config.as_deref());
    let logging = config.as_ref().map(|c| c.logging.clone()).unwrap_or_else(|_| LoggingConfig::default());

    // Initialize logging
    let _guard = match init_logging(&logging, cli.log_level.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            // No subscriber to report through
            eprintln!("winter-stream: {e:#}");
            return ExitCode::FAILURE;
        },
    };

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {e:#}");
            return ExitCode::FAILURE;
        },
    };

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        },
    }
}

fn run(command: Commands, config: &AppConfig) -> Result<()> {
    match command {
        Commands::Produce {
            max_messages,
            run_for_secs,
            interval_secs,
            seed,
            no_broker,
        } => {
            let options = ProducerOptions {
                interval: interval_secs.map_or_else(|| config.producer_interval(), Duration::from_secs),
                max_messages,
                run_for: run_for_secs.map(Duration::from_secs),
            };
            produce(config, &options, seed, no_broker)
        },
        Commands::ConsumeFile { max_messages, once, fresh } => consume_file(config, max_messages, once, fresh),
        Commands::ConsumeKafka { max_messages, fresh } => consume_kafka(config, max_messages, fresh),
        Commands::Report { output, format } => {
            let output = output.unwrap_or_else(|| config.paths.report.clone());
            report(config, &output, format)
        },
    }
}

/// Run the generator until a limit is hit or the process is killed
fn produce(config: &AppConfig, options: &ProducerOptions, seed: Option<u64>, no_broker: bool) -> Result<()> {
    info!("Starting producer");

    let writer = LogWriter::prepare(&config.paths.live_data, config.producer.reset_on_start)
        .with_context(|| format!("Failed to prepare live data file {}", config.paths.live_data.display()))?;

    let mut publisher: Box<dyn Publisher> = if no_broker {
        Box::new(NoopPublisher)
    } else {
        broker::connect_publisher(&config.kafka)
    };

    run_producer(MessageGenerator::new(seed), &writer, publisher.as_mut(), options)?;
    Ok(())
}

fn open_pipeline(config: &AppConfig, fresh: bool) -> Result<Pipeline> {
    if fresh {
        Database::reset(&config.paths.sqlite).context("Failed to delete existing store")?;
    }
    let db = Database::open(&config.paths.sqlite)
        .with_context(|| format!("Failed to open store {}", config.paths.sqlite.display()))?;
    Ok(Pipeline::new(SentimentAnalyzer::new()?, db))
}

fn consume_file(config: &AppConfig, max_messages: Option<u64>, once: bool, fresh: bool) -> Result<()> {
    let pipeline = open_pipeline(config, fresh)?;
    let mut consumer = Consumer::new(FileTail::new(&config.paths.live_data), pipeline, config.poll_interval());

    if once {
        let handled = consumer.drain().context("Failed to read live data file")?;
        let stats = consumer.stats();
        info!(handled, stored = stats.stored, malformed = stats.malformed, "Processed current file contents");
    } else {
        consumer.run(max_messages);
    }
    Ok(())
}

fn consume_kafka(config: &AppConfig, max_messages: Option<u64>, fresh: bool) -> Result<()> {
    let pipeline = open_pipeline(config, fresh)?;
    let source = broker::subscribe(&config.kafka).context("Failed to subscribe to Kafka")?;
    Consumer::new(source, pipeline, config.poll_interval()).run(max_messages);
    Ok(())
}

fn report(config: &AppConfig, output: &std::path::Path, format: ReportFormat) -> Result<()> {
    let db = Database::open(&config.paths.sqlite)
        .with_context(|| format!("Failed to open store {}", config.paths.sqlite.display()))?;

    for path in generate_report(&db, output, format)? {
        info!(path = %path.display(), "Wrote report");
    }
    Ok(())
}
