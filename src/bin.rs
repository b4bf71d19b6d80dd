// std imports
use std::path::PathBuf;

// 3rd party imports
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{info, Level};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// internal imports
use exgauss_sim::constants::DEFAULT_SEED;
use exgauss_sim::distribution::{log_likelihood, DistributionSpec, ExGaussian};
use exgauss_sim::estimation::moments::{from_moments, SampleMoments};
use exgauss_sim::estimation::maximum_likelihood::{maximum_likelihood, OptimizerConfiguration};
use exgauss_sim::experiments::configuration::{ExperimentConfiguration, ExperimentVariant};
use exgauss_sim::experiments::study::{register_stop_signal, Study};

/// Target for tracing
///
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum TracingTarget {
    File,
    Terminal,
    All,
}

/// Log rotation values for CLI
///
#[derive(clap::ValueEnum, Clone, Debug)]
enum TracingLogRotation {
    Minutely,
    Hourly,
    Daily,
    Never,
}

impl From<TracingLogRotation> for Rotation {
    fn from(rotation: TracingLogRotation) -> Self {
        match rotation {
            TracingLogRotation::Minutely => Rotation::MINUTELY,
            TracingLogRotation::Hourly => Rotation::HOURLY,
            TracingLogRotation::Daily => Rotation::DAILY,
            TracingLogRotation::Never => Rotation::NEVER,
        }
    }
}

/// Variant values for CLI, overriding the configuration
///
#[derive(clap::ValueEnum, Copy, Clone, Debug)]
enum VariantArg {
    Simulate,
    Resume,
    Cached,
}

impl From<VariantArg> for ExperimentVariant {
    fn from(variant: VariantArg) -> Self {
        match variant {
            VariantArg::Simulate => ExperimentVariant::Simulate,
            VariantArg::Resume => ExperimentVariant::Resume,
            VariantArg::Cached => ExperimentVariant::Cached,
        }
    }
}

#[derive(Debug, Args)]
struct StudyArgs {
    /// Overrides the variant of the configuration
    #[arg(long, value_enum)]
    variant: Option<VariantArg>,
    /// Path to the configuration file
    config: PathBuf,
    /// Directory for results, checkpoint and manifest
    output_dir: PathBuf,
}

impl StudyArgs {
    /// Reads the configuration and creates the study
    ///
    fn into_study(self) -> Result<Study> {
        let mut configuration = ExperimentConfiguration::from_file(&self.config)
            .with_context(|| format!("Error when reading `{}`", self.config.display()))?;
        if let Some(variant) = self.variant {
            configuration.variant = variant.into();
        }
        info!(
            "Using variant `{:?}`, results in `{}`",
            configuration.variant,
            self.output_dir.display()
        );
        Ok(Study::new(configuration, &self.output_dir)?)
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Prints a new configuration to stdout
    NewConfig {},
    /// Runs the parameter recovery experiment and writes its summary
    Recovery(StudyArgs),
    /// Runs the imbalance experiment on the recovery results of the output directory
    Imbalance(StudyArgs),
    /// Runs both experiments and writes all summaries
    Run(StudyArgs),
    /// Recreates the summaries from the results of the output directory
    Summarize(StudyArgs),
    /// Draws a single sample and prints the moment and maximum likelihood estimates
    Sample {
        mu: f64,
        sigma: f64,
        tau: f64,
        /// Number of samples
        n: usize,
        /// Seed
        #[arg(short, long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },
}

#[derive(Debug, Parser)]
#[command(name = "exgauss-sim", version, about)]
struct Cli {
    /// Verbosity level
    /// 0 - Error
    /// 1 - Warn
    /// 2 - Info
    /// 3 - Debug
    /// > 3 - Trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Tracing target
    #[arg(short, long, value_enum, action = clap::ArgAction::Append)]
    tracing_target: Vec<TracingTarget>,
    /// Tracing log file. Only used if `file` is set in `tracing_target`.
    #[arg(short, long, default_value = "./logs/exgauss-sim.log")]
    file: PathBuf,
    /// Tracing log rotation. Only used if `file` is set in `tracing_target`.
    #[arg(short, long, value_enum, default_value = "never")]
    rotation: TracingLogRotation,
    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    //// Set up tracing
    let verbosity = match args.verbose {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(verbosity.into())
        .add_directive("polars=error".parse()?);

    // Tracing layers
    let mut tracing_indicatif_layer = None;
    let mut tracing_terminal_layer = None;
    let mut tracing_file_layer = None;

    // Tracing guards
    let mut _tracing_log_writer_guard = None;

    if args.tracing_target.contains(&TracingTarget::Terminal)
        || args.tracing_target.contains(&TracingTarget::All)
    {
        let layer = IndicatifLayer::new()
            .with_span_child_prefix_symbol("\t")
            .with_span_child_prefix_indent("")
            .with_max_progress_bars(20, None);
        tracing_terminal_layer =
            Some(tracing_subscriber::fmt::layer().with_writer(layer.get_stderr_writer()));
        tracing_indicatif_layer = Some(layer);
    }

    if args.tracing_target.contains(&TracingTarget::File)
        || args.tracing_target.contains(&TracingTarget::All)
    {
        let log_dir = match args.file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let log_file_name = args
            .file
            .file_name()
            .context("Log file path has no file name")?;
        let file_appender = RollingFileAppender::new(args.rotation.into(), log_dir, log_file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        tracing_file_layer = Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking),
        );
        _tracing_log_writer_guard = Some(guard);
    }

    tracing_subscriber::registry()
        .with(tracing_terminal_layer)
        .with(tracing_indicatif_layer)
        .with(tracing_file_layer)
        .with(filter)
        .init();

    info!("Welcome to exgauss-sim");

    match args.command {
        Commands::NewConfig {} => {
            let configuration = ExperimentConfiguration::new();
            println!("{}", configuration.to_toml()?);
        }
        Commands::Recovery(study_args) => {
            let study = study_args.into_study()?;
            let stop_flag = register_stop_signal()?;
            let records = study.recovery(&stop_flag)?;
            info!("Recovery finished, {} records", records.len());
        }
        Commands::Imbalance(study_args) => {
            let study = study_args.into_study()?;
            let records = study.imbalance()?;
            info!("Imbalance finished, {} tests", records.len());
        }
        Commands::Run(study_args) => {
            let study = study_args.into_study()?;
            let stop_flag = register_stop_signal()?;
            let (recovery_records, false_positives) = study.run(&stop_flag)?;
            info!(
                "Finished with {} recovery records and {} tests in `{}`",
                recovery_records.len(),
                false_positives.len(),
                study.output_dir().display()
            );
        }
        Commands::Summarize(study_args) => {
            let study = study_args.into_study()?;
            study.summarize()?;
            info!("Summaries written");
        }
        Commands::Sample {
            mu,
            sigma,
            tau,
            n,
            seed,
        } => {
            let spec = DistributionSpec::new(0, mu, sigma, tau);
            let sampler = ExGaussian::new(&spec).context("Invalid distribution")?;
            let mut rng = SmallRng::seed_from_u64(seed);
            let samples = sampler.sample_n(&mut rng, n);

            let sample_moments = SampleMoments::from_samples(&samples)?;
            let moment_estimate = from_moments(&sample_moments);
            let fit = maximum_likelihood(
                &samples,
                &moment_estimate,
                &OptimizerConfiguration::default(),
            )?;

            println!(
                "sample\tmean = {:.4}\tsd = {:.4}\tskewness = {:.4}\t(expected mean = {:.4})",
                sample_moments.mean,
                sample_moments.sd(),
                sample_moments.skewness,
                spec.mean()
            );
            println!(
                "moments\tmu = {:.4}\tsigma = {:.4}\ttau = {:.4}\tlog-likelihood = {:.4}",
                moment_estimate.mu,
                moment_estimate.sigma,
                moment_estimate.tau,
                log_likelihood(&moment_estimate, &samples)
            );
            println!(
                "mle\tmu = {:.4}\tsigma = {:.4}\ttau = {:.4}\t\
                log-likelihood = {:.4}\t({} iterations{})",
                fit.estimate.mu,
                fit.estimate.sigma,
                fit.estimate.tau,
                fit.log_likelihood,
                fit.iterations,
                if fit.converged { "" } else { ", not converged" }
            );
        }
    }

    Ok(())
}
