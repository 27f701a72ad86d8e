// src/main.rs
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use trimurti::analysis::{self, AnalysisKind, NarrativeAnalyzer};
use trimurti::engine::{PipelineOutcome, PipelineSettings, ReconPipeline, SystemResolver};
use trimurti::reporting::formats::PageLayout;
use trimurti::reporting::{Narrative, ReportDocument, ReportFormat, ReportManager, Section, WrittenArtifact};
use trimurti::adapters::CrtShClient;
use trimurti::{logging, CommandLineScanner, Config};

#[derive(Parser)]
#[command(name = "trimurti")]
#[command(about = "Recon asset correlation and penetration test reporting")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Cli,

    #[arg(long, short, global = true, help = "Enable debug logging")]
    verbose: bool,

    #[arg(long, short, global = true, help = "Only log errors")]
    quiet: bool,

    #[arg(long, short, global = true, help = "Configuration file")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Cli {
    /// Run the reconnaissance pipeline against a target and write the report
    Run {
        #[arg(help = "Target domain or IP address")]
        target: String,

        #[arg(short, long, default_value = "report", help = "Output path without extension")]
        output: PathBuf,

        #[arg(short, long, value_delimiter = ',', help = "Report formats (markdown, html, pdf)")]
        format: Vec<String>,

        #[arg(long, help = "Report title")]
        title: Option<String>,

        #[arg(long, help = "Skip brute-force subdomain enumeration")]
        no_bruteforce: bool,

        #[arg(long, help = "Skip the certificate transparency log search")]
        no_certificates: bool,

        #[arg(long, help = "Maximum number of live hosts passed to the template scanner")]
        max_targets: Option<usize>,

        #[arg(long, help = "Append narrative analysis from the configured model endpoint")]
        ai_analysis: bool,
    },

    /// Render a narrative markup file into every report format
    Render {
        #[arg(help = "Markup file to render")]
        input: PathBuf,

        #[arg(short, long, default_value = "report", help = "Output path without extension")]
        output: PathBuf,

        #[arg(short, long, value_delimiter = ',', help = "Report formats (markdown, html, pdf)")]
        format: Vec<String>,

        #[arg(long, help = "Report title")]
        title: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCli,
    },
}

#[derive(Subcommand)]
enum ConfigCli {
    /// Write the default configuration file
    Init {
        #[arg(long, help = "Overwrite an existing file")]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose, args.quiet);

    match args.command {
        Cli::Run {
            target,
            output,
            format,
            title,
            no_bruteforce,
            no_certificates,
            max_targets,
            ai_analysis,
        } => {
            let config = load_config(args.config.as_deref())?;

            let mut settings = PipelineSettings::from(&config.pipeline);
            if no_bruteforce {
                settings.bruteforce = false;
            }
            if let Some(max_targets) = max_targets {
                settings.max_scan_targets = max_targets;
            }

            let scanner = Arc::new(CommandLineScanner::new(&config.tools));
            let resolver = Arc::new(SystemResolver::new(Duration::from_secs(
                config.pipeline.resolution_timeout_seconds,
            )));
            let mut pipeline = ReconPipeline::new(scanner, resolver, settings);

            if config.certificates.enabled && !no_certificates {
                match CrtShClient::new(&config.certificates, &config.global.user_agent) {
                    Ok(client) => pipeline = pipeline.with_certificate_log(Arc::new(client)),
                    Err(e) => warn!("Certificate transparency search unavailable: {:#}", e),
                }
            }

            let outcome = pipeline.run(&target).await.context("Pipeline could not start")?;
            if !outcome.has_data() {
                warn!("No assets or findings were collected for {}", outcome.target);
            }

            let narratives = if ai_analysis || config.analysis.enabled {
                narratives(&config, &outcome).await
            } else {
                Vec::new()
            };

            let title = title.unwrap_or_else(|| config.report.title.clone());
            let document = outcome.build_report(&title, narratives);
            let formats = parse_formats(&format, &config.report.formats)?;

            write_reports(&config, &document, &output, &formats).await?;
        }

        Cli::Render {
            input,
            output,
            format,
            title,
        } => {
            let config = load_config(args.config.as_deref())?;

            let markup = tokio::fs::read_to_string(&input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;

            let section_title = input
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
                .unwrap_or_else(|| "Report".to_string());

            let mut document = ReportDocument::new(title.unwrap_or_else(|| config.report.title.clone()));
            document.add_section(Section::from_markup(section_title, &markup));

            let formats = parse_formats(&format, &config.report.formats)?;
            write_reports(&config, &document, &output, &formats).await?;
        }

        Cli::Config { command } => match command {
            ConfigCli::Init { force } => {
                let path = Config::init(force).context("Failed to write default configuration")?;
                println!("Configuration written to {}", path.display());
            }
        },
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::load(path).context("Failed to load configuration")
}

/// Formats from the command line, or the configured defaults when none were given
fn parse_formats(requested: &[String], configured: &[String]) -> Result<Vec<ReportFormat>> {
    let names = if requested.is_empty() { configured } else { requested };

    let mut formats = Vec::new();
    for name in names {
        let Some(format) = ReportFormat::parse(name) else {
            bail!("Unknown report format '{}' (expected markdown, html or pdf)", name);
        };
        if !formats.contains(&format) {
            formats.push(format);
        }
    }

    if formats.is_empty() {
        formats.extend(ReportFormat::ALL);
    }
    Ok(formats)
}

async fn narratives(config: &Config, outcome: &PipelineOutcome) -> Vec<Narrative> {
    let analyzer = match NarrativeAnalyzer::new(&config.analysis, &config.global.user_agent) {
        Ok(analyzer) => analyzer,
        Err(e) => {
            warn!("Narrative analysis unavailable: {}", e);
            return Vec::new();
        }
    };

    let mut inputs = vec![(AnalysisKind::Recon, analysis::recon_digest(&outcome.registry.snapshot()))];
    if !outcome.findings.is_empty() {
        inputs.push((AnalysisKind::Vulnerabilities, analysis::findings_digest(&outcome.findings)));
    }

    let mut narratives = Vec::new();
    for (kind, data) in inputs {
        match analyzer.analyze(kind, &data).await {
            Ok(narrative) => narratives.push(narrative),
            Err(e) => warn!("Skipping {}: {}", kind.section_title(), e),
        }
    }
    narratives
}

async fn write_reports(
    config: &Config,
    document: &ReportDocument,
    output: &Path,
    formats: &[ReportFormat],
) -> Result<Vec<WrittenArtifact>> {
    let manager = ReportManager::new(PageLayout::from(&config.report));
    let artifacts = manager
        .write_all(document, output, formats)
        .await
        .with_context(|| format!("No report could be written for {}", output.display()))?;

    for artifact in &artifacts {
        if artifact.fell_back() {
            warn!(
                "{} report written to {} because {} was not writable",
                artifact.format,
                artifact.path.display(),
                artifact.requested.display()
            );
        } else {
            info!("{} report written to {}", artifact.format, artifact.path.display());
        }
        println!("{}", artifact.path.display());
    }

    Ok(artifacts)
}
