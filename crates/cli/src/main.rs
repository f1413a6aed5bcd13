mod echo;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use owo_colors::OwoColorize;
use pagelift_core::model::{API_KEY_ENV, probe_models};
use pagelift_core::{
    Analyzer, AnalyzerConfig, DEFAULT_MAX_CHARS, ExtractConfig, FetchConfig, HttpModelBackend, HttpPageSource, Mode,
    ModelConfig, PageMeta, PdfLayout, Relay, RelayConfig, Report, StreamEvent, detect_sections, export_filename,
    extract_text, fetch_file, fetch_stdin, fetch_url, render_pdf,
};
use serde_json::json;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn parse_mode(s: &str) -> Result<Mode, String> {
    s.parse()
}

/// Audit landing pages for conversion problems
#[derive(Parser, Debug)]
#[command(name = "pagelift")]
#[command(version)]
#[command(about = "Audit landing pages for conversion problems", long_about = None)]
struct Cli {
    /// Print progress details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a landing page and print its conversion report
    Analyze(AnalyzeArgs),
    /// Show the text, metadata and sections the analyzer would see
    Extract(ExtractArgs),
    /// Render a saved JSON report to PDF
    Export(ExportArgs),
    /// Find the first configured model that answers
    Probe(ModelArgs),
    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Hosted-model connection settings shared by `analyze` and `probe`.
#[derive(Args, Debug)]
struct ModelArgs {
    /// API key for the model provider
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", value_name = "URL")]
    base_url: Option<String>,

    /// Model tried first
    #[arg(long, env = "PAGELIFT_MODEL")]
    model: Option<String>,

    /// Models tried after the preferred one, in order
    #[arg(long, env = "PAGELIFT_FALLBACK_MODELS", value_delimiter = ',', value_name = "MODELS")]
    fallback_models: Vec<String>,
}

impl ModelArgs {
    fn config(&self) -> ModelConfig {
        let mut config = ModelConfig { api_key: self.api_key.clone(), preferred: self.model.clone(), ..Default::default() };
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if !self.fallback_models.is_empty() {
            config.fallbacks = self.fallback_models.clone();
        }
        config
    }
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Landing page URL; https:// is assumed when no scheme is given
    #[arg(value_name = "URL")]
    url: String,

    /// Report tier (free, full)
    #[arg(short, long, default_value = "free", value_parser = parse_mode)]
    mode: Mode,

    /// Print the report as JSON instead of a summary
    #[arg(long)]
    json: bool,

    /// Also write the JSON report to this file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Also render the report to this PDF file
    #[arg(long, value_name = "FILE")]
    pdf: Option<PathBuf>,

    /// Page fetch timeout in seconds
    #[arg(long, default_value = "20", value_name = "SECS")]
    timeout: u64,

    /// Maximum characters of page text sent to the model
    #[arg(long, value_name = "NUM")]
    max_chars: Option<usize>,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// URL to fetch, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Print JSON instead of a summary
    #[arg(long)]
    json: bool,

    /// Maximum characters of text to keep
    #[arg(long, value_name = "NUM")]
    max_chars: Option<usize>,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "20", value_name = "SECS")]
    timeout: u64,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Report JSON produced by `pagelift analyze --json`
    #[arg(value_name = "REPORT")]
    report: PathBuf,

    /// Output file (default: cro-report-<host>.pdf)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

async fn load_html(input: &str, timeout: u64) -> anyhow::Result<String> {
    if input == "-" {
        return fetch_stdin().context("Failed to read from stdin");
    }

    let lower = input.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        let config = FetchConfig { timeout, ..Default::default() };
        return fetch_url(input, &config).await.context("Failed to fetch URL");
    }

    fetch_file(input).with_context(|| format!("Failed to read file: {input}"))
}

async fn analyze(args: AnalyzeArgs, verbose: bool) -> anyhow::Result<()> {
    let mut builder = AnalyzerConfig::builder().timeout(args.timeout).model(args.model.config());
    if let Some(max_chars) = args.max_chars {
        builder = builder.max_chars(max_chars);
    }
    let config = builder.build();

    let source = HttpPageSource::new(config.fetch.clone())?;
    let backend = HttpModelBackend::new(&config.model)?;
    if !backend.has_credential() {
        bail!("no model API key configured; set {API_KEY_ENV} or pass --api-key");
    }

    if verbose {
        echo::print_step(1, 2, &format!("Analyzing {} ({})", args.url.bright_white().underline(), args.mode));
        echo::print_info(&format!("Models: {}", config.model.candidates().join(" → ")));
    }

    let relay = Relay::new(Arc::new(Analyzer::new(source, backend, config)), RelayConfig::default());
    let mut events = relay.spawn(args.url.clone(), args.mode);
    let show_progress = !args.json;

    let mut outcome = None;
    while let Some(event) = events.recv().await {
        match event {
            StreamEvent::Progress { value } if show_progress => echo::print_progress(value),
            StreamEvent::Progress { .. } | StreamEvent::Ping { .. } => {}
            StreamEvent::Result(report) => outcome = Some(Ok(*report)),
            StreamEvent::Error { message } => outcome = Some(Err(message)),
        }
    }
    if show_progress {
        echo::clear_progress();
    }

    let report = match outcome {
        Some(Ok(report)) => report,
        Some(Err(message)) => bail!("{message}"),
        None => bail!("analysis ended without a result"),
    };

    if verbose {
        echo::print_step(2, 2, "Writing output");
    }

    if let Some(path) = &args.output {
        let body = serde_json::to_string_pretty(&report)?;
        fs::write(path, body).with_context(|| format!("Failed to write to file: {}", path.display()))?;
        echo::print_success(&format!("Report written to {}", path.display().bright_white()));
    }

    if let Some(path) = &args.pdf {
        write_pdf(&report, path)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        echo::print_report(&report);
    }

    Ok(())
}

async fn extract(args: ExtractArgs, verbose: bool) -> anyhow::Result<()> {
    if verbose {
        echo::print_step(1, 2, &format!("Reading {}", args.input.bright_white()));
    }
    let html = load_html(&args.input, args.timeout).await?;

    if verbose {
        eprintln!("  {} {}", "Size:".dimmed(), echo::format_size(html.len()).bright_white());
        echo::print_step(2, 2, "Extracting text");
    }

    let config = ExtractConfig { max_chars: args.max_chars.unwrap_or(DEFAULT_MAX_CHARS) };

    let extracted = extract_text(&html, &config);
    let meta = PageMeta::from_html(&html);
    let sections = detect_sections(&extracted.text);

    if extracted.is_empty() {
        echo::print_warning("No visible text found");
    }

    if args.json {
        let missing: Vec<&str> = sections.missing().iter().map(|s| s.label()).collect();
        let body = json!({
            "text": extracted.text,
            "truncated": extracted.truncated,
            "original_chars": extracted.original_chars,
            "meta": meta,
            "sections": sections,
            "missing_sections": missing,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        echo::print_extraction(&extracted, &sections, &meta);
    }

    Ok(())
}

fn write_pdf(report: &Report, path: &Path) -> anyhow::Result<()> {
    let pdf = render_pdf(report, &PdfLayout::default()).context("Failed to render PDF")?;
    fs::write(path, &pdf).with_context(|| format!("Failed to write to file: {}", path.display()))?;
    echo::print_success(&format!(
        "PDF written to {} ({})",
        path.display().bright_white(),
        echo::format_size(pdf.len())
    ));
    Ok(())
}

fn export(args: ExportArgs) -> anyhow::Result<()> {
    let body = fs::read_to_string(&args.report)
        .with_context(|| format!("Failed to read file: {}", args.report.display()))?;
    let report: Report = serde_json::from_str(&body)
        .with_context(|| format!("{} is not a pagelift report", args.report.display()))?;

    let path = args.output.unwrap_or_else(|| PathBuf::from(export_filename(&report.url)));
    write_pdf(&report, &path)
}

async fn probe(args: ModelArgs) -> anyhow::Result<()> {
    let config = args.config();
    let backend = HttpModelBackend::new(&config)?;
    if !backend.has_credential() {
        echo::print_warning(&format!("{API_KEY_ENV} is not set"));
    }

    let report = probe_models(&backend, &config.policy()).await;
    for attempt in &report.tried {
        if attempt.ok {
            println!("  {} {}", "✓".green(), attempt.model.bold());
        } else {
            let detail = attempt.error.as_deref().unwrap_or("failed");
            println!("  {} {} {}", "✗".red(), attempt.model, detail.dimmed());
        }
    }

    match report.chosen_model {
        Some(model) => {
            echo::print_success(&format!("Using {model}"));
            Ok(())
        }
        None => bail!("no configured model answered"),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.verbose {
        echo::print_banner();
    }

    match cli.command {
        Command::Analyze(args) => analyze(args, cli.verbose).await,
        Command::Extract(args) => extract(args, cli.verbose).await,
        Command::Export(args) => export(args),
        Command::Probe(args) => probe(args).await,
        Command::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "pagelift", &mut io::stdout());
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            echo::print_error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}
