//! CLI binary for labreport-insight.
//!
//! A thin shim over the library crate: `serve` runs the HTTP API, `analyze`
//! runs the PDF → values → explanation pipeline once and prints the result.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use labreport_insight::{Age, InsightConfig, ReportAnalyzer, UserProfile};
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI definition ───────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "labreport",
    version,
    about = "Explain medical lab reports in plain language using LLMs",
    long_about = "Extracts test values from a lab report with an LLM, explains them for a \
patient profile, and serves follow-up chat over HTTP.\n\n\
Provider auto-detected from GOOGLE_GEMINI_API_KEY, OPENAI_API_KEY, ANTHROPIC_API_KEY, …"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    llm: LlmArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "LABREPORT_VERBOSE")]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API.
    Serve {
        /// Address to bind.
        #[arg(long, env = "LABREPORT_HOST", default_value = "127.0.0.1")]
        host: IpAddr,

        /// Port to bind.
        #[arg(short, long, env = "LABREPORT_PORT", default_value_t = 5000)]
        port: u16,

        /// Largest accepted request body in bytes.
        #[arg(long, env = "LABREPORT_MAX_UPLOAD_BYTES", default_value_t = 20 * 1024 * 1024)]
        max_upload_bytes: usize,
    },

    /// Analyze one PDF report and print the result.
    Analyze {
        /// Path to the PDF report.
        input: PathBuf,

        #[command(flatten)]
        profile: ProfileArgs,

        /// Print `{ testData, insight }` as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct LlmArgs {
    /// LLM model ID (e.g. gemini-2.5-flash, gpt-4.1-mini).
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider (gemini, openai, anthropic, ollama, …).
    #[arg(long, global = true, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Retries per LLM call on failure.
    #[arg(long, global = true, env = "LABREPORT_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// Per-call LLM timeout in seconds.
    #[arg(long, global = true, env = "LABREPORT_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Max LLM output tokens per call.
    #[arg(long, global = true, env = "LABREPORT_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Directory containing the pdfium shared library.
    #[arg(long, global = true, env = "LABREPORT_PDFIUM_DIR")]
    pdfium_dir: Option<PathBuf>,

    /// PDF user password for encrypted reports.
    #[arg(long, global = true, env = "LABREPORT_PDF_PASSWORD")]
    password: Option<String>,

    /// Text file replacing the built-in explanation preamble.
    #[arg(long, global = true, env = "LABREPORT_EXPLAIN_PROMPT")]
    explain_prompt: Option<PathBuf>,

    /// Text file replacing the built-in chat preamble.
    #[arg(long, global = true, env = "LABREPORT_CHAT_PROMPT")]
    chat_prompt: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ProfileArgs {
    /// Patient name.
    #[arg(long)]
    name: Option<String>,

    /// Patient age in years.
    #[arg(long)]
    age: Option<u32>,

    /// Patient gender.
    #[arg(long)]
    gender: Option<String>,

    /// Comma-separated medical history, e.g. "diabetes, hypertension".
    #[arg(long, value_delimiter = ',')]
    history: Vec<String>,
}

impl From<ProfileArgs> for UserProfile {
    fn from(p: ProfileArgs) -> Self {
        UserProfile {
            name: p.name,
            age: p.age.map(Age::Years),
            gender: p.gender,
            medical_history: p
                .history
                .into_iter()
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }
}

fn build_config(args: &LlmArgs, max_upload_bytes: Option<usize>) -> Result<InsightConfig> {
    let mut builder = InsightConfig::builder()
        .max_retries(args.max_retries)
        .api_timeout_secs(args.api_timeout)
        .max_tokens(args.max_tokens);

    if let Some(ref model) = args.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref dir) = args.pdfium_dir {
        builder = builder.pdfium_dir(dir);
    }
    if let Some(ref pwd) = args.password {
        builder = builder.pdf_password(pwd);
    }
    if let Some(ref path) = args.explain_prompt {
        let prompt = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read explanation prompt: {}", path.display()))?;
        builder = builder.explain_prompt(prompt);
    }
    if let Some(ref path) = args.chat_prompt {
        let prompt = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read chat prompt: {}", path.display()))?;
        builder = builder.chat_prompt(prompt);
    }
    if let Some(n) = max_upload_bytes {
        builder = builder.max_upload_bytes(n);
    }

    builder.build().context("Invalid configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve {
            host,
            port,
            max_upload_bytes,
        } => {
            let config = build_config(&cli.llm, Some(max_upload_bytes))?;
            let analyzer =
                ReportAnalyzer::from_config(config).context("Failed to configure LLM provider")?;
            let addr = SocketAddr::new(host, port);
            eprintln!("{} http://{}/api", bold("labreport listening on"), addr);
            labreport_insight::serve(analyzer, addr)
                .await
                .with_context(|| format!("Server on {addr} failed"))?;
        }
        Command::Analyze {
            input,
            profile,
            json,
        } => {
            let config = build_config(&cli.llm, None)?;
            let analyzer =
                ReportAnalyzer::from_config(config).context("Failed to configure LLM provider")?;
            let profile = UserProfile::from(profile);
            let analysis = analyzer
                .analyze_pdf(&input, &profile)
                .await
                .with_context(|| format!("Failed to analyze {}", input.display()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                println!("{}", bold("Parsed report values"));
                for line in analysis.test_data.lines() {
                    println!("  {}", cyan(&line));
                }
                println!();
                println!("{}", bold("Insight"));
                println!("{}", analysis.insight);
                eprintln!(
                    "{}",
                    dim(&format!("{} values extracted", analysis.test_data.len()))
                );
            }
        }
    }

    Ok(())
}
