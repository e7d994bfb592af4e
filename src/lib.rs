//! # labreport-insight
//!
//! Explain medical lab reports in plain language using LLMs.
//!
//! A report (PDF or raw text) goes through three prompt round-trips:
//! structured value extraction, a patient-tailored explanation, and follow-up
//! chat grounded in the profile, the extracted values and the conversation so
//! far. The crate ships the pipeline as a library, an Axum HTTP service and a
//! CLI.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Text     pdfium text layer, every page (spawn_blocking)
//!  ├─ 2. Extract  LLM → JSON { "WBC": { "value": 7.2, "unit": "10^3/uL" }, … }
//!  ├─ 3. Explain  LLM → plain-language insight for the patient profile
//!  └─ 4. Chat     LLM with profile + values + transcript, per session id
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use labreport_insight::{InsightConfig, ReportAnalyzer, UserProfile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GOOGLE_GEMINI_API_KEY / OPENAI_API_KEY / …
//!     let analyzer = ReportAnalyzer::from_config(InsightConfig::default())?;
//!     let analysis = analyzer
//!         .analyze_pdf("report.pdf".as_ref(), &UserProfile::default())
//!         .await?;
//!     println!("{}", analysis.insight);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `labreport` binary (clap + anyhow + tracing-subscriber) |
//!
//! ## PDFium
//!
//! Text extraction binds the pdfium shared library at runtime: from
//! [`InsightConfig::pdfium_dir`] when set, otherwise from the system library
//! search path.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod report;
pub mod server;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::ReportAnalyzer;
pub use config::{InsightConfig, InsightConfigBuilder};
pub use error::InsightError;
pub use pipeline::llm::{Completion, CompletionBackend, Prompt, ProviderBackend};
pub use report::{Age, Analysis, TestResults, UserProfile};
pub use server::{create_app, serve};
pub use session::{ChatReply, ChatRequest, SessionStore, Turn};
