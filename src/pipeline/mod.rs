//! Pipeline stages for report analysis.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the HTTP handlers stay thin.
//!
//! ## Data Flow
//!
//! ```text
//! pdf ──▶ extract ──▶ explain          (analyze_report)
//!  (text)   (JSON)     (insight)
//!
//! profile + test data + transcript ──▶ chat   (crate::session)
//! ```
//!
//! 1. [`pdf`]         - pdfium text layer of every page; `spawn_blocking`
//! 2. [`extract`]     - value-extraction prompt, reply parsed as JSON
//! 3. [`explain`]     - explanation prompt, reply cleaned as text
//! 4. [`llm`]         - backend seam, timeout and retry; the only network I/O
//! 5. [`postprocess`] - fence stripping and reply cleanup rules

pub mod explain;
pub mod extract;
pub mod llm;
pub mod pdf;
pub mod postprocess;
