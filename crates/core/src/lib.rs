pub mod analyzer;
pub mod copy;
pub mod error;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod mail;
pub mod meta;
pub mod model;
pub mod normalize;
pub mod prompt;
pub mod relay;
pub mod report;
pub mod screenshot;
pub mod sections;

pub use analyzer::{Analyzer, AnalyzerConfig, AnalyzerConfigBuilder};
pub use copy::{CopyRow, MAX_COPY_ROWS, MAX_LIFT_PERCENT, Priority, normalize_rows, parse_copy_rows};
pub use error::{ErrorKind, PageliftError, Result};
#[cfg(feature = "pdf")]
pub use export::{PdfLayout, render_pdf};
pub use export::{email_html, email_subject, export_filename};
pub use extract::{DEFAULT_MAX_CHARS, ExtractConfig, ExtractedText, extract_text};
pub use fetch::{FetchConfig, HttpPageSource, PageSource};
pub use fetch::{fetch_file, fetch_stdin, fetch_url};
pub use mail::{HttpMailer, MailConfig};
pub use meta::PageMeta;
pub use model::{
    FallbackPolicy, HttpModelBackend, ModelBackend, ModelConfig, ModelError, ModelRequest, ProbeReport, output_text,
};
pub use normalize::{normalize_url, report_host, report_url, require_http_url};
pub use relay::{ProgressMeter, Relay, RelayConfig, RelayState, StreamEvent};
pub use report::{AuditStatus, BacklogItem, ContentAuditItem, Effort, Finding, Impact, Mode, Report, grade};
pub use screenshot::{ScreenshotConfig, Screenshots};
pub use sections::{Section, SectionFlags, detect_sections};
