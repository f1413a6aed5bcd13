//! Report export: PDF rendering plus the email body that accompanies it.

#[cfg(feature = "pdf")]
pub mod pdf;
pub mod wrap;

#[cfg(feature = "pdf")]
pub use pdf::{PdfLayout, render_pdf};

use crate::normalize::report_host;
use crate::report::Report;

/// Download filename for a report, e.g. `cro-report-example.com.pdf`.
pub fn export_filename(url: &str) -> String {
    format!("cro-report-{}.pdf", report_host(url))
}

pub fn email_subject(report: &Report) -> String {
    format!("Your conversion report for {} ({}/100)", report_host(&report.url), report.score)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Short HTML body for the report email. The PDF carries the details.
pub fn email_html(report: &Report) -> String {
    let mut html = format!(
        "<h1>Conversion report</h1><p><a href=\"{url}\">{url}</a></p><p><strong>Score: {score}/100</strong></p>",
        url = escape_html(&report.url),
        score = report.score,
    );
    if !report.summary.is_empty() {
        html.push_str(&format!("<p>{}</p>", escape_html(&report.summary)));
    }
    if !report.quick_wins.is_empty() {
        html.push_str("<h2>Quick wins</h2><ul>");
        for win in &report.quick_wins {
            html.push_str(&format!("<li>{}</li>", escape_html(win)));
        }
        html.push_str("</ul>");
    }
    html.push_str("<p>The full report is attached as a PDF.</p>");
    html
}
