use owo_colors::OwoColorize;
use pagelift_core::{ExtractedText, Impact, Mode, PageMeta, Report, SectionFlags};

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!("\n{} {} {}", "Pagelift".bold().bright_blue(), "v".dimmed(), VERSION.dimmed());
    eprintln!("{}", "Landing-page conversion audits\n".dimmed());
}

pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.bright_red());
}

/// Redraws a single progress line on stderr.
pub fn print_progress(value: u8) {
    let filled = usize::from(value) / 5;
    eprint!("\r  {} {:>3}%", format!("[{}{}]", "#".repeat(filled), " ".repeat(20 - filled)).bright_cyan(), value);
}

pub fn clear_progress() {
    eprint!("\r{}\r", " ".repeat(32));
}

fn rule(title: &str) {
    println!("\n{}", "═".repeat(60).dimmed());
    println!("{}", title.bold().cyan());
    println!("{}", "═".repeat(60).dimmed());
}

fn impact_tag(impact: Impact) -> String {
    match impact {
        Impact::High => "HIGH".red().bold().to_string(),
        Impact::Medium => "MED ".yellow().to_string(),
        Impact::Low => "LOW ".dimmed().to_string(),
    }
}

fn print_locked(title: &str) {
    rule(title);
    println!("  {} {}", "locked".bright_magenta(), "(run with --mode full)".dimmed());
}

pub fn print_sections(flags: &SectionFlags) {
    for section in flags.present() {
        println!("  {} {}", "✓".green(), section.label());
    }
    for section in flags.missing() {
        println!("  {} {}", "✗".red(), section.label().dimmed());
    }
}

pub fn print_meta(meta: &PageMeta) {
    let fields = [("Title", &meta.title), ("H1", &meta.h1), ("Description", &meta.description)];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("  {} {}", format!("{label}:").dimmed(), value.bright_white());
        }
    }
    if !meta.ctas.is_empty() {
        println!("  {} {}", "CTAs:".dimmed(), meta.ctas.join(", ").bright_white());
    }
}

pub fn print_extraction(extracted: &ExtractedText, flags: &SectionFlags, meta: &PageMeta) {
    rule("Page");
    print_meta(meta);
    println!(
        "  {} {} chars{}",
        "Text:".dimmed(),
        extracted.original_chars,
        if extracted.truncated { " (truncated)" } else { "" }
    );

    rule("Sections");
    print_sections(flags);

    rule("Text");
    println!("{}", extracted.text);
}

pub fn print_report(report: &Report) {
    let score = format!("{}/100", report.score);
    let score = match report.score {
        80.. => score.bright_green().bold().to_string(),
        50..=79 => score.bright_yellow().bold().to_string(),
        _ => score.bright_red().bold().to_string(),
    };

    println!("\n{} {}", report.url.bright_white().underline(), format!("({})", report.mode).dimmed());
    println!("  {} {} {}", "Score:".dimmed(), score, report.score_band().dimmed());
    if let Some(model) = &report.model {
        println!("  {} {}", "Model:".dimmed(), model);
    }
    if !report.summary.is_empty() {
        println!("\n{}", report.summary);
    }

    if !report.key_findings.is_empty() {
        rule("Key findings");
        for finding in &report.key_findings {
            println!("  {} {}", impact_tag(finding.impact), finding.title.bold());
            if !finding.recommendation.is_empty() {
                println!("       {}", finding.recommendation);
            }
        }
    }

    if !report.quick_wins.is_empty() {
        rule("Quick wins");
        for win in &report.quick_wins {
            println!("  • {win}");
        }
    }

    if report.mode == Mode::Free {
        for title in ["Backlog", "Content audit", "Copy suggestions"] {
            print_locked(title);
        }
    }

    if !report.prioritized_backlog.is_empty() {
        rule("Backlog");
        for item in &report.prioritized_backlog {
            let eta = item.eta_days.map(|d| format!(", ~{d}d")).unwrap_or_default();
            println!(
                "  {} {} {}",
                impact_tag(item.impact),
                item.title,
                format!("({} effort{eta})", item.effort.as_str()).dimmed()
            );
        }
    }

    if !report.content_audit.is_empty() {
        rule("Content audit");
        for item in &report.content_audit {
            println!("  {} {}", format!("[{}]", item.status.as_str()).bright_magenta(), item.section.bold());
            if !item.rationale.is_empty() {
                println!("       {}", item.rationale);
            }
        }
    }

    if !report.copy_suggestions.is_empty() {
        rule("Copy suggestions");
        for row in &report.copy_suggestions {
            println!("  {} {}", row.field.bold(), format!("+{}%", row.lift_percent).bright_green());
            if !row.current.is_empty() {
                println!("       {} {}", "-".red(), row.current.dimmed());
            }
            println!("       {} {}", "+".green(), row.recommended);
        }
    }

    rule("Sections");
    print_sections(&report.sections);
    println!();
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
