//! Report to PDF rendering with lopdf.
//!
//! Text is laid out top to bottom on fixed-size pages. A new page starts when
//! the next line would cross the bottom margin. Every page gets a
//! `Page i of n` footer once the page count is known.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use super::wrap::{encode_win_ansi, wrap_text};
use crate::Result;
use crate::report::{Mode, Report};

/// Page geometry and type sizes, in points.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfLayout {
    pub page_width: i64,
    pub page_height: i64,
    pub margin: i64,
    pub title_size: i64,
    pub heading_size: i64,
    pub body_size: i64,
    pub footer_size: i64,
    /// Extra space between lines, added to the font size.
    pub leading: i64,
}

impl Default for PdfLayout {
    /// A4 portrait with 50pt margins.
    fn default() -> Self {
        Self {
            page_width: 595,
            page_height: 842,
            margin: 50,
            title_size: 20,
            heading_size: 14,
            body_size: 10,
            footer_size: 8,
            leading: 4,
        }
    }
}

impl PdfLayout {
    fn content_width(&self) -> f32 {
        (self.page_width - 2 * self.margin) as f32
    }

    /// Lowest baseline body text may use; the footer sits below it.
    fn floor(&self) -> i64 {
        self.margin + self.footer_size + self.leading * 2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }

    fn base_font(self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
        }
    }
}

fn text_ops(font: Font, size: i64, x: i64, y: i64, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(font.resource().as_bytes().to_vec()), Object::Integer(size)]),
        Operation::new("Td", vec![Object::Integer(x), Object::Integer(y)]),
        Operation::new("Tj", vec![Object::string_literal(encode_win_ansi(text))]),
        Operation::new("ET", vec![]),
    ]
}

/// Accumulates drawing operations, page by page.
struct PageWriter<'a> {
    layout: &'a PdfLayout,
    pages: Vec<Vec<Operation>>,
    y: i64,
}

impl<'a> PageWriter<'a> {
    fn new(layout: &'a PdfLayout) -> Self {
        Self { layout, pages: vec![Vec::new()], y: layout.page_height - layout.margin }
    }

    fn new_page(&mut self) {
        self.pages.push(Vec::new());
        self.y = self.layout.page_height - self.layout.margin;
    }

    fn line(&mut self, text: &str, font: Font, size: i64, indent: i64) {
        let step = size + self.layout.leading;
        if self.y - step < self.layout.floor() {
            self.new_page();
        }
        self.y -= step;
        let ops = text_ops(font, size, self.layout.margin + indent, self.y, text);
        if let Some(page) = self.pages.last_mut() {
            page.extend(ops);
        }
    }

    fn paragraph(&mut self, text: &str, font: Font, size: i64, indent: i64) {
        let width = self.layout.content_width() - indent as f32;
        for line in wrap_text(text, width, size as f32, font == Font::Bold) {
            self.line(&line, font, size, indent);
        }
    }

    fn heading(&mut self, text: &str) {
        self.gap(self.layout.body_size);
        let size = self.layout.heading_size;
        // keep a heading together with at least one body line
        if self.y - (size + self.layout.body_size + 2 * self.layout.leading) < self.layout.floor() {
            self.new_page();
        }
        self.paragraph(text, Font::Bold, size, 0);
        self.gap(self.layout.leading);
    }

    fn bullet(&mut self, text: &str) {
        self.paragraph(&format!("- {text}"), Font::Regular, self.layout.body_size, 10);
    }

    fn gap(&mut self, points: i64) {
        if self.y - points >= self.layout.floor() {
            self.y -= points;
        }
    }

    fn finish(self) -> Vec<Vec<Operation>> {
        self.pages
    }
}

fn lay_out(report: &Report, layout: &PdfLayout) -> Vec<Vec<Operation>> {
    let mut w = PageWriter::new(layout);
    let body = layout.body_size;

    w.paragraph("Conversion report", Font::Bold, layout.title_size, 0);
    // one run even when wider than the page, so the URL stays searchable
    w.line(&report.url, Font::Regular, body, 0);
    if let Some(title) = &report.title {
        w.paragraph(title, Font::Regular, body, 0);
    }
    w.gap(body);
    w.paragraph(
        &format!("Score: {}/100 ({})", report.score, report.score_band()),
        Font::Bold,
        layout.heading_size,
        0,
    );
    let tier = match report.mode {
        Mode::Free => "Free report",
        Mode::Full => "Full report",
    };
    match &report.model {
        Some(model) => w.paragraph(&format!("{tier}, generated by {model}"), Font::Regular, body, 0),
        None => w.paragraph(tier, Font::Regular, body, 0),
    }

    if !report.summary.is_empty() {
        w.heading("Summary");
        w.paragraph(&report.summary, Font::Regular, body, 0);
    }

    if !report.key_findings.is_empty() {
        w.heading("Key findings");
        for finding in &report.key_findings {
            w.paragraph(&format!("{} [{} impact]", finding.title, finding.impact.as_str()), Font::Bold, body, 0);
            if !finding.recommendation.is_empty() {
                w.paragraph(&finding.recommendation, Font::Regular, body, 10);
            }
        }
    }

    if !report.quick_wins.is_empty() {
        w.heading("Quick wins");
        for win in &report.quick_wins {
            w.bullet(win);
        }
    }

    let present = report.sections.present();
    let missing = report.sections.missing();
    w.heading("Page sections");
    let labels = |v: &[crate::sections::Section]| v.iter().map(|s| s.label()).collect::<Vec<_>>().join(", ");
    w.paragraph(&format!("Detected: {}", if present.is_empty() { "none".to_string() } else { labels(&present) }), Font::Regular, body, 0);
    w.paragraph(&format!("Not detected: {}", if missing.is_empty() { "none".to_string() } else { labels(&missing) }), Font::Regular, body, 0);

    if !report.prioritized_backlog.is_empty() {
        w.heading("Prioritized backlog");
        for (i, item) in report.prioritized_backlog.iter().enumerate() {
            let eta = item.eta_days.map(|d| format!(", about {d} day(s)")).unwrap_or_default();
            w.paragraph(
                &format!(
                    "{}. {} (impact {}, effort {}{eta})",
                    i + 1,
                    item.title,
                    item.impact.as_str(),
                    item.effort.as_str()
                ),
                Font::Regular,
                body,
                0,
            );
        }
    }

    if !report.content_audit.is_empty() {
        w.heading("Content audit");
        for item in &report.content_audit {
            w.paragraph(&format!("{}: {}", item.section, item.status.as_str()), Font::Bold, body, 0);
            if !item.rationale.is_empty() {
                w.paragraph(&item.rationale, Font::Regular, body, 10);
            }
            for suggestion in &item.suggestions {
                w.bullet(suggestion);
            }
        }
    }

    if !report.copy_suggestions.is_empty() {
        w.heading("Copy suggestions");
        for row in &report.copy_suggestions {
            w.paragraph(
                &format!("{} ({} priority, up to +{}%)", row.field, row.priority.as_str(), row.lift_percent),
                Font::Bold,
                body,
                0,
            );
            w.paragraph(&format!("Now: {}", row.current), Font::Regular, body, 10);
            w.paragraph(&format!("Try: {}", row.recommended), Font::Regular, body, 10);
        }
    }

    if let Some(hero) = &report.screenshots.hero {
        w.heading("Screenshots");
        w.paragraph(hero, Font::Regular, body, 0);
        if let Some(full) = &report.screenshots.full_page {
            w.paragraph(full, Font::Regular, body, 0);
        }
    }

    w.finish()
}

/// Renders `report` to PDF bytes.
///
/// Content streams are left uncompressed, so the text layer can be searched
/// in the raw bytes.
pub fn render_pdf(report: &Report, layout: &PdfLayout) -> Result<Vec<u8>> {
    let pages = lay_out(report, layout);
    let total = pages.len();

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => Font::Regular.base_font(),
        "Encoding" => "WinAnsiEncoding",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => Font::Bold.base_font(),
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            Font::Regular.resource() => regular,
            Font::Bold.resource() => bold,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(total);
    for (index, mut operations) in pages.into_iter().enumerate() {
        let footer = format!("Page {} of {}", index + 1, total);
        let x = layout.page_width - layout.margin - 50;
        operations.extend(text_ops(Font::Regular, layout.footer_size, x, layout.margin, &footer));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => Object::Integer(total as i64),
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(layout.page_width),
            Object::Integer(layout.page_height),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}
