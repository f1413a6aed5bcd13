//! Keyword heuristics for landing-page sections.
//!
//! Each flag is a case-insensitive substring match against a small fixed
//! vocabulary. False positives and negatives are expected; the flags only
//! steer the prompt and give the report a quick "what's on the page" row.

use serde::{Deserialize, Serialize};

/// Section names paired with the keywords that signal them.
pub const SECTION_KEYWORDS: &[(Section, &[&str])] = &[
    (Section::Hero, &["get started", "welcome to", "introducing", "all-in-one", "the easiest way", "built for"]),
    (Section::ValueProposition, &["why choose", "benefits", "save time", "save money", "so you can", "without the"]),
    (Section::SocialProof, &["trusted by", "customers", "testimonial", "reviews", "rated", "case study", "loved by"]),
    (Section::Pricing, &["pricing", "plans", "per month", "/month", "/mo", "billed annually", "per user"]),
    (Section::Faq, &["faq", "frequently asked", "questions"]),
    (Section::Cta, &["sign up", "start free", "free trial", "book a demo", "request a demo", "buy now", "get started", "contact sales"]),
    (Section::Features, &["features", "how it works", "integrations", "what you get"]),
    (Section::Trust, &["guarantee", "money-back", "secure", "privacy", "gdpr", "soc 2", "encrypted"]),
    (Section::Contact, &["contact us", "email us", "call us", "support", "chat with"]),
];

/// A landing-page section the heuristics know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Hero,
    ValueProposition,
    SocialProof,
    Pricing,
    Faq,
    Cta,
    Features,
    Trust,
    Contact,
}

impl Section {
    pub fn label(&self) -> &'static str {
        match self {
            Section::Hero => "hero",
            Section::ValueProposition => "value proposition",
            Section::SocialProof => "social proof",
            Section::Pricing => "pricing",
            Section::Faq => "FAQ",
            Section::Cta => "call to action",
            Section::Features => "features",
            Section::Trust => "trust signals",
            Section::Contact => "contact",
        }
    }

    pub fn keywords(&self) -> &'static [&'static str] {
        SECTION_KEYWORDS
            .iter()
            .find(|(section, _)| section == self)
            .map(|(_, words)| *words)
            .unwrap_or(&[])
    }
}

/// Presence flags for each known section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionFlags {
    pub hero: bool,
    pub value_proposition: bool,
    pub social_proof: bool,
    pub pricing: bool,
    pub faq: bool,
    pub cta: bool,
    pub features: bool,
    pub trust: bool,
    pub contact: bool,
}

impl SectionFlags {
    pub fn get(&self, section: Section) -> bool {
        match section {
            Section::Hero => self.hero,
            Section::ValueProposition => self.value_proposition,
            Section::SocialProof => self.social_proof,
            Section::Pricing => self.pricing,
            Section::Faq => self.faq,
            Section::Cta => self.cta,
            Section::Features => self.features,
            Section::Trust => self.trust,
            Section::Contact => self.contact,
        }
    }

    fn set(&mut self, section: Section, value: bool) {
        let slot = match section {
            Section::Hero => &mut self.hero,
            Section::ValueProposition => &mut self.value_proposition,
            Section::SocialProof => &mut self.social_proof,
            Section::Pricing => &mut self.pricing,
            Section::Faq => &mut self.faq,
            Section::Cta => &mut self.cta,
            Section::Features => &mut self.features,
            Section::Trust => &mut self.trust,
            Section::Contact => &mut self.contact,
        };
        *slot = value;
    }

    pub fn present(&self) -> Vec<Section> {
        SECTION_KEYWORDS.iter().map(|(s, _)| *s).filter(|s| self.get(*s)).collect()
    }

    pub fn missing(&self) -> Vec<Section> {
        SECTION_KEYWORDS.iter().map(|(s, _)| *s).filter(|s| !self.get(*s)).collect()
    }
}

/// Flags every section whose vocabulary appears anywhere in `text`.
///
/// ```rust
/// use pagelift_core::detect_sections;
///
/// let flags = detect_sections("See our Pricing below");
/// assert!(flags.pricing);
/// assert!(!flags.faq);
/// ```
pub fn detect_sections(text: &str) -> SectionFlags {
    let haystack = text.to_lowercase();
    let mut flags = SectionFlags::default();
    for (section, words) in SECTION_KEYWORDS {
        flags.set(*section, words.iter().any(|w| haystack.contains(w)));
    }
    flags
}
