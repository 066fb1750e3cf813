//! PII redaction gate.
//!
//! Every article and learning edit passes through [`Scrubber`] before it is
//! persisted. Scrubbing is a hard gate: if a free-text field still contains
//! detectable PII afterwards, validation fails and the write is rejected.
//!
//! Passes run in a fixed order (email, phone, SSN, credit card, street
//! address) and each replaces matches with a placeholder containing no digits
//! or `@`, so scrubbing already-scrubbed text is a no-op.

use std::collections::BTreeSet;

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::{Article, LearningEdit};

/// Category of personally identifiable information
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PiiKind {
    Email,
    Phone,
    Ssn,
    CreditCard,
    StreetAddress,
}

impl std::fmt::Display for PiiKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Email => write!(f, "email"),
            Self::Phone => write!(f, "phone"),
            Self::Ssn => write!(f, "ssn"),
            Self::CreditCard => write!(f, "credit_card"),
            Self::StreetAddress => write!(f, "street_address"),
        }
    }
}

/// Outcome of scrubbing one piece of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrubResult {
    /// The text with every detected match replaced by a placeholder
    pub scrubbed: String,
    /// Which PII categories fired at least once
    pub kinds_found: BTreeSet<PiiKind>,
    /// Total number of replacements across all passes
    pub redaction_count: usize,
}

impl ScrubResult {
    pub fn pii_found(&self) -> bool {
        self.redaction_count > 0
    }
}

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").unwrap();
    // The trailing \b stops this pattern from consuming a 10-digit prefix of
    // a 16-digit card number; the card pass handles those runs instead.
    static ref PHONE_RE: Regex =
        Regex::new(r"(?:\+?1[-.\s]?)?\(?[2-9]\d{2}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b").unwrap();
    static ref SSN_RE: Regex = Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap();
    static ref CARD_RE: Regex =
        Regex::new(r"\b\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{1,4}\b").unwrap();
    static ref ADDRESS_RE: Regex = Regex::new(
        r"(?i)\b\d{1,5}\s+(?:[A-Za-z]+\s+){1,4}(?:street|st|avenue|ave|road|rd|boulevard|blvd|lane|ln|drive|dr|court|ct|way|place|pl)\b"
    )
    .unwrap();
}

const PASSES: [(PiiKind, &str); 5] = [
    (PiiKind::Email, "[email redacted]"),
    (PiiKind::Phone, "[phone redacted]"),
    (PiiKind::Ssn, "[ssn redacted]"),
    (PiiKind::CreditCard, "[card redacted]"),
    (PiiKind::StreetAddress, "[address redacted]"),
];

fn pattern_for(kind: PiiKind) -> &'static Regex {
    match kind {
        PiiKind::Email => &EMAIL_RE,
        PiiKind::Phone => &PHONE_RE,
        PiiKind::Ssn => &SSN_RE,
        PiiKind::CreditCard => &CARD_RE,
        PiiKind::StreetAddress => &ADDRESS_RE,
    }
}

/// Pattern-based PII scrubber.
///
/// Stateless; cloning is free. Held by the learning pipeline and anything
/// else that writes free text to storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scrubber;

impl Scrubber {
    pub fn new() -> Self {
        Self
    }

    /// Run all five redaction passes over the text in order.
    pub fn scrub(&self, text: &str) -> ScrubResult {
        let mut scrubbed = text.to_string();
        let mut kinds_found = BTreeSet::new();
        let mut redaction_count = 0;

        for (kind, placeholder) in PASSES {
            let re = pattern_for(kind);
            let matches = re.find_iter(&scrubbed).count();
            if matches > 0 {
                kinds_found.insert(kind);
                redaction_count += matches;
                scrubbed = re.replace_all(&scrubbed, placeholder).into_owned();
            }
        }

        ScrubResult {
            scrubbed,
            kinds_found,
            redaction_count,
        }
    }

    /// Whether any of the five patterns matches the text.
    pub fn contains_pii(&self, text: &str) -> bool {
        PASSES
            .iter()
            .any(|(kind, _)| pattern_for(*kind).is_match(text))
    }

    /// Scrub every free-text field of an article in place.
    ///
    /// Returns the union of PII kinds detected across all fields.
    pub fn scrub_article(&self, article: &mut Article) -> BTreeSet<PiiKind> {
        let mut kinds = BTreeSet::new();

        let question = self.scrub(&article.question);
        kinds.extend(question.kinds_found.iter().copied());
        article.question = question.scrubbed;

        let answer = self.scrub(&article.answer);
        kinds.extend(answer.kinds_found.iter().copied());
        article.answer = answer.scrubbed;

        for tag in &mut article.tags {
            let result = self.scrub(tag);
            kinds.extend(result.kinds_found.iter().copied());
            *tag = result.scrubbed;
        }

        kinds
    }

    /// Scrub every free-text field of a learning edit in place.
    pub fn scrub_learning_edit(&self, edit: &mut LearningEdit) -> BTreeSet<PiiKind> {
        let mut kinds = BTreeSet::new();

        for field in [
            &mut edit.ai_draft,
            &mut edit.human_final,
            &mut edit.customer_question,
        ] {
            let result = self.scrub(field);
            kinds.extend(result.kinds_found.iter().copied());
            *field = result.scrubbed;
        }

        kinds
    }

    /// Final gate before persisting an article.
    ///
    /// Scrubbing always produces some output, but a field that still matches
    /// a PII pattern afterwards means the write must be rejected.
    pub fn validate_article_privacy(&self, article: &Article) -> Result<(), String> {
        for (name, text) in [
            ("question", article.question.as_str()),
            ("answer", article.answer.as_str()),
        ] {
            if self.contains_pii(text) {
                return Err(format!("article {} still contains PII", name));
            }
        }
        for tag in &article.tags {
            if self.contains_pii(tag) {
                return Err("article tag still contains PII".to_string());
            }
        }
        Ok(())
    }
}
