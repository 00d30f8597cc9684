//! PII redaction.
//!
//! `redact` scans text with every built-in recognizer and replaces each
//! detected entity with `<ENTITY_TYPE>`, leaving the surrounding text as is.
//! Empty input and text without detections come back borrowed and
//! unchanged.
//!
//! The redacted copy is diagnostic data: handlers attach it to span
//! attributes and keep returning the raw value to the caller.

pub mod recognizers;

use std::borrow::Cow;

pub use recognizers::{Entity, Recognizer};

/// One detected entity, as a byte range into the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PiiMatch {
    pub entity: Entity,
    pub start: usize,
    pub end: usize,
}

impl PiiMatch {
    fn len(&self) -> usize {
        self.end - self.start
    }
}

pub struct Redactor {
    recognizers: Vec<Recognizer>,
}

impl Redactor {
    /// A redactor with every built-in entity type enabled.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            recognizers: recognizers::builtin()?,
        })
    }

    /// Non-overlapping detections in `text`, ordered by position.
    ///
    /// Where detections overlap, the one starting first wins, then the
    /// longer one.
    pub fn analyze(&self, text: &str) -> Vec<PiiMatch> {
        let mut found: Vec<PiiMatch> = self
            .recognizers
            .iter()
            .flat_map(|r| {
                r.find_spans(text).into_iter().map(move |(start, end)| PiiMatch {
                    entity: r.entity,
                    start,
                    end,
                })
            })
            .collect();
        found.sort_by(|a, b| a.start.cmp(&b.start).then(b.len().cmp(&a.len())));

        let mut accepted: Vec<PiiMatch> = Vec::with_capacity(found.len());
        for m in found {
            if accepted.last().map_or(true, |last| m.start >= last.end) {
                accepted.push(m);
            }
        }
        accepted
    }

    pub fn redact<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if text.is_empty() {
            return Cow::Borrowed(text);
        }
        let matches = self.analyze(text);
        if matches.is_empty() {
            return Cow::Borrowed(text);
        }

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for m in matches {
            out.push_str(&text[cursor..m.start]);
            out.push('<');
            out.push_str(m.entity.label());
            out.push('>');
            cursor = m.end;
        }
        out.push_str(&text[cursor..]);
        Cow::Owned(out)
    }

    /// `redact` lifted over an optional value; `None` stays `None`.
    pub fn redact_opt<'a>(&self, text: Option<&'a str>) -> Option<Cow<'a, str>> {
        text.map(|t| self.redact(t))
    }
}
