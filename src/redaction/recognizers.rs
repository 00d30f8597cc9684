//! Built-in PII recognizers.

use regex::Regex;

/// Entity types the redactor can detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Entity {
    EmailAddress,
    PhoneNumber,
    UsSsn,
    CreditCard,
    IpAddress,
    Person,
}

impl Entity {
    pub const ALL: [Entity; 6] = [
        Entity::EmailAddress,
        Entity::PhoneNumber,
        Entity::UsSsn,
        Entity::CreditCard,
        Entity::IpAddress,
        Entity::Person,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Entity::EmailAddress => "EMAIL_ADDRESS",
            Entity::PhoneNumber => "PHONE_NUMBER",
            Entity::UsSsn => "US_SSN",
            Entity::CreditCard => "CREDIT_CARD",
            Entity::IpAddress => "IP_ADDRESS",
            Entity::Person => "PERSON",
        }
    }
}

/// A pattern for one entity type.
///
/// `group` selects the capture group holding the entity, so context words
/// around it ("my name is") stay in the text.
pub struct Recognizer {
    pub entity: Entity,
    pattern: Regex,
    group: usize,
    validate: Option<fn(&str) -> bool>,
}

impl Recognizer {
    fn new(entity: Entity, pattern: &str, group: usize, validate: Option<fn(&str) -> bool>) -> Result<Self, regex::Error> {
        Ok(Self {
            entity,
            pattern: Regex::new(pattern)?,
            group,
            validate,
        })
    }

    /// Byte ranges of every accepted match in `text`.
    pub fn find_spans(&self, text: &str) -> Vec<(usize, usize)> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(self.group))
            .filter(|m| self.validate.map_or(true, |check| check(m.as_str())))
            .map(|m| (m.start(), m.end()))
            .collect()
    }
}

/// Luhn checksum over the digits of `candidate`.
pub fn luhn_valid(candidate: &str) -> bool {
    let digits: Vec<u32> = candidate.chars().filter_map(|c| c.to_digit(10)).collect();
    if !(13..=19).contains(&digits.len()) {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// Every built-in recognizer.
pub fn builtin() -> Result<Vec<Recognizer>, regex::Error> {
    Ok(vec![
        Recognizer::new(
            Entity::EmailAddress,
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
            0,
            None,
        )?,
        Recognizer::new(
            Entity::PhoneNumber,
            r"(?:\+\d{1,3}[\s.-]?)?(?:\(\d{3}\)\s?|\b\d{3}[\s.-])\d{3}[\s.-]\d{4}\b",
            0,
            None,
        )?,
        Recognizer::new(Entity::UsSsn, r"\b\d{3}-\d{2}-\d{4}\b", 0, None)?,
        Recognizer::new(
            Entity::CreditCard,
            r"\b(?:\d[ -]?){12,18}\d\b",
            0,
            Some(luhn_valid),
        )?,
        Recognizer::new(
            Entity::IpAddress,
            r"\b(?:(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\b",
            0,
            None,
        )?,
        Recognizer::new(
            Entity::Person,
            r"\b(?:Mr|Mrs|Ms|Miss|Dr|Prof)\.?\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)",
            1,
            None,
        )?,
        Recognizer::new(
            Entity::Person,
            r"\b(?i:my name is|i am|this is)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)",
            1,
            None,
        )?,
    ])
}
