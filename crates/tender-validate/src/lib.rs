//! # tender-validate — Validation Pipeline
//!
//! Composable field validation with typed error maps.
//!
//! A validator is a pure function `(raw) -> Validation<T>`, where
//! [`Validation`] is `Result<T, Vec<String>>` — the invalid side carries
//! every message for that field, and entity-level aggregates collect all
//! field errors into one typed struct rather than failing fast, so a
//! caller sees every invalid field in one response.
//!
//! ## Tiers
//!
//! Two tiers exist per entity (see [`ValidationMode`]):
//!
//! - **Draft** — parse-level checks only. Numbers must be numeric and
//!   dates well-formed, but bounds, ordering, and required-ness are
//!   skipped so users can save incomplete work.
//! - **Strict** — applied at publish/submit time: everything presented to
//!   the public must pass its full check, including chained date ordering
//!   (proposal deadline bounds assignment date bounds start date bounds
//!   completion date).

pub mod opportunity;
pub mod proposal;

use tender_core::Timestamp;

/// A field validation result: the value, or every error message for the
/// field.
pub type Validation<T> = Result<T, Vec<String>>;

/// The two validation strictness tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Lenient: users may save incomplete or out-of-bounds work.
    Draft,
    /// Full checks: the entity is about to become public.
    Strict,
}

impl ValidationMode {
    /// Whether this is the strict tier.
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Strict)
    }
}

// ─── Primitive validators ────────────────────────────────────────────

/// Validate a string's character length against inclusive bounds.
pub fn generic_string(raw: &str, name: &str, min: usize, max: usize) -> Validation<String> {
    let len = raw.chars().count();
    if len < min || len > max {
        Err(vec![format!(
            "{name} must be between {min} and {max} characters long."
        )])
    } else {
        Ok(raw.to_string())
    }
}

/// Coerce a JSON value that may be a number or a numeric string into an
/// integer. Clients submit amounts both ways.
pub fn coerce_integer(raw: &serde_json::Value, name: &str) -> Validation<i64> {
    match raw {
        serde_json::Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| vec![format!("Please enter a valid {name}.")]),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| vec![format!("Please enter a valid {name}.")]),
        _ => Err(vec![format!("Please enter a valid {name}.")]),
    }
}

/// Validate an integer against optional inclusive bounds.
pub fn number(raw: i64, name: &str, min: Option<i64>, max: Option<i64>) -> Validation<i64> {
    let mut errors = Vec::new();
    if let Some(min) = min {
        if raw < min {
            errors.push(format!("{name} must be at least {min}."));
        }
    }
    if let Some(max) = max {
        if raw > max {
            errors.push(format!("{name} must be at most {max}."));
        }
    }
    if errors.is_empty() {
        Ok(raw)
    } else {
        Err(errors)
    }
}

/// Validate a float against inclusive bounds and a decimal-place limit.
pub fn number_with_precision(
    raw: f64,
    name: &str,
    min: f64,
    max: f64,
    max_precision: u32,
) -> Validation<f64> {
    if !raw.is_finite() {
        return Err(vec![format!("Please enter a valid {name}.")]);
    }
    let mut errors = Vec::new();
    if raw < min {
        errors.push(format!("{name} must be at least {min}."));
    }
    if raw > max {
        errors.push(format!("{name} must be at most {max}."));
    }
    let scale = 10f64.powi(max_precision as i32);
    if ((raw * scale).round() - raw * scale).abs() > 1e-9 {
        errors.push(format!(
            "{name} must have at most {max_precision} decimal places."
        ));
    }
    if errors.is_empty() {
        Ok(raw)
    } else {
        Err(errors)
    }
}

/// Parse a date (RFC 3339 or `YYYY-MM-DD`) and optionally enforce a
/// lower bound.
pub fn date(raw: &str, name: &str, min: Option<Timestamp>) -> Validation<Timestamp> {
    let parsed = Timestamp::parse_flexible(raw)
        .map_err(|_| vec![format!("Please enter a valid {name}.")])?;
    if let Some(min) = min {
        if parsed < min {
            return Err(vec![format!("{name} must be on or after {min}.")]);
        }
    }
    Ok(parsed)
}

/// Validate an email address. Deliberately shallow — deliverability is
/// the mailer's problem; this only rejects obvious garbage.
pub fn email(raw: &str) -> Validation<String> {
    let lowered = raw.trim().to_lowercase();
    let mut parts = lowered.split('@');
    let (local, domain, rest) = (parts.next(), parts.next(), parts.next());
    let ok = matches!((local, domain, rest), (Some(l), Some(d), None)
        if !l.is_empty() && d.contains('.') && !d.starts_with('.') && !d.ends_with('.'))
        && !lowered.contains(char::is_whitespace);
    if ok {
        Ok(lowered)
    } else {
        Err(vec!["Please enter a valid email address.".to_string()])
    }
}

/// Validate a phone number: digits plus common separators.
pub fn phone(raw: &str) -> Validation<String> {
    let valid = raw.chars().any(|c| c.is_ascii_digit())
        && raw
            .chars()
            .all(|c| c.is_ascii_digit() || "+()-. /".contains(c));
    if valid {
        Ok(raw.to_string())
    } else {
        Err(vec!["Please enter a valid phone number.".to_string()])
    }
}

/// Validate a skill list: at least one entry, each within bounds,
/// duplicates removed preserving order.
pub fn skills(raw: &[String]) -> Validation<Vec<String>> {
    if raw.is_empty() {
        return Err(vec!["Please select at least one skill.".to_string()]);
    }
    let mut errors = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for skill in raw {
        match generic_string(skill, "A skill", 1, 100) {
            Ok(s) => {
                if seen.insert(s.clone()) {
                    out.push(s);
                }
            }
            Err(mut e) => errors.append(&mut e),
        }
    }
    if errors.is_empty() {
        Ok(out)
    } else {
        Err(errors)
    }
}

/// Run a validator only when a value is present; absence is valid.
pub fn optional<T, V>(raw: Option<&str>, validate: V) -> Validation<Option<T>>
where
    V: FnOnce(&str) -> Validation<T>,
{
    match raw {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => validate(s).map(Some),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
