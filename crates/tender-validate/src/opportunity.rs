//! # Opportunity Validation
//!
//! The raw payload shape, its typed error map, and the two-tier
//! aggregate that turns a payload into a validated version-field set.
//!
//! Date ordering is chained: the proposal deadline bounds the assignment
//! date, which bounds the start date, which bounds the optional
//! completion date. When an earlier link in the chain is invalid, later
//! links validate against the best value available so every field still
//! reports its own errors.

use serde::{Deserialize, Serialize};

use tender_core::Timestamp;
use tender_lifecycle::{OpportunityStatus, OpportunityVersionFields};

use crate::{coerce_integer, date, generic_string, number, skills, Validation, ValidationMode};

/// Raw opportunity payload as submitted by a client. Every field is
/// optional so drafts can be arbitrarily incomplete.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityPayload {
    pub title: Option<String>,
    pub teaser: Option<String>,
    pub remote_ok: Option<bool>,
    pub remote_desc: Option<String>,
    pub location: Option<String>,
    /// Accepts a JSON number or a numeric string.
    pub reward: Option<serde_json::Value>,
    pub skills: Option<Vec<String>>,
    pub description: Option<String>,
    pub proposal_deadline: Option<String>,
    pub assignment_date: Option<String>,
    pub start_date: Option<String>,
    pub completion_date: Option<String>,
    pub submission_info: Option<String>,
    pub acceptance_criteria: Option<String>,
    pub evaluation_criteria: Option<String>,
}

/// Typed field→error-list map for opportunity payloads. Serializes to a
/// JSON object with one key per offending field; clean fields are
/// omitted.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityFieldErrors {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub status: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub title: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub teaser: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remote_desc: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub location: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reward: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub proposal_deadline: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assignment_date: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub start_date: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub completion_date: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub submission_info: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub acceptance_criteria: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub evaluation_criteria: Vec<String>,
}

impl OpportunityFieldErrors {
    /// Whether no field reported an error.
    pub fn is_clean(&self) -> bool {
        self.status.is_empty()
            && self.title.is_empty()
            && self.teaser.is_empty()
            && self.remote_desc.is_empty()
            && self.location.is_empty()
            && self.reward.is_empty()
            && self.skills.is_empty()
            && self.description.is_empty()
            && self.proposal_deadline.is_empty()
            && self.assignment_date.is_empty()
            && self.start_date.is_empty()
            && self.completion_date.is_empty()
            && self.submission_info.is_empty()
            && self.acceptance_criteria.is_empty()
            && self.evaluation_criteria.is_empty()
    }
}

/// Validate a status label against the subset of statuses permitted in
/// the current context (e.g., only `DRAFT` and `PUBLISHED` at creation).
pub fn validate_status(
    raw: &str,
    one_of: &[OpportunityStatus],
) -> Validation<OpportunityStatus> {
    let Some(parsed) = OpportunityStatus::parse(raw) else {
        return Err(vec![format!("{raw:?} is not a valid opportunity status.")]);
    };
    if !one_of.contains(&parsed) {
        let allowed = one_of
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        return Err(vec![format!(
            "{parsed} is not one of the permitted statuses: {allowed}."
        )]);
    }
    Ok(parsed)
}

/// Validate a status-change note.
pub fn validate_note(raw: &str) -> Validation<String> {
    generic_string(raw, "A status note", 0, 1000)
}

/// Validate addendum text.
pub fn validate_addendum_text(raw: &str) -> Validation<String> {
    generic_string(raw, "An addendum", 1, 5000)
}

/// Validate an opportunity payload at the given tier.
///
/// `max_budget` is the kind-specific reward ceiling. `deadline_floor`
/// overrides the "deadline must be in the future" lower bound when
/// editing an opportunity that is already closed.
pub fn validate_opportunity(
    payload: &OpportunityPayload,
    mode: ValidationMode,
    max_budget: i64,
    now: Timestamp,
    deadline_floor: Option<Timestamp>,
) -> Result<OpportunityVersionFields, OpportunityFieldErrors> {
    let mut errors = OpportunityFieldErrors::default();
    let strict = mode.is_strict();

    let title = text_field(
        payload.title.as_deref(),
        "The title",
        1,
        200,
        strict,
        &mut errors.title,
    );
    let teaser = text_field(
        payload.teaser.as_deref(),
        "The teaser",
        0,
        500,
        strict,
        &mut errors.teaser,
    );
    let remote_ok = payload.remote_ok.unwrap_or(false);
    let remote_desc = text_field(
        payload.remote_desc.as_deref(),
        "The remote description",
        if remote_ok { 1 } else { 0 },
        500,
        strict,
        &mut errors.remote_desc,
    );
    let location = text_field(
        payload.location.as_deref(),
        "The location",
        1,
        100,
        strict,
        &mut errors.location,
    );
    let description = text_field(
        payload.description.as_deref(),
        "The description",
        1,
        10_000,
        strict,
        &mut errors.description,
    );
    let submission_info = text_field(
        payload.submission_info.as_deref(),
        "The submission information",
        0,
        500,
        strict,
        &mut errors.submission_info,
    );
    let acceptance_criteria = text_field(
        payload.acceptance_criteria.as_deref(),
        "The acceptance criteria",
        1,
        5000,
        strict,
        &mut errors.acceptance_criteria,
    );
    let evaluation_criteria = text_field(
        payload.evaluation_criteria.as_deref(),
        "The evaluation criteria",
        1,
        2000,
        strict,
        &mut errors.evaluation_criteria,
    );

    // Reward: parse errors surface in both tiers, bounds only in strict.
    let reward = match payload.reward.as_ref() {
        Some(raw) => match coerce_integer(raw, "reward") {
            Ok(value) => {
                if strict {
                    match number(value, "The reward", Some(1), Some(max_budget)) {
                        Ok(v) => v,
                        Err(mut e) => {
                            errors.reward.append(&mut e);
                            value
                        }
                    }
                } else {
                    value
                }
            }
            Err(mut e) => {
                errors.reward.append(&mut e);
                0
            }
        },
        None => {
            if strict {
                errors
                    .reward
                    .push("Please enter a valid reward.".to_string());
            }
            0
        }
    };

    // Skills: empty list is a strict-tier error only; malformed entries
    // always are.
    let skill_list = match payload.skills.as_deref() {
        Some(raw) if !raw.is_empty() || strict => match skills(raw) {
            Ok(list) => list,
            Err(mut e) => {
                errors.skills.append(&mut e);
                Vec::new()
            }
        },
        Some(_) => Vec::new(),
        None => {
            if strict {
                errors
                    .skills
                    .push("Please select at least one skill.".to_string());
            }
            Vec::new()
        }
    };

    // The date chain. Each link falls back to the previous resolved
    // value when missing or unparseable, so downstream links still
    // validate against something sensible.
    let proposal_deadline = date_field(
        payload.proposal_deadline.as_deref(),
        "The proposal deadline",
        strict.then(|| deadline_floor.unwrap_or(now)),
        now,
        strict,
        &mut errors.proposal_deadline,
    );
    let assignment_date = date_field(
        payload.assignment_date.as_deref(),
        "The assignment date",
        strict.then_some(proposal_deadline),
        proposal_deadline,
        strict,
        &mut errors.assignment_date,
    );
    let start_date = date_field(
        payload.start_date.as_deref(),
        "The start date",
        strict.then_some(assignment_date),
        assignment_date,
        strict,
        &mut errors.start_date,
    );
    let completion_date = match payload.completion_date.as_deref() {
        None | Some("") => None,
        Some(raw) => match date(raw, "The completion date", strict.then_some(start_date)) {
            Ok(ts) => Some(ts),
            Err(mut e) => {
                errors.completion_date.append(&mut e);
                None
            }
        },
    };

    if !errors.is_clean() {
        return Err(errors);
    }

    Ok(OpportunityVersionFields {
        title,
        teaser,
        remote_ok,
        remote_desc,
        location,
        reward,
        skills: skill_list,
        description,
        proposal_deadline,
        assignment_date,
        start_date,
        completion_date,
        submission_info,
        acceptance_criteria,
        evaluation_criteria,
    })
}

/// Strict-tier validation of an already-typed field set. Used at
/// publish time, which validates the opportunity's *current* version
/// rather than an incoming payload.
pub fn validate_fields_strict(
    fields: &OpportunityVersionFields,
    max_budget: i64,
    now: Timestamp,
    deadline_floor: Option<Timestamp>,
) -> Result<(), OpportunityFieldErrors> {
    let mut errors = OpportunityFieldErrors::default();

    let check = |value: &str, name: &str, min: usize, max: usize, errs: &mut Vec<String>| {
        if let Err(mut e) = generic_string(value, name, min, max) {
            errs.append(&mut e);
        }
    };
    check(&fields.title, "The title", 1, 200, &mut errors.title);
    check(&fields.teaser, "The teaser", 0, 500, &mut errors.teaser);
    check(
        &fields.remote_desc,
        "The remote description",
        if fields.remote_ok { 1 } else { 0 },
        500,
        &mut errors.remote_desc,
    );
    check(&fields.location, "The location", 1, 100, &mut errors.location);
    check(
        &fields.description,
        "The description",
        1,
        10_000,
        &mut errors.description,
    );
    check(
        &fields.submission_info,
        "The submission information",
        0,
        500,
        &mut errors.submission_info,
    );
    check(
        &fields.acceptance_criteria,
        "The acceptance criteria",
        1,
        5000,
        &mut errors.acceptance_criteria,
    );
    check(
        &fields.evaluation_criteria,
        "The evaluation criteria",
        1,
        2000,
        &mut errors.evaluation_criteria,
    );

    if let Err(mut e) = number(fields.reward, "The reward", Some(1), Some(max_budget)) {
        errors.reward.append(&mut e);
    }
    if let Err(mut e) = skills(&fields.skills) {
        errors.skills.append(&mut e);
    }

    let floor = deadline_floor.unwrap_or(now);
    if fields.proposal_deadline < floor {
        errors
            .proposal_deadline
            .push(format!("The proposal deadline must be on or after {floor}."));
    }
    if fields.assignment_date < fields.proposal_deadline {
        errors.assignment_date.push(
            "The assignment date must be on or after the proposal deadline.".to_string(),
        );
    }
    if fields.start_date < fields.assignment_date {
        errors
            .start_date
            .push("The start date must be on or after the assignment date.".to_string());
    }
    if let Some(completion) = fields.completion_date {
        if completion < fields.start_date {
            errors
                .completion_date
                .push("The completion date must be on or after the start date.".to_string());
        }
    }

    if errors.is_clean() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate one text field: bounds apply in strict mode only.
fn text_field(
    raw: Option<&str>,
    name: &str,
    min: usize,
    max: usize,
    strict: bool,
    errors: &mut Vec<String>,
) -> String {
    let value = raw.unwrap_or("");
    if strict {
        match generic_string(value, name, min, max) {
            Ok(v) => v,
            Err(mut e) => {
                errors.append(&mut e);
                value.to_string()
            }
        }
    } else {
        value.to_string()
    }
}

/// Validate one date field: parse errors always surface, the lower bound
/// and required-ness only in strict mode. Returns `fallback` when no
/// usable value was produced.
fn date_field(
    raw: Option<&str>,
    name: &str,
    min: Option<Timestamp>,
    fallback: Timestamp,
    strict: bool,
    errors: &mut Vec<String>,
) -> Timestamp {
    match raw {
        None | Some("") => {
            if strict {
                errors.push(format!("Please enter a valid {name}.",));
            }
            fallback
        }
        Some(raw) => match date(raw, name, min) {
            Ok(ts) => ts,
            Err(mut e) => {
                errors.append(&mut e);
                fallback
            }
        },
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
