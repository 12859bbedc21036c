//! # Proposal Validation
//!
//! Payload shape, proponent contact-block validation, and the two-tier
//! aggregate for proposals. Scores and disqualification reasons have
//! their own validators because they arrive through update verbs rather
//! than the proposal body.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tender_core::OrganizationId;
use tender_lifecycle::{IndividualProponent, Proponent, ProposalStatus};

use crate::{email, generic_string, number_with_precision, optional, phone, Validation, ValidationMode};

/// Raw individual-proponent contact block.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualProponentPayload {
    pub legal_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub street1: Option<String>,
    pub street2: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub mail_code: Option<String>,
    pub country: Option<String>,
}

/// Raw proponent: the same tagged shape as the domain type, with a
/// lenient individual block.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "tag", content = "value", rename_all = "camelCase")]
pub enum ProponentPayload {
    Individual(IndividualProponentPayload),
    Organization(Uuid),
}

/// Raw proposal payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalPayload {
    /// The opportunity being bid on.
    pub opportunity: Option<Uuid>,
    pub proposal_text: Option<String>,
    pub additional_comments: Option<String>,
    pub proponent: Option<ProponentPayload>,
}

/// Typed error map for the individual-proponent block.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProponentFieldErrors {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub legal_name: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub email: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub phone: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub street1: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub street2: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub city: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub region: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mail_code: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub country: Vec<String>,
}

impl ProponentFieldErrors {
    /// Whether no field reported an error.
    pub fn is_clean(&self) -> bool {
        self.legal_name.is_empty()
            && self.email.is_empty()
            && self.phone.is_empty()
            && self.street1.is_empty()
            && self.street2.is_empty()
            && self.city.is_empty()
            && self.region.is_empty()
            && self.mail_code.is_empty()
            && self.country.is_empty()
    }
}

/// Typed error map for proposal payloads.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalFieldErrors {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub status: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub opportunity: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub proposal_text: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub additional_comments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proponent: Option<ProponentFieldErrors>,
}

impl ProposalFieldErrors {
    /// Whether no field reported an error.
    pub fn is_clean(&self) -> bool {
        self.status.is_empty()
            && self.opportunity.is_empty()
            && self.proposal_text.is_empty()
            && self.additional_comments.is_empty()
            && self.proponent.as_ref().map_or(true, |p| p.is_clean())
    }
}

/// The validated, editable field set of a proposal.
#[derive(Debug, Clone)]
pub struct ProposalFields {
    pub proponent: Proponent,
    pub proposal_text: String,
    pub additional_comments: String,
}

/// Validate a proposal status label against a permitted subset.
pub fn validate_status(raw: &str, one_of: &[ProposalStatus]) -> Validation<ProposalStatus> {
    let Some(parsed) = ProposalStatus::parse(raw) else {
        return Err(vec![format!("{raw:?} is not a valid proposal status.")]);
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

/// Validate an evaluation score: 0–100, at most two decimal places.
pub fn validate_score(raw: f64) -> Validation<f64> {
    number_with_precision(raw, "The score", 0.0, 100.0, 2)
}

/// Validate a disqualification reason. Unlike most notes it is required.
pub fn validate_disqualification_reason(raw: &str) -> Validation<String> {
    generic_string(raw, "The disqualification reason", 1, 5000)
}

/// Validate a status-change note.
pub fn validate_note(raw: &str) -> Validation<String> {
    generic_string(raw, "A note", 0, 5000)
}

/// Validate a proposal payload at the given tier.
pub fn validate_proposal(
    payload: &ProposalPayload,
    mode: ValidationMode,
) -> Result<ProposalFields, ProposalFieldErrors> {
    let mut errors = ProposalFieldErrors::default();
    let strict = mode.is_strict();

    let proposal_text = payload.proposal_text.clone().unwrap_or_default();
    if strict {
        if let Err(mut e) = generic_string(&proposal_text, "The proposal text", 1, 10_000) {
            errors.proposal_text.append(&mut e);
        }
    }

    let additional_comments = payload.additional_comments.clone().unwrap_or_default();
    if strict {
        if let Err(mut e) =
            generic_string(&additional_comments, "Additional comments", 0, 10_000)
        {
            errors.additional_comments.append(&mut e);
        }
    }

    let proponent = match payload.proponent.as_ref() {
        Some(ProponentPayload::Organization(id)) => {
            Proponent::Organization(OrganizationId::from_uuid(*id))
        }
        Some(ProponentPayload::Individual(raw)) => {
            let (individual, individual_errors) = validate_individual(raw, strict);
            if !individual_errors.is_clean() {
                errors.proponent = Some(individual_errors);
            }
            Proponent::Individual(individual)
        }
        None => {
            if strict {
                errors.proponent = Some(ProponentFieldErrors {
                    legal_name: vec!["Please provide a proponent.".to_string()],
                    ..Default::default()
                });
            }
            Proponent::Individual(empty_individual())
        }
    };

    if !errors.is_clean() {
        return Err(errors);
    }

    Ok(ProposalFields {
        proponent,
        proposal_text,
        additional_comments,
    })
}

/// Strict-tier validation of an already-typed proposal. Used at submit
/// time, which validates the proposal's *current* state rather than an
/// incoming payload.
pub fn validate_submission(
    proposal: &tender_lifecycle::Proposal,
) -> Result<(), ProposalFieldErrors> {
    let mut errors = ProposalFieldErrors::default();

    if let Err(mut e) = generic_string(&proposal.proposal_text, "The proposal text", 1, 10_000) {
        errors.proposal_text.append(&mut e);
    }
    if let Err(mut e) = generic_string(
        &proposal.additional_comments,
        "Additional comments",
        0,
        10_000,
    ) {
        errors.additional_comments.append(&mut e);
    }

    if let Proponent::Individual(individual) = &proposal.proponent {
        let raw = IndividualProponentPayload {
            legal_name: Some(individual.legal_name.clone()),
            email: Some(individual.email.clone()),
            phone: Some(individual.phone.clone()),
            street1: Some(individual.street1.clone()),
            street2: Some(individual.street2.clone()),
            city: Some(individual.city.clone()),
            region: Some(individual.region.clone()),
            mail_code: Some(individual.mail_code.clone()),
            country: Some(individual.country.clone()),
        };
        let (_, individual_errors) = validate_individual(&raw, true);
        if !individual_errors.is_clean() {
            errors.proponent = Some(individual_errors);
        }
    }

    if errors.is_clean() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn empty_individual() -> IndividualProponent {
    IndividualProponent {
        legal_name: String::new(),
        email: String::new(),
        phone: String::new(),
        street1: String::new(),
        street2: String::new(),
        city: String::new(),
        region: String::new(),
        mail_code: String::new(),
        country: String::new(),
    }
}

/// Validate an individual contact block. In draft mode everything is
/// accepted verbatim; in strict mode each field runs its full check.
fn validate_individual(
    raw: &IndividualProponentPayload,
    strict: bool,
) -> (IndividualProponent, ProponentFieldErrors) {
    let mut errors = ProponentFieldErrors::default();

    let required = |value: Option<&str>, name: &str, errs: &mut Vec<String>| -> String {
        let value = value.unwrap_or("");
        if strict {
            match generic_string(value, name, 1, 100) {
                Ok(v) => v,
                Err(mut e) => {
                    errs.append(&mut e);
                    value.to_string()
                }
            }
        } else {
            value.to_string()
        }
    };

    let legal_name = required(
        raw.legal_name.as_deref(),
        "The legal name",
        &mut errors.legal_name,
    );
    let street1 = required(raw.street1.as_deref(), "The street address", &mut errors.street1);
    let city = required(raw.city.as_deref(), "The city", &mut errors.city);
    let region = required(raw.region.as_deref(), "The region", &mut errors.region);
    let mail_code = required(raw.mail_code.as_deref(), "The postal code", &mut errors.mail_code);
    let country = required(raw.country.as_deref(), "The country", &mut errors.country);
    let street2 = raw.street2.clone().unwrap_or_default();

    let email_value = if strict {
        match email(raw.email.as_deref().unwrap_or("")) {
            Ok(v) => v,
            Err(mut e) => {
                errors.email.append(&mut e);
                raw.email.clone().unwrap_or_default()
            }
        }
    } else {
        raw.email.clone().unwrap_or_default()
    };

    let phone_value = if strict {
        match optional(raw.phone.as_deref(), phone) {
            Ok(v) => v.unwrap_or_default(),
            Err(mut e) => {
                errors.phone.append(&mut e);
                raw.phone.clone().unwrap_or_default()
            }
        }
    } else {
        raw.phone.clone().unwrap_or_default()
    };

    (
        IndividualProponent {
            legal_name,
            email: email_value,
            phone: phone_value,
            street1,
            street2,
            city,
            region,
            mail_code,
            country,
        },
        errors,
    )
}

// ─── Tests ───────────────────────────────────────────────────────────
