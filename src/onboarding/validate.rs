//! Inbound submission checks. Pure functions, callers build the messages.

use std::sync::LazyLock;

use regex::Regex;

use super::model::Submission;
use crate::config::SubmissionVariant;

// ASCII digits only: `\d` would also accept non-ASCII Unicode digits.
static E164: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9][0-9]{1,14}$").expect("E.164 pattern is valid"));

/// `+`, a nonzero leading digit, then 1–14 more digits.
pub fn is_valid_e164(phone: &str) -> bool {
    E164.is_match(phone)
}

/// Names of the mandatory fields that are empty or whitespace-only.
pub fn missing_required_fields(
    submission: &Submission,
    variant: SubmissionVariant,
) -> Vec<&'static str> {
    let mut fields = vec![
        ("name", &submission.name),
        ("owner_name", &submission.owner_name),
        ("owner_phone", &submission.owner_phone),
        ("owner_email", &submission.owner_email),
        ("target_country", &submission.target_country),
        ("base_agent", &submission.base_agent),
        ("timezone", &submission.timezone),
    ];

    if variant == SubmissionVariant::BusinessProfile {
        fields.extend([
            ("business_niche", &submission.business_niche),
            ("service_area", &submission.service_area),
            ("business_hours", &submission.business_hours),
            ("services_offered", &submission.services_offered),
            ("services_not_offered", &submission.services_not_offered),
        ]);
    }

    fields
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(key, _)| key)
        .collect()
}

pub fn has_required_fields(submission: &Submission, variant: SubmissionVariant) -> bool {
    missing_required_fields(submission, variant).is_empty()
}
