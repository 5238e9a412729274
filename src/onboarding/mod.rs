//! Onboarding domain: submission records and the token-keyed store.
//!
//! A record is created when a lead submits the form and carries the
//! submission through the Facebook OAuth hand-off, which flips it from
//! `pending` to `connected`.

pub mod model;
pub mod slug;
pub mod state;
pub mod store;
pub mod validate;

pub use model::{LeadPayload, OnboardingRecord, RecordPatch, Submission};
pub use slug::slugify;
pub use state::OnboardingStatus;
pub use store::{InMemoryStore, Insertion, OnboardingStore};
pub use validate::{has_required_fields, is_valid_e164, missing_required_fields};
