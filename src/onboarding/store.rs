//! Onboarding store: repository trait plus the in-memory backend.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::model::{OnboardingRecord, RecordPatch};
use crate::error::StoreError;

/// Outcome of [`OnboardingStore::insert_if_absent`].
#[derive(Debug, Clone, PartialEq)]
pub enum Insertion {
    Inserted,
    /// A record with the same owner email (or, failing that, slug) exists.
    Duplicate(OnboardingRecord),
}

/// Backend-agnostic store for onboarding records.
#[async_trait]
pub trait OnboardingStore: Send + Sync {
    /// Insert or overwrite the record under its token and index it by email and slug.
    async fn set(&self, record: OnboardingRecord) -> Result<(), StoreError>;

    async fn get(&self, token: &str) -> Result<Option<OnboardingRecord>, StoreError>;

    /// Merge `patch` into the record and stamp `updated_at`.
    ///
    /// Returns `Ok(None)` when the token is unknown. A patch that would move
    /// the status backward is rejected.
    async fn update(
        &self,
        token: &str,
        patch: RecordPatch,
    ) -> Result<Option<OnboardingRecord>, StoreError>;

    /// Email match wins over slug match.
    async fn find_by_email_or_slug(
        &self,
        email: &str,
        slug: &str,
    ) -> Result<Option<OnboardingRecord>, StoreError>;

    /// Duplicate check and insert as one atomic step.
    async fn insert_if_absent(&self, record: OnboardingRecord) -> Result<Insertion, StoreError>;

    /// Release the reservation taken by [`OnboardingRecord::reserved`] once
    /// the submission has been handed off. Returns `None` if the token is gone.
    async fn mark_forwarded(&self, token: &str) -> Result<Option<OnboardingRecord>, StoreError>;

    /// Remove the record and its index entries. Returns the removed record.
    async fn delete(&self, token: &str) -> Result<Option<OnboardingRecord>, StoreError>;

    async fn get_all(&self) -> Result<Vec<OnboardingRecord>, StoreError>;

    /// Wipe everything. Returns the number of records removed.
    async fn clear(&self) -> Result<usize, StoreError>;

    async fn len(&self) -> Result<usize, StoreError>;
}

/// Emails are matched case-insensitively.
fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Default)]
struct Inner {
    records: HashMap<String, OnboardingRecord>,
    by_email: HashMap<String, String>,
    by_slug: HashMap<String, String>,
}

impl Inner {
    fn find(&self, email: &str, slug: &str) -> Option<&OnboardingRecord> {
        let by_email = self
            .by_email
            .get(&email_key(email))
            .and_then(|token| self.records.get(token));

        // Empty slugs are never indexed, so they never collide.
        by_email.or_else(|| {
            if slug.is_empty() {
                return None;
            }
            self.by_slug
                .get(slug)
                .and_then(|token| self.records.get(token))
        })
    }

    fn unindex(&mut self, record: &OnboardingRecord) {
        let email = email_key(record.owner_email());
        if self.by_email.get(&email) == Some(&record.token) {
            self.by_email.remove(&email);
        }
        if self.by_slug.get(&record.slug) == Some(&record.token) {
            self.by_slug.remove(&record.slug);
        }
    }

    fn insert(&mut self, record: OnboardingRecord) {
        if let Some(previous) = self.records.remove(&record.token) {
            self.unindex(&previous);
        }
        self.by_email
            .insert(email_key(record.owner_email()), record.token.clone());
        if !record.slug.is_empty() {
            self.by_slug.insert(record.slug.clone(), record.token.clone());
        }
        self.records.insert(record.token.clone(), record);
    }
}

/// Process-lifetime store. All state is lost on restart.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl OnboardingStore for InMemoryStore {
    async fn set(&self, record: OnboardingRecord) -> Result<(), StoreError> {
        debug!(token = %record.token, slug = %record.slug, "Storing onboarding record");
        self.inner.write().await.insert(record);
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<OnboardingRecord>, StoreError> {
        Ok(self.inner.read().await.records.get(token).cloned())
    }

    async fn update(
        &self,
        token: &str,
        patch: RecordPatch,
    ) -> Result<Option<OnboardingRecord>, StoreError> {
        let mut inner = self.inner.write().await;

        let Some(record) = inner.records.get_mut(token) else {
            debug!(token = %token, "Update skipped, token not found");
            return Ok(None);
        };

        if let Some(status) = patch.status {
            if !record.status.accepts(status) {
                return Err(StoreError::InvalidTransition {
                    token: token.to_string(),
                    from: record.status.to_string(),
                    to: status.to_string(),
                });
            }
            record.status = status;
        }
        if let Some(access_token) = patch.facebook_access_token {
            record.facebook_access_token = Some(access_token);
        }
        if let Some(user_data) = patch.facebook_user_data {
            record.facebook_user_data = Some(user_data);
        }
        record.updated_at = Some(Utc::now());

        Ok(Some(record.clone()))
    }

    async fn find_by_email_or_slug(
        &self,
        email: &str,
        slug: &str,
    ) -> Result<Option<OnboardingRecord>, StoreError> {
        Ok(self.inner.read().await.find(email, slug).cloned())
    }

    async fn insert_if_absent(&self, record: OnboardingRecord) -> Result<Insertion, StoreError> {
        let mut inner = self.inner.write().await;

        if let Some(existing) = inner.find(record.owner_email(), &record.slug) {
            debug!(
                token = %existing.token,
                slug = %record.slug,
                "Duplicate onboarding submission"
            );
            return Ok(Insertion::Duplicate(existing.clone()));
        }

        info!(token = %record.token, slug = %record.slug, "Onboarding record created");
        inner.insert(record);
        Ok(Insertion::Inserted)
    }

    async fn mark_forwarded(&self, token: &str) -> Result<Option<OnboardingRecord>, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.records.get_mut(token).map(|record| {
            record.awaiting_forward = false;
            record.clone()
        }))
    }

    async fn delete(&self, token: &str) -> Result<Option<OnboardingRecord>, StoreError> {
        let mut inner = self.inner.write().await;
        let removed = inner.records.remove(token);
        if let Some(record) = &removed {
            inner.unindex(record);
            debug!(token = %token, "Onboarding record deleted");
        }
        Ok(removed)
    }

    async fn get_all(&self) -> Result<Vec<OnboardingRecord>, StoreError> {
        Ok(self.inner.read().await.records.values().cloned().collect())
    }

    async fn clear(&self) -> Result<usize, StoreError> {
        let mut inner = self.inner.write().await;
        let removed = inner.records.len();
        *inner = Inner::default();
        info!(count = removed, "Onboarding store cleared");
        Ok(removed)
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.inner.read().await.records.len())
    }
}
