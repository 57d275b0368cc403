//! User lookup ports and application service.
//!
//! Owns the "find a unique user by a validated natural key" contract:
//! email validation, zero/one/many disambiguation, and the partial-update
//! passthrough. Storage and transport stay behind the ports; the service
//! itself holds no state of its own, so every call is independent.

use std::sync::Arc;

use async_trait::async_trait;

use userhub_core::{AppError, AppResult};
use userhub_domain::{EmailAddress, FieldPatch, UserDocument, UserFilter, UserId};

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Acknowledgement for a partial update, as reported by the store.
///
/// The service forwards this shape without interpreting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserUpdateReport {
    /// Number of documents the update selector matched.
    pub matched_count: u64,
    /// Number of documents whose content actually changed.
    pub modified_count: u64,
}

/// Repository port for user document storage.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Returns every document matching the filter exactly, in the store's
    /// own order. Failures must surface with their message text intact.
    async fn find(&self, filter: &UserFilter) -> AppResult<Vec<UserDocument>>;

    /// Sets the patched fields on the identified document, leaving all
    /// other fields untouched. Never a full-document replace.
    async fn update_fields(
        &self,
        id: &UserId,
        patch: &FieldPatch,
    ) -> AppResult<UserUpdateReport>;

    /// Stores a new document, applying store-side schema checks and
    /// assigning an id. Returns the stored document including its id.
    async fn insert(&self, document: UserDocument) -> AppResult<UserDocument>;
}

/// Diagnostic emitted when an operation completes in a degraded way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupDiagnostic {
    /// A lookup by natural key matched more than one document. The store
    /// owns the uniqueness invariant; the lookup still succeeds.
    MultipleMatches {
        /// The email that was queried.
        email: String,
        /// How many documents matched it.
        match_count: usize,
    },
}

/// Observability port for lookup diagnostics.
///
/// Recording is infallible on purpose: a diagnostics sink must never be
/// able to fail an operation that already has a result.
#[async_trait]
pub trait LookupDiagnostics: Send + Sync {
    /// Records a diagnostic event.
    async fn record(&self, event: LookupDiagnostic);
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Application service for unique-user lookup and update passthrough.
#[derive(Clone)]
pub struct UserLookupService {
    repository: Arc<dyn UserRepository>,
    diagnostics: Arc<dyn LookupDiagnostics>,
}

impl UserLookupService {
    /// Creates a new lookup service over the given ports.
    #[must_use]
    pub fn new(
        repository: Arc<dyn UserRepository>,
        diagnostics: Arc<dyn LookupDiagnostics>,
    ) -> Self {
        Self {
            repository,
            diagnostics,
        }
    }

    /// Returns the user associated with the given email address.
    ///
    /// The email is validated before the repository is touched; a malformed
    /// or empty email fails with `AppError::Validation`. Zero matches fail
    /// with `AppError::NotFound`. Repository failures propagate unchanged.
    ///
    /// More than one match is degraded success, not an error: a
    /// `MultipleMatches` diagnostic is recorded and the first document in
    /// repository order is returned, without re-sorting.
    pub async fn get_by_email(&self, email: &str) -> AppResult<UserDocument> {
        let email = EmailAddress::new(email)?;

        let matches = self
            .repository
            .find(&UserFilter::by_email(&email))
            .await?;

        let match_count = matches.len();
        let Some(first) = matches.into_iter().next() else {
            return Err(AppError::NotFound(format!(
                "no user with email '{}'",
                email.as_str()
            )));
        };

        if match_count > 1 {
            self.diagnostics
                .record(LookupDiagnostic::MultipleMatches {
                    email: email.as_str().to_owned(),
                    match_count,
                })
                .await;
        }

        Ok(first)
    }

    /// Applies a partial update to the identified user.
    ///
    /// Pure passthrough: the patch is forwarded to the repository with
    /// set-these-fields semantics, the acknowledgement comes back
    /// uninterpreted, and any repository failure propagates unchanged.
    /// No retry, no local recovery.
    pub async fn update_user(
        &self,
        id: &UserId,
        patch: &FieldPatch,
    ) -> AppResult<UserUpdateReport> {
        self.repository.update_fields(id, patch).await
    }
}
