use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use userhub_application::{UserRepository, UserUpdateReport};
use userhub_core::{AppError, AppResult};
use userhub_domain::{EmailAddress, FieldPatch, ID_KEY, UserDocument, UserFilter, UserId};

/// In-memory user repository implementation.
///
/// Reference adapter for tests and local wiring. Documents keep their
/// insertion order, which is also the order `find` reports matches in.
/// Inserts go through the same schema gate a real collection validator
/// would apply; schema failures surface as repository errors, matching
/// how a store write error reaches the application layer.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    documents: RwLock<Vec<UserDocument>>,
}

impl InMemoryUserRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find(&self, filter: &UserFilter) -> AppResult<Vec<UserDocument>> {
        let documents = self.documents.read().await;

        Ok(documents
            .iter()
            .filter(|document| {
                filter
                    .criteria()
                    .iter()
                    .all(|(key, expected)| document.get(key) == Some(expected))
            })
            .cloned()
            .collect())
    }

    async fn update_fields(
        &self,
        id: &UserId,
        patch: &FieldPatch,
    ) -> AppResult<UserUpdateReport> {
        // The store owns id assignment; ids never change after insert.
        if patch.fields().contains_key(ID_KEY) {
            return Err(AppError::Repository(
                "write error: the 'id' field is immutable".to_owned(),
            ));
        }

        let mut documents = self.documents.write().await;

        let Some(target) = documents
            .iter_mut()
            .find(|document| document.id() == Some(id.as_str()))
        else {
            return Ok(UserUpdateReport {
                matched_count: 0,
                modified_count: 0,
            });
        };

        let updated = target
            .patched(patch)
            .map_err(|error| AppError::Repository(format!("write error: {error}")))?;
        let modified = updated != *target;
        *target = updated;

        Ok(UserUpdateReport {
            matched_count: 1,
            modified_count: u64::from(modified),
        })
    }

    async fn insert(&self, document: UserDocument) -> AppResult<UserDocument> {
        // Schema gate, like a collection validator: the natural key must be
        // a well-formed email before the document is accepted.
        if !EmailAddress::is_valid(document.email()) {
            return Err(AppError::Repository(format!(
                "write error: document failed schema validation for 'email': '{}'",
                document.email()
            )));
        }

        let mut documents = self.documents.write().await;

        let stored = match document.id().map(str::to_owned) {
            Some(id) => {
                if documents
                    .iter()
                    .any(|existing| existing.id() == Some(id.as_str()))
                {
                    return Err(AppError::Repository(format!(
                        "write error: duplicate id '{id}'"
                    )));
                }
                document
            }
            None => {
                let id = UserId::new(Uuid::new_v4().simple().to_string())?;
                document.with_id(&id)
            }
        };

        documents.push(stored.clone());
        Ok(stored)
    }
}

#[cfg(test)]
mod tests;
