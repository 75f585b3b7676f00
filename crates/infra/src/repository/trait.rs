use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use userdir_core::{User, UserId};

/// User store operation error.
///
/// These are **infrastructure errors** (connectivity, backend failures,
/// unreadable rows) as opposed to domain errors. A missing record is not an
/// error here; lookups return `None` / `false` instead.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The backend could not be reached (pool closed, connection refused, timeout).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected or failed the operation.
    #[error("store backend error: {0}")]
    Backend(String),

    /// A stored row could not be mapped back into a `User`.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Persistence collaborator for `User` records.
///
/// ## Save Semantics
///
/// `save()` is insert-or-update keyed by id presence:
/// - `id == None`: insert, the store assigns the next identifier
/// - `id == Some(_)`: overwrite every field of the record with that id
///   (inserting it under that id if it does not exist)
///
/// The returned record always carries an id.
///
/// ## Update Semantics
///
/// `update()` overwrites an existing record only. The existence check and
/// the write happen as one step, so a record deleted concurrently is never
/// brought back; `None` means nothing was stored under the id.
///
/// ## Ordering
///
/// `find_all()` returns records in ascending id order, which is creation
/// order for store-assigned ids.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn save(&self, user: User) -> Result<User, RepositoryError>;

    /// Save each record in order, returning the stored copies.
    async fn save_all(&self, users: Vec<User>) -> Result<Vec<User>, RepositoryError> {
        let mut saved = Vec::with_capacity(users.len());
        for user in users {
            saved.push(self.save(user).await?);
        }
        Ok(saved)
    }

    async fn find_all(&self) -> Result<Vec<User>, RepositoryError>;

    async fn find_one(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Overwrite every field of the record stored under `id`.
    async fn update(&self, id: UserId, user: User) -> Result<Option<User>, RepositoryError>;

    /// Remove the record; `false` when nothing was stored under `id`.
    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError>;

    async fn delete_all(&self) -> Result<(), RepositoryError>;
}

#[async_trait]
impl<R> UserRepository for Arc<R>
where
    R: UserRepository + ?Sized,
{
    async fn save(&self, user: User) -> Result<User, RepositoryError> {
        (**self).save(user).await
    }

    async fn save_all(&self, users: Vec<User>) -> Result<Vec<User>, RepositoryError> {
        (**self).save_all(users).await
    }

    async fn find_all(&self) -> Result<Vec<User>, RepositoryError> {
        (**self).find_all().await
    }

    async fn find_one(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        (**self).find_one(id).await
    }

    async fn update(&self, id: UserId, user: User) -> Result<Option<User>, RepositoryError> {
        (**self).update(id, user).await
    }

    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        (**self).delete(id).await
    }

    async fn delete_all(&self) -> Result<(), RepositoryError> {
        (**self).delete_all().await
    }
}
