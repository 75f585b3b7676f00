use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use userdir_core::{User, UserId};

use super::r#trait::{RepositoryError, UserRepository};

#[derive(Debug)]
struct Table {
    rows: BTreeMap<UserId, User>,
    /// `None` once the id space is used up.
    next_id: Option<i64>,
}

impl Default for Table {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: Some(1),
        }
    }
}

/// In-memory user store.
///
/// Intended for tests/dev. Ids start at 1 and are never reused, even after
/// `delete_all()`.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    table: RwLock<Table>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> RepositoryError {
        RepositoryError::Backend("lock poisoned".to_string())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn save(&self, user: User) -> Result<User, RepositoryError> {
        let mut table = self.table.write().map_err(|_| Self::poisoned())?;

        let id = match user.id {
            Some(id) => {
                // Keep the counter ahead of explicitly supplied ids.
                if table.next_id.is_some_and(|next| id.get() >= next) {
                    table.next_id = id.get().checked_add(1);
                }
                id
            }
            None => {
                let raw = table
                    .next_id
                    .ok_or_else(|| RepositoryError::Backend("user id space exhausted".to_string()))?;
                let id = UserId::new(raw).map_err(|e| RepositoryError::Backend(e.to_string()))?;
                table.next_id = raw.checked_add(1);
                id
            }
        };

        let stored = user.with_id(id);
        table.rows.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_all(&self) -> Result<Vec<User>, RepositoryError> {
        let table = self.table.read().map_err(|_| Self::poisoned())?;
        Ok(table.rows.values().cloned().collect())
    }

    async fn find_one(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let table = self.table.read().map_err(|_| Self::poisoned())?;
        Ok(table.rows.get(&id).cloned())
    }

    async fn update(&self, id: UserId, user: User) -> Result<Option<User>, RepositoryError> {
        let mut table = self.table.write().map_err(|_| Self::poisoned())?;
        let Some(row) = table.rows.get_mut(&id) else {
            return Ok(None);
        };

        *row = user.with_id(id);
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let mut table = self.table.write().map_err(|_| Self::poisoned())?;
        Ok(table.rows.remove(&id).is_some())
    }

    async fn delete_all(&self) -> Result<(), RepositoryError> {
        let mut table = self.table.write().map_err(|_| Self::poisoned())?;
        table.rows.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bengt() -> User {
        User::new("Bengt", "+35308511111111", "Dublin")
    }

    fn john() -> User {
        User::new("John", "+35308522222222", "London")
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let repo = InMemoryUserRepository::new();

        let first = repo.save(bengt()).await.unwrap();
        let second = repo.save(john()).await.unwrap();

        assert_eq!(first.id.unwrap().get(), 1);
        assert_eq!(second.id.unwrap().get(), 2);
        assert!(first.same_details(&bengt()));
    }

    #[tokio::test]
    async fn find_all_returns_creation_order() {
        let repo = InMemoryUserRepository::new();
        repo.save_all(vec![bengt(), john()]).await.unwrap();

        let all = repo.find_all().await.unwrap();
        let names: Vec<_> = all.iter().map(|u| u.name.as_deref().unwrap()).collect();
        assert_eq!(names, ["Bengt", "John"]);
    }

    #[tokio::test]
    async fn save_with_id_overwrites_every_field() {
        let repo = InMemoryUserRepository::new();
        let stored = repo.save(bengt()).await.unwrap();
        let id = stored.id.unwrap();

        let replacement = User {
            id: Some(id),
            name: Some("Bengt".into()),
            phone_number: None,
            address: Some("Berlin".into()),
        };
        repo.save(replacement.clone()).await.unwrap();

        assert_eq!(repo.find_one(id).await.unwrap(), Some(replacement));
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn explicit_id_does_not_collide_with_later_inserts() {
        let repo = InMemoryUserRepository::new();
        let explicit = UserId::new(10).unwrap();
        repo.save(bengt().with_id(explicit)).await.unwrap();

        let next = repo.save(john()).await.unwrap();
        assert_eq!(next.id.unwrap().get(), 11);
    }

    #[tokio::test]
    async fn update_overwrites_existing_record_and_forces_id() {
        let repo = InMemoryUserRepository::new();
        let id = repo.save(bengt()).await.unwrap().id.unwrap();
        let other = UserId::new(99).unwrap();

        let moved = User::new("Bengt", "+35308511111111", "Berlin").with_id(other);
        let updated = repo.update(id, moved).await.unwrap().unwrap();

        assert_eq!(updated.id, Some(id));
        assert_eq!(updated.address.as_deref(), Some("Berlin"));
        assert_eq!(repo.find_all().await.unwrap(), vec![updated]);
    }

    #[tokio::test]
    async fn update_of_deleted_record_does_not_recreate_it() {
        let repo = InMemoryUserRepository::new();
        let id = repo.save(bengt()).await.unwrap().id.unwrap();
        repo.delete(id).await.unwrap();

        assert_eq!(repo.update(id, bengt()).await.unwrap(), None);
        assert!(repo.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn max_id_is_stored_and_further_inserts_fail_cleanly() {
        let repo = InMemoryUserRepository::new();
        let max = UserId::new(i64::MAX).unwrap();

        let stored = repo.save(bengt().with_id(max)).await.unwrap();
        assert_eq!(stored.id, Some(max));

        let err = repo.save(john()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Backend(_)));

        // Explicit ids below the exhausted counter still work.
        let low = UserId::new(5).unwrap();
        assert_eq!(repo.save(john().with_id(low)).await.unwrap().id, Some(low));
        assert_eq!(repo.find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_was_removed() {
        let repo = InMemoryUserRepository::new();
        let id = repo.save(bengt()).await.unwrap().id.unwrap();

        assert!(repo.delete(id).await.unwrap());
        assert!(!repo.delete(id).await.unwrap());
        assert_eq!(repo.find_one(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_all_clears_but_keeps_counter() {
        let repo = InMemoryUserRepository::new();
        repo.save_all(vec![bengt(), john()]).await.unwrap();
        repo.delete_all().await.unwrap();

        assert!(repo.find_all().await.unwrap().is_empty());
        let fresh = repo.save(bengt()).await.unwrap();
        assert_eq!(fresh.id.unwrap().get(), 3);
    }
}
