use std::sync::Arc;

use thiserror::Error;

use userdir_core::{User, UserId};
use userdir_infra::{
    InMemoryUserRepository, PostgresUserRepository, RepositoryError, StoreConfig, UserRepository,
};

/// Failure of a user operation, before it is mapped to HTTP.
#[derive(Debug, Error)]
pub enum UserServiceError {
    #[error("user {0} not found")]
    NotFound(UserId),

    #[error(transparent)]
    Store(#[from] RepositoryError),
}

/// Shared state handed to every handler.
///
/// Holds the injected `UserRepository`; swap in `InMemoryUserRepository` for tests.
#[derive(Clone)]
pub struct AppServices {
    users: Arc<dyn UserRepository>,
}

impl AppServices {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryUserRepository::new()))
    }

    /// Store a new user. Whatever id the caller supplied is discarded.
    pub async fn create_user(&self, user: User) -> Result<User, UserServiceError> {
        let saved = self.users.save(user.without_id()).await?;
        tracing::info!(user_id = ?saved.id, "user created");
        Ok(saved)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, UserServiceError> {
        Ok(self.users.find_all().await?)
    }

    pub async fn get_user(&self, id: UserId) -> Result<User, UserServiceError> {
        self.users
            .find_one(id)
            .await?
            .ok_or(UserServiceError::NotFound(id))
    }

    /// Full overwrite of an existing user; `id` always wins over the body.
    /// Never inserts: a user deleted in the meantime stays deleted.
    pub async fn replace_user(&self, id: UserId, user: User) -> Result<User, UserServiceError> {
        let saved = self
            .users
            .update(id, user)
            .await?
            .ok_or(UserServiceError::NotFound(id))?;
        tracing::info!(user_id = %id, "user replaced");
        Ok(saved)
    }

    pub async fn delete_user(&self, id: UserId) -> Result<(), UserServiceError> {
        if !self.users.delete(id).await? {
            return Err(UserServiceError::NotFound(id));
        }

        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }
}

/// Pick the repository named by configuration.
pub async fn build_services(store: &StoreConfig) -> Result<AppServices, RepositoryError> {
    match store {
        StoreConfig::InMemory => {
            tracing::info!("using in-memory user store");
            Ok(AppServices::in_memory())
        }
        StoreConfig::Postgres {
            database_url,
            max_connections,
        } => {
            let repo = PostgresUserRepository::connect(database_url, *max_connections).await?;
            tracing::info!(max_connections, "using postgres user store");
            Ok(AppServices::new(Arc::new(repo)))
        }
    }
}
