pub use in_memory_users_repository::InMemoryUsersRepository;
pub use postgres_users_repository::PostgresUsersRepository;

use crate::api::{User, UserDetails, UserId, UserSearchField};

mod in_memory_users_repository;
mod postgres_users_repository;

#[derive(thiserror::Error, Debug)]
pub enum UserRepositoryError {
    #[error("User with email {0} already stored")]
    EmailTaken(String),

    #[error("DatabaseFailure failure {0}")]
    DatabaseFailure(#[from] tokio_postgres::Error),

    #[error("Other error {0}")]
    Other(String),
}

#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    /// Stores user details as given, the password is not touched here.
    /// Fails with `EmailTaken` if the email is already used
    async fn add_user(&self, details: UserDetails) -> Result<User, UserRepositoryError>;
    /// Overwrites the user with matching id, returns false if there was no such user
    async fn replace_user(&self, user: &User) -> Result<bool, UserRepositoryError>;
    async fn find_user(&self, user_id: UserId) -> Result<Option<User>, UserRepositoryError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError>;
    /// Lists all users ordered by id
    async fn list_users(&self) -> Result<Vec<User>, UserRepositoryError>;
    async fn find_users_by_prefix(
        &self,
        field: UserSearchField,
        prefix: &str,
    ) -> Result<Vec<User>, UserRepositoryError>;
    async fn exists_by_id(&self, user_id: UserId) -> Result<bool, UserRepositoryError>;
    async fn exists_by_email(&self, email: &str) -> Result<bool, UserRepositoryError>;
    async fn count_users(&self) -> Result<i64, UserRepositoryError>;
    /// Returns false if there was nothing to delete
    async fn delete_user(&self, user_id: UserId) -> Result<bool, UserRepositoryError>;
}
