use std::sync::Arc;

use crate::api::{User, UserDetails, UserId, UserSearchField};
use crate::password_encoder::{PasswordEncoder, PasswordEncoderError};
use crate::users_repository::{UserRepository, UserRepositoryError};

#[derive(thiserror::Error, Debug)]
pub enum UserServiceError {
    #[error("User with email {0} already exists")]
    AlreadyExists(String),

    #[error("User {0} does not exist")]
    NotExist(String),

    #[error(transparent)]
    PasswordHashing(#[from] PasswordEncoderError),

    #[error(transparent)]
    Repository(UserRepositoryError),
}

impl From<UserRepositoryError> for UserServiceError {
    fn from(err: UserRepositoryError) -> Self {
        match err {
            UserRepositoryError::EmailTaken(email) => UserServiceError::AlreadyExists(email),
            other => UserServiceError::Repository(other),
        }
    }
}

/// What the authentication middleware needs to check a login attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password_hash: String,
    pub authorities: Vec<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum CredentialsLookupError {
    #[error("User not found with email: {0}")]
    PrincipalNotFound(String),

    #[error("Credentials lookup failed {0}")]
    Unavailable(UserServiceError),
}

#[async_trait::async_trait]
pub trait CredentialsProvider: Send + Sync {
    async fn lookup_credentials(
        &self,
        identifier: &str,
    ) -> Result<Credentials, CredentialsLookupError>;
}

/// Users identified by a unique email, passwords are stored hashed
pub struct UserService {
    users_repository: Arc<dyn UserRepository>,
    password_encoder: PasswordEncoder,
}

impl UserService {
    pub fn new(users_repository: Arc<dyn UserRepository>, password_encoder: PasswordEncoder) -> Self {
        Self {
            users_repository,
            password_encoder,
        }
    }

    pub async fn find_all_paged(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<User>, UserServiceError> {
        Ok(self
            .users_repository
            .list_users()
            .await?
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    pub async fn find_by_name_prefix(&self, name: &str) -> Result<Vec<User>, UserServiceError> {
        self.find_by_prefix(UserSearchField::Name, name).await
    }

    pub async fn find_by_surname_prefix(
        &self,
        surname: &str,
    ) -> Result<Vec<User>, UserServiceError> {
        self.find_by_prefix(UserSearchField::Surname, surname).await
    }

    pub async fn find_by_email_prefix(&self, email: &str) -> Result<Vec<User>, UserServiceError> {
        self.find_by_prefix(UserSearchField::Email, email).await
    }

    pub async fn find_by_prefix(
        &self,
        field: UserSearchField,
        prefix: &str,
    ) -> Result<Vec<User>, UserServiceError> {
        Ok(self
            .users_repository
            .find_users_by_prefix(field, prefix)
            .await?)
    }

    pub async fn find_by_id(&self, user_id: UserId) -> Result<User, UserServiceError> {
        self.users_repository
            .find_user(user_id)
            .await?
            .ok_or_else(|| UserServiceError::NotExist(user_id.to_string()))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<User, UserServiceError> {
        let user = self
            .users_repository
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| UserServiceError::NotExist(email.to_string()))?;
        if !self.exists(&user.details.email).await? {
            return Err(UserServiceError::NotExist(user.details.email));
        }
        Ok(user)
    }

    /// Stores the hash of the given plaintext password, never the plaintext
    #[tracing::instrument(skip(self, details), fields(email = %details.email))]
    pub async fn save(&self, mut details: UserDetails) -> Result<User, UserServiceError> {
        if self.users_repository.exists_by_email(&details.email).await? {
            tracing::warn!("User with email {} already exists", details.email);
            return Err(UserServiceError::AlreadyExists(details.email));
        }
        details.password = self.password_encoder.encode(&details.password)?;
        let user = self.users_repository.add_user(details).await?;
        tracing::info!("Saved user {}", user.user_id);
        Ok(user)
    }

    /// Full overwrite by id. The password is stored as given, so it has to be
    /// the already stored hash; a plaintext value would end up stored raw
    #[tracing::instrument(skip(self, user), fields(user_id = user.user_id))]
    pub async fn update(&self, user: User) -> Result<User, UserServiceError> {
        if !self.users_repository.exists_by_id(user.user_id).await? {
            return Err(UserServiceError::NotExist(user.user_id.to_string()));
        }
        if !self.users_repository.replace_user(&user).await? {
            return Err(UserServiceError::NotExist(user.user_id.to_string()));
        }
        Ok(user)
    }

    /// Deleting a user that does not exist is not an error
    #[tracing::instrument(skip(self))]
    pub async fn delete_by_id(&self, user_id: UserId) -> Result<(), UserServiceError> {
        self.users_repository.delete_user(user_id).await?;
        Ok(())
    }

    pub async fn exists(&self, email: &str) -> Result<bool, UserServiceError> {
        Ok(self.users_repository.exists_by_email(email).await?)
    }

    pub async fn count(&self) -> Result<i64, UserServiceError> {
        Ok(self.users_repository.count_users().await?)
    }
}

#[async_trait::async_trait]
impl CredentialsProvider for UserService {
    async fn lookup_credentials(
        &self,
        identifier: &str,
    ) -> Result<Credentials, CredentialsLookupError> {
        let user = match self.find_by_email(identifier).await {
            Ok(user) => user,
            Err(UserServiceError::NotExist(_)) => {
                return Err(CredentialsLookupError::PrincipalNotFound(
                    identifier.to_string(),
                ))
            }
            Err(err) => return Err(CredentialsLookupError::Unavailable(err)),
        };
        Ok(Credentials {
            username: user.details.email,
            password_hash: user.details.password,
            authorities: vec![user.details.role.authority()],
        })
    }
}
