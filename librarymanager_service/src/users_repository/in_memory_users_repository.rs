use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::api::{starts_with_ignore_case, User, UserDetails, UserId, UserSearchField};
use crate::users_repository::{UserRepository, UserRepositoryError};

#[derive(Default)]
pub struct InMemoryUsersRepository {
    users: parking_lot::RwLock<BTreeMap<UserId, UserDetails>>,
    user_sequence_generator: AtomicI32,
}

fn email_taken_by_other(
    users: &BTreeMap<UserId, UserDetails>,
    email: &str,
    except: Option<UserId>,
) -> bool {
    users
        .iter()
        .any(|(&user_id, details)| details.email == email && Some(user_id) != except)
}

fn to_user((&user_id, details): (&UserId, &UserDetails)) -> User {
    User {
        user_id,
        details: details.clone(),
    }
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUsersRepository {
    async fn add_user(&self, details: UserDetails) -> Result<User, UserRepositoryError> {
        let mut locked_users = self.users.write();
        if email_taken_by_other(&locked_users, &details.email, None) {
            return Err(UserRepositoryError::EmailTaken(details.email));
        }
        let user_id = self.user_sequence_generator.fetch_add(1, Ordering::Relaxed) + 1;
        locked_users.insert(user_id, details.clone());
        Ok(User { user_id, details })
    }

    async fn replace_user(&self, user: &User) -> Result<bool, UserRepositoryError> {
        let mut locked_users = self.users.write();
        if email_taken_by_other(&locked_users, &user.details.email, Some(user.user_id)) {
            return Err(UserRepositoryError::EmailTaken(user.details.email.clone()));
        }
        if let Some(details) = locked_users.get_mut(&user.user_id) {
            *details = user.details.clone();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn find_user(&self, user_id: UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok(self.users.read().get_key_value(&user_id).map(to_user))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError> {
        Ok(self
            .users
            .read()
            .iter()
            .find(|(_, details)| details.email == email)
            .map(to_user))
    }

    async fn list_users(&self) -> Result<Vec<User>, UserRepositoryError> {
        Ok(self.users.read().iter().map(to_user).collect())
    }

    async fn find_users_by_prefix(
        &self,
        field: UserSearchField,
        prefix: &str,
    ) -> Result<Vec<User>, UserRepositoryError> {
        Ok(self
            .users
            .read()
            .iter()
            .filter(|(_, details)| {
                let value = match field {
                    UserSearchField::Name => &details.name,
                    UserSearchField::Surname => &details.surname,
                    UserSearchField::Email => &details.email,
                };
                starts_with_ignore_case(value, prefix)
            })
            .map(to_user)
            .collect())
    }

    async fn exists_by_id(&self, user_id: UserId) -> Result<bool, UserRepositoryError> {
        Ok(self.users.read().contains_key(&user_id))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, UserRepositoryError> {
        Ok(email_taken_by_other(&self.users.read(), email, None))
    }

    async fn count_users(&self) -> Result<i64, UserRepositoryError> {
        Ok(self.users.read().len() as i64)
    }

    async fn delete_user(&self, user_id: UserId) -> Result<bool, UserRepositoryError> {
        Ok(self.users.write().remove(&user_id).is_some())
    }
}

#[cfg(test)]
mod tests_in_memory_users_repository {
    use super::*;
    use crate::api::Role;

    fn user_details(name: &str, email: &str) -> UserDetails {
        UserDetails {
            name: name.to_string(),
            surname: format!("Sur{}", name),
            email: email.to_string(),
            phone_number: 123456789,
            password: "123456789".to_string(),
            role: Role::User,
        }
    }

    #[tokio::test]
    /// Simple test to cover user management
    /// 1. Lists users - expects empty
    /// 2. Creates three users
    /// 3. Finds them by id, email and email prefix
    /// 4. Deletes one
    async fn test_user_management() {
        let repository = InMemoryUsersRepository::default();
        assert_eq!(repository.list_users().await.unwrap(), vec![]);

        let user1 = repository
            .add_user(user_details("Name1", "email1@gmail.com"))
            .await
            .unwrap();
        let user2 = repository
            .add_user(user_details("Name2", "email2@gmail.com"))
            .await
            .unwrap();
        let user3 = repository
            .add_user(user_details("Name3", "emil@gmail.com"))
            .await
            .unwrap();

        assert_eq!(repository.count_users().await.unwrap(), 3);
        assert_eq!(
            repository.find_user(user2.user_id).await.unwrap(),
            Some(user2.clone())
        );
        assert_eq!(
            repository
                .find_user_by_email("email1@gmail.com")
                .await
                .unwrap(),
            Some(user1.clone())
        );
        assert!(repository.exists_by_email("email1@gmail.com").await.unwrap());
        assert!(!repository.exists_by_email("emial@gmail.com").await.unwrap());
        assert!(repository.exists_by_id(user3.user_id).await.unwrap());

        assert_eq!(
            repository
                .find_users_by_prefix(UserSearchField::Email, "em")
                .await
                .unwrap()
                .len(),
            3
        );
        assert_eq!(
            repository
                .find_users_by_prefix(UserSearchField::Email, "EMI")
                .await
                .unwrap(),
            vec![user3.clone()]
        );
        assert_eq!(
            repository
                .find_users_by_prefix(UserSearchField::Surname, "surname2")
                .await
                .unwrap(),
            vec![user2.clone()]
        );

        assert!(repository.delete_user(user1.user_id).await.unwrap());
        assert!(!repository.delete_user(user1.user_id).await.unwrap());
        assert_eq!(
            repository.list_users().await.unwrap(),
            vec![user2, user3]
        );
    }

    #[tokio::test]
    async fn test_email_uniqueness_is_enforced_by_repository() {
        let repository = InMemoryUsersRepository::default();
        let user1 = repository
            .add_user(user_details("Name1", "email1@gmail.com"))
            .await
            .unwrap();
        let user2 = repository
            .add_user(user_details("Name2", "email2@gmail.com"))
            .await
            .unwrap();

        let duplicate = repository
            .add_user(user_details("Other", "email1@gmail.com"))
            .await;
        assert!(matches!(
            duplicate,
            Err(UserRepositoryError::EmailTaken(..))
        ));

        let stealing_email = User {
            details: user_details("Name2", "email1@gmail.com"),
            ..user2
        };
        assert!(matches!(
            repository.replace_user(&stealing_email).await,
            Err(UserRepositoryError::EmailTaken(..))
        ));

        let renamed = User {
            details: user_details("Renamed", "email1@gmail.com"),
            ..user1
        };
        assert!(repository.replace_user(&renamed).await.unwrap());
    }
}
