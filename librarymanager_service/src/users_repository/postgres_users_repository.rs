use std::sync::Arc;

use anyhow::Context;
use tokio_postgres::{Client, Row, Statement};

use crate::api::{Role, User, UserDetails, UserId, UserSearchField};
use crate::postgres::{is_unique_violation, prefix_pattern};
use crate::users_repository::{UserRepository, UserRepositoryError};

const USER_COLUMNS: &str = "id, name, surname, email, phone_number, password, role";

pub struct PostgresUsersRepository {
    client: Arc<Client>,
}

impl PostgresUsersRepository {
    pub async fn init(client: Arc<Client>) -> anyhow::Result<Self> {
        client
            .batch_execute(
                "
        CREATE TABLE IF NOT EXISTS users (
            id              SERIAL PRIMARY KEY,
            name            TEXT NOT NULL,
            surname         TEXT NOT NULL,
            email           TEXT NOT NULL UNIQUE,
            phone_number    BIGINT NOT NULL,
            password        TEXT NOT NULL,
            role            TEXT NOT NULL
            )
        ",
            )
            .await
            .context("Failed to setup users table")?;
        Ok(Self { client })
    }

    async fn query_users(
        &self,
        query: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> Result<Vec<User>, UserRepositoryError> {
        let stmt: Statement = self.client.prepare(query).await?;
        let rows = self.client.query(&stmt, params).await?;
        rows.iter().map(user_from_row).collect()
    }
}

fn user_from_row(row: &Row) -> Result<User, UserRepositoryError> {
    let role: String = row.try_get(6)?;
    Ok(User {
        user_id: row.try_get(0)?,
        details: UserDetails {
            name: row.try_get(1)?,
            surname: row.try_get(2)?,
            email: row.try_get(3)?,
            phone_number: row.try_get(4)?,
            password: row.try_get(5)?,
            role: role
                .parse::<Role>()
                .map_err(|err| UserRepositoryError::Other(format!("{}", err)))?,
        },
    })
}

fn search_column(field: UserSearchField) -> &'static str {
    match field {
        UserSearchField::Name => "name",
        UserSearchField::Surname => "surname",
        UserSearchField::Email => "email",
    }
}

#[async_trait::async_trait]
impl UserRepository for PostgresUsersRepository {
    async fn add_user(&self, details: UserDetails) -> Result<User, UserRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(
                "INSERT INTO users (name, surname, email, phone_number, password, role) \
                 VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
            )
            .await?;

        let rows = self
            .client
            .query(
                &stmt,
                &[
                    &details.name,
                    &details.surname,
                    &details.email,
                    &details.phone_number,
                    &details.password,
                    &details.role.as_str(),
                ],
            )
            .await;

        match rows {
            Ok(rows) => {
                let user_id: UserId = rows
                    .first()
                    .ok_or_else(|| UserRepositoryError::Other("Id not returned".to_string()))?
                    .try_get(0)?;
                Ok(User { user_id, details })
            }
            Err(err) if is_unique_violation(&err) => {
                Err(UserRepositoryError::EmailTaken(details.email))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn replace_user(&self, user: &User) -> Result<bool, UserRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(
                "UPDATE users SET name = $1, surname = $2, email = $3, phone_number = $4, \
                 password = $5, role = $6 WHERE id = $7",
            )
            .await?;

        let details = &user.details;
        let updated = self
            .client
            .execute(
                &stmt,
                &[
                    &details.name,
                    &details.surname,
                    &details.email,
                    &details.phone_number,
                    &details.password,
                    &details.role.as_str(),
                    &user.user_id,
                ],
            )
            .await;

        match updated {
            Ok(updated) => Ok(updated > 0),
            Err(err) if is_unique_violation(&err) => {
                Err(UserRepositoryError::EmailTaken(details.email.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_user(&self, user_id: UserId) -> Result<Option<User>, UserRepositoryError> {
        let users = self
            .query_users(
                &format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS),
                &[&user_id],
            )
            .await?;
        Ok(users.into_iter().next())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError> {
        let users = self
            .query_users(
                &format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS),
                &[&email],
            )
            .await?;
        Ok(users.into_iter().next())
    }

    async fn list_users(&self) -> Result<Vec<User>, UserRepositoryError> {
        self.query_users(
            &format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS),
            &[],
        )
        .await
    }

    async fn find_users_by_prefix(
        &self,
        field: UserSearchField,
        prefix: &str,
    ) -> Result<Vec<User>, UserRepositoryError> {
        self.query_users(
            &format!(
                "SELECT {} FROM users WHERE {} ILIKE $1 ORDER BY id",
                USER_COLUMNS,
                search_column(field)
            ),
            &[&prefix_pattern(prefix)],
        )
        .await
    }

    async fn exists_by_id(&self, user_id: UserId) -> Result<bool, UserRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .await?;
        let row = self.client.query_one(&stmt, &[&user_id]).await?;
        Ok(row.try_get(0)?)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, UserRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .await?;
        let row = self.client.query_one(&stmt, &[&email]).await?;
        Ok(row.try_get(0)?)
    }

    async fn count_users(&self) -> Result<i64, UserRepositoryError> {
        let stmt: Statement = self.client.prepare("SELECT COUNT(*) FROM users").await?;
        let row = self.client.query_one(&stmt, &[]).await?;
        Ok(row.try_get(0)?)
    }

    async fn delete_user(&self, user_id: UserId) -> Result<bool, UserRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("DELETE FROM users WHERE id = $1")
            .await?;
        Ok(self.client.execute(&stmt, &[&user_id]).await? > 0)
    }
}

#[cfg(test)]
mod tests_postgres_users_repository {
    use serial_test::file_serial;

    use super::*;
    use crate::api::Role;
    use crate::postgres::test_support::start_postgres_container;

    fn user_details(name: &str, email: &str) -> UserDetails {
        UserDetails {
            name: name.to_string(),
            surname: format!("Sur{}", name),
            email: email.to_string(),
            phone_number: 123456789,
            password: "hash".to_string(),
            role: Role::User,
        }
    }

    #[tokio::test]
    #[ignore = "needs a docker daemon for the postgres container"]
    #[file_serial(key, path => "../.pgtestslock")]
    /// Combined into big unit test to avoid duplicate setup
    /// 1. Creates users and rejects a duplicated email
    /// 2. Finds them by id, email and prefixes
    /// 3. Replaces and deletes
    async fn test_user_management() {
        let (_container, client) = start_postgres_container().await;
        let repository = PostgresUsersRepository::init(client)
            .await
            .expect("Failed to init repository");
        assert_eq!(repository.list_users().await.unwrap(), vec![]);

        let user1 = repository
            .add_user(user_details("Name1", "email1@gmail.com"))
            .await
            .unwrap();
        let user2 = repository
            .add_user(user_details("Name2", "emil@gmail.com"))
            .await
            .unwrap();
        assert!(matches!(
            repository
                .add_user(user_details("Name3", "email1@gmail.com"))
                .await,
            Err(UserRepositoryError::EmailTaken(..))
        ));

        assert_eq!(
            repository.find_user(user1.user_id).await.unwrap(),
            Some(user1.clone())
        );
        assert_eq!(
            repository.find_user_by_email("emil@gmail.com").await.unwrap(),
            Some(user2.clone())
        );
        assert_eq!(
            repository
                .find_users_by_prefix(UserSearchField::Email, "EM")
                .await
                .unwrap(),
            vec![user1.clone(), user2.clone()]
        );
        assert_eq!(
            repository
                .find_users_by_prefix(UserSearchField::Name, "name2")
                .await
                .unwrap(),
            vec![user2.clone()]
        );
        assert!(repository.exists_by_id(user1.user_id).await.unwrap());
        assert!(repository.exists_by_email("email1@gmail.com").await.unwrap());
        assert_eq!(repository.count_users().await.unwrap(), 2);

        let updated = User {
            details: UserDetails {
                role: Role::Admin,
                ..user1.details.clone()
            },
            ..user1.clone()
        };
        assert!(repository.replace_user(&updated).await.unwrap());
        assert_eq!(
            repository.find_user(user1.user_id).await.unwrap(),
            Some(updated)
        );

        assert!(repository.delete_user(user1.user_id).await.unwrap());
        assert!(!repository.exists_by_id(user1.user_id).await.unwrap());
    }
}
