use std::sync::Arc;

use anyhow::Context;
use tokio_postgres::{Client, Row, Statement};

use crate::api::{BookId, Specimen, SpecimenDetails, SpecimenId, Status};
use crate::specimens_repository::{SpecimenRepository, SpecimenRepositoryError};

const SPECIMEN_COLUMNS: &str = "id, status, publisher, year_of_publication, isbn, book_id";

pub struct PostgresSpecimensRepository {
    client: Arc<Client>,
}

impl PostgresSpecimensRepository {
    pub async fn init(client: Arc<Client>) -> anyhow::Result<Self> {
        client
            .batch_execute(
                "
        CREATE TABLE IF NOT EXISTS specimens (
            id                      SERIAL PRIMARY KEY,
            status                  TEXT NOT NULL,
            publisher               TEXT NOT NULL,
            year_of_publication     INTEGER NOT NULL,
            isbn                    BIGINT NOT NULL,
            book_id                 INTEGER NOT NULL
            );
        CREATE INDEX IF NOT EXISTS specimens_book_id_status ON specimens (book_id, status);
        ",
            )
            .await
            .context("Failed to setup specimens table")?;
        Ok(Self { client })
    }
}

fn specimen_from_row(row: &Row) -> Result<Specimen, SpecimenRepositoryError> {
    let status: String = row.try_get(1)?;
    Ok(Specimen {
        specimen_id: row.try_get(0)?,
        details: SpecimenDetails {
            status: status
                .parse::<Status>()
                .map_err(|err| SpecimenRepositoryError::Other(format!("{}", err)))?,
            publisher: row.try_get(2)?,
            year_of_publication: row.try_get(3)?,
            isbn: row.try_get(4)?,
            book_id: row.try_get(5)?,
        },
    })
}

#[async_trait::async_trait]
impl SpecimenRepository for PostgresSpecimensRepository {
    async fn add_specimen(
        &self,
        details: SpecimenDetails,
    ) -> Result<Specimen, SpecimenRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(
                "INSERT INTO specimens (status, publisher, year_of_publication, isbn, book_id) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING id",
            )
            .await?;

        let rows = self
            .client
            .query(
                &stmt,
                &[
                    &details.status.as_str(),
                    &details.publisher,
                    &details.year_of_publication,
                    &details.isbn,
                    &details.book_id,
                ],
            )
            .await?;

        let specimen_id: SpecimenId = rows
            .first()
            .ok_or_else(|| SpecimenRepositoryError::Other("Id not returned".to_string()))?
            .try_get(0)?;

        Ok(Specimen {
            specimen_id,
            details,
        })
    }

    async fn replace_specimen(&self, specimen: &Specimen) -> Result<bool, SpecimenRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(
                "UPDATE specimens SET status = $1, publisher = $2, year_of_publication = $3, \
                 isbn = $4, book_id = $5 WHERE id = $6",
            )
            .await?;

        let details = &specimen.details;
        let updated = self
            .client
            .execute(
                &stmt,
                &[
                    &details.status.as_str(),
                    &details.publisher,
                    &details.year_of_publication,
                    &details.isbn,
                    &details.book_id,
                    &specimen.specimen_id,
                ],
            )
            .await?;
        Ok(updated > 0)
    }

    async fn find_specimen(
        &self,
        specimen_id: SpecimenId,
    ) -> Result<Option<Specimen>, SpecimenRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(&format!(
                "SELECT {} FROM specimens WHERE id = $1",
                SPECIMEN_COLUMNS
            ))
            .await?;

        let rows = self.client.query(&stmt, &[&specimen_id]).await?;
        rows.first().map(specimen_from_row).transpose()
    }

    async fn list_specimens_for_book(
        &self,
        book_id: BookId,
        status: Option<Status>,
    ) -> Result<Vec<Specimen>, SpecimenRepositoryError> {
        let rows = match status {
            Some(status) => {
                let stmt: Statement = self
                    .client
                    .prepare(&format!(
                        "SELECT {} FROM specimens WHERE book_id = $1 AND status = $2 ORDER BY id",
                        SPECIMEN_COLUMNS
                    ))
                    .await?;
                self.client
                    .query(&stmt, &[&book_id, &status.as_str()])
                    .await?
            }
            None => {
                let stmt: Statement = self
                    .client
                    .prepare(&format!(
                        "SELECT {} FROM specimens WHERE book_id = $1 ORDER BY id",
                        SPECIMEN_COLUMNS
                    ))
                    .await?;
                self.client.query(&stmt, &[&book_id]).await?
            }
        };
        rows.iter().map(specimen_from_row).collect()
    }

    async fn count_specimens(
        &self,
        book_id: BookId,
        status: Status,
    ) -> Result<i64, SpecimenRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT COUNT(*) FROM specimens WHERE book_id = $1 AND status = $2")
            .await?;
        let row = self
            .client
            .query_one(&stmt, &[&book_id, &status.as_str()])
            .await?;
        Ok(row.try_get(0)?)
    }

    async fn delete_specimen(
        &self,
        specimen_id: SpecimenId,
    ) -> Result<bool, SpecimenRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("DELETE FROM specimens WHERE id = $1")
            .await?;
        Ok(self.client.execute(&stmt, &[&specimen_id]).await? > 0)
    }
}
