use std::sync::Arc;

use anyhow::Context;
use tokio_postgres::{Client, Row, Statement};

use crate::api::{Book, BookDetails, BookId, BookSearchField, Category};
use crate::books_repository::BookRepositoryError::Other;
use crate::books_repository::{BookRepository, BookRepositoryError};
use crate::postgres::{is_unique_violation, prefix_pattern};

const BOOK_COLUMNS: &str = "id, author, title, category, year_of_first_publication, isbn";

pub struct PostgresBooksRepository {
    client: Arc<Client>,
}

impl PostgresBooksRepository {
    pub async fn init(client: Arc<Client>) -> anyhow::Result<Self> {
        client
            .batch_execute(
                "
        CREATE TABLE IF NOT EXISTS books (
            id                          SERIAL PRIMARY KEY,
            author                      TEXT NOT NULL,
            title                       TEXT NOT NULL UNIQUE,
            category                    TEXT NOT NULL,
            year_of_first_publication   INTEGER NOT NULL,
            isbn                        TEXT
            )
        ",
            )
            .await
            .context("Failed to setup books table")?;
        Ok(Self { client })
    }

    async fn query_books(
        &self,
        stmt: &Statement,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> Result<Vec<Book>, BookRepositoryError> {
        let rows = self.client.query(stmt, params).await?;
        rows.iter().map(book_from_row).collect()
    }
}

fn book_from_row(row: &Row) -> Result<Book, BookRepositoryError> {
    let category: String = row.try_get(3)?;
    Ok(Book {
        book_id: row.try_get(0)?,
        details: BookDetails {
            author: row.try_get(1)?,
            title: row.try_get(2)?,
            category: category
                .parse::<Category>()
                .map_err(|err| Other(format!("{}", err)))?,
            year_of_first_publication: row.try_get(4)?,
            isbn: row.try_get(5)?,
        },
    })
}

fn search_column(field: BookSearchField) -> &'static str {
    match field {
        BookSearchField::Title => "title",
        BookSearchField::Author => "author",
        BookSearchField::Category => "category",
    }
}

#[async_trait::async_trait]
impl BookRepository for PostgresBooksRepository {
    async fn add_book(&self, details: BookDetails) -> Result<Book, BookRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(
                "INSERT INTO books (author, title, category, year_of_first_publication, isbn) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING id",
            )
            .await?;

        let rows = self
            .client
            .query(
                &stmt,
                &[
                    &details.author,
                    &details.title,
                    &details.category.as_str(),
                    &details.year_of_first_publication,
                    &details.isbn,
                ],
            )
            .await;

        match rows {
            Ok(rows) => {
                let book_id: BookId = rows
                    .first()
                    .ok_or_else(|| Other("Id not returned".to_string()))?
                    .try_get(0)?;
                Ok(Book { book_id, details })
            }
            Err(err) if is_unique_violation(&err) => {
                Err(BookRepositoryError::TitleTaken(details.title))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn replace_book(&self, book: &Book) -> Result<bool, BookRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(
                "UPDATE books SET author = $1, title = $2, category = $3, \
                 year_of_first_publication = $4, isbn = $5 WHERE id = $6 RETURNING id",
            )
            .await?;

        let details = &book.details;
        let rows = self
            .client
            .query(
                &stmt,
                &[
                    &details.author,
                    &details.title,
                    &details.category.as_str(),
                    &details.year_of_first_publication,
                    &details.isbn,
                    &book.book_id,
                ],
            )
            .await;

        match rows {
            Ok(rows) => Ok(!rows.is_empty()),
            Err(err) if is_unique_violation(&err) => {
                Err(BookRepositoryError::TitleTaken(details.title.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_book(&self, book_id: BookId) -> Result<Option<Book>, BookRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(&format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS))
            .await?;

        let rows = self.client.query(&stmt, &[&book_id]).await?;
        rows.first().map(book_from_row).transpose()
    }

    async fn find_book_by_title(&self, title: &str) -> Result<Option<Book>, BookRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(&format!("SELECT {} FROM books WHERE title = $1", BOOK_COLUMNS))
            .await?;

        let rows = self.client.query(&stmt, &[&title]).await?;
        rows.first().map(book_from_row).transpose()
    }

    async fn list_books(&self) -> Result<Vec<Book>, BookRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(&format!("SELECT {} FROM books ORDER BY id", BOOK_COLUMNS))
            .await?;
        self.query_books(&stmt, &[]).await
    }

    async fn find_books_by_prefix(
        &self,
        field: BookSearchField,
        prefix: &str,
    ) -> Result<Vec<Book>, BookRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(&format!(
                "SELECT {} FROM books WHERE {} ILIKE $1 ORDER BY id",
                BOOK_COLUMNS,
                search_column(field)
            ))
            .await?;
        self.query_books(&stmt, &[&prefix_pattern(prefix)]).await
    }

    async fn exists_by_title(&self, title: &str) -> Result<bool, BookRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT EXISTS (SELECT 1 FROM books WHERE title = $1)")
            .await?;
        let row = self.client.query_one(&stmt, &[&title]).await?;
        Ok(row.try_get(0)?)
    }

    async fn count_books(&self) -> Result<i64, BookRepositoryError> {
        let stmt: Statement = self.client.prepare("SELECT COUNT(*) FROM books").await?;
        let row = self.client.query_one(&stmt, &[]).await?;
        Ok(row.try_get(0)?)
    }

    async fn delete_book(&self, book_id: BookId) -> Result<bool, BookRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("DELETE FROM books WHERE id = $1")
            .await?;
        Ok(self.client.execute(&stmt, &[&book_id]).await? > 0)
    }
}
