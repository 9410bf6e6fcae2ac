pub use in_memory_books_repository::InMemoryBooksRepository;
pub use postgres_books_repository::PostgresBooksRepository;

use crate::api::{Book, BookDetails, BookId, BookSearchField};

mod in_memory_books_repository;
mod postgres_books_repository;

#[derive(thiserror::Error, Debug)]
pub enum BookRepositoryError {
    #[error("Book titled {0} already stored")]
    TitleTaken(String),

    #[error("DatabaseFailure failure {0}")]
    DatabaseFailure(#[from] tokio_postgres::Error),

    #[error("Other error {0}")]
    Other(String),
}

#[async_trait::async_trait]
pub trait BookRepository: Send + Sync {
    /// Adds book to repository, returns the stored book with its assigned id.
    /// Fails with `TitleTaken` if a book with the same title is already stored
    async fn add_book(&self, details: BookDetails) -> Result<Book, BookRepositoryError>;
    /// Replaces all fields of the book with matching id,
    /// returns false if there was no such book
    async fn replace_book(&self, book: &Book) -> Result<bool, BookRepositoryError>;
    async fn find_book(&self, book_id: BookId) -> Result<Option<Book>, BookRepositoryError>;
    /// Exact, case-sensitive title lookup
    async fn find_book_by_title(&self, title: &str) -> Result<Option<Book>, BookRepositoryError>;
    /// Lists all books ordered by id
    async fn list_books(&self) -> Result<Vec<Book>, BookRepositoryError>;
    /// Books whose `field` starts with `prefix`, ignoring case
    async fn find_books_by_prefix(
        &self,
        field: BookSearchField,
        prefix: &str,
    ) -> Result<Vec<Book>, BookRepositoryError>;
    async fn exists_by_title(&self, title: &str) -> Result<bool, BookRepositoryError>;
    async fn count_books(&self) -> Result<i64, BookRepositoryError>;
    /// Returns false if there was nothing to delete
    async fn delete_book(&self, book_id: BookId) -> Result<bool, BookRepositoryError>;
}
