use std::sync::Arc;

use crate::api::{Book, BookDetails, BookId, BookSearchField};
use crate::books_repository::{BookRepository, BookRepositoryError};

#[derive(thiserror::Error, Debug)]
pub enum BookServiceError {
    #[error("Book titled {0} already exists")]
    AlreadyExists(String),

    #[error("Book {0} does not exist")]
    NotExist(String),

    #[error(transparent)]
    Repository(BookRepositoryError),
}

impl From<BookRepositoryError> for BookServiceError {
    fn from(err: BookRepositoryError) -> Self {
        match err {
            BookRepositoryError::TitleTaken(title) => BookServiceError::AlreadyExists(title),
            other => BookServiceError::Repository(other),
        }
    }
}

/// Books with globally unique titles
pub struct BookService {
    books_repository: Arc<dyn BookRepository>,
}

impl BookService {
    pub fn new(books_repository: Arc<dyn BookRepository>) -> Self {
        Self { books_repository }
    }

    pub async fn find_all(&self) -> Result<Vec<Book>, BookServiceError> {
        Ok(self.books_repository.list_books().await?)
    }

    pub async fn find_all_paged(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Book>, BookServiceError> {
        Ok(self
            .books_repository
            .list_books()
            .await?
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    pub async fn find_by_title_prefix(&self, title: &str) -> Result<Vec<Book>, BookServiceError> {
        self.find_by_prefix(BookSearchField::Title, title).await
    }

    pub async fn find_by_author_prefix(&self, author: &str) -> Result<Vec<Book>, BookServiceError> {
        self.find_by_prefix(BookSearchField::Author, author).await
    }

    pub async fn find_by_category_prefix(
        &self,
        category: &str,
    ) -> Result<Vec<Book>, BookServiceError> {
        self.find_by_prefix(BookSearchField::Category, category).await
    }

    /// Category names are stored as e.g. `SCIENCE_FICTION`, so a space in a
    /// category prefix stands for the underscore
    pub async fn find_by_prefix(
        &self,
        field: BookSearchField,
        prefix: &str,
    ) -> Result<Vec<Book>, BookServiceError> {
        let prefix = match field {
            BookSearchField::Category => prefix.replace(' ', "_"),
            BookSearchField::Title | BookSearchField::Author => prefix.to_string(),
        };
        Ok(self
            .books_repository
            .find_books_by_prefix(field, &prefix)
            .await?)
    }

    /// Fails with `NotExist` also when the title of the fetched book
    /// cannot be found anymore
    #[tracing::instrument(skip(self))]
    pub async fn find_one(&self, book_id: BookId) -> Result<Book, BookServiceError> {
        let book = self
            .books_repository
            .find_book(book_id)
            .await?
            .ok_or_else(|| BookServiceError::NotExist(book_id.to_string()))?;
        if !self
            .books_repository
            .exists_by_title(&book.details.title)
            .await?
        {
            return Err(BookServiceError::NotExist(book.details.title));
        }
        Ok(book)
    }

    #[tracing::instrument(skip(self, details), fields(title = %details.title))]
    pub async fn save(&self, details: BookDetails) -> Result<Book, BookServiceError> {
        if self.books_repository.exists_by_title(&details.title).await? {
            tracing::warn!("Book titled {} already exists", details.title);
            return Err(BookServiceError::AlreadyExists(details.title));
        }
        let book = self.books_repository.add_book(details).await?;
        tracing::info!("Saved book {}", book.book_id);
        Ok(book)
    }

    /// Overwrites the book with the same title. The title is the lookup key,
    /// so a book cannot be renamed this way
    #[tracing::instrument(skip(self, details), fields(title = %details.title))]
    pub async fn update(&self, details: BookDetails) -> Result<Book, BookServiceError> {
        let existing = self
            .books_repository
            .find_book_by_title(&details.title)
            .await?
            .ok_or_else(|| BookServiceError::NotExist(details.title.clone()))?;

        let updated = Book {
            book_id: existing.book_id,
            details,
        };
        if !self.books_repository.replace_book(&updated).await? {
            return Err(BookServiceError::NotExist(updated.details.title));
        }
        Ok(updated)
    }

    #[tracing::instrument(skip(self, book), fields(book_id = book.book_id))]
    pub async fn delete(&self, book: &Book) -> Result<(), BookServiceError> {
        if !self
            .books_repository
            .exists_by_title(&book.details.title)
            .await?
        {
            return Err(BookServiceError::NotExist(book.details.title.clone()));
        }
        self.books_repository.delete_book(book.book_id).await?;
        Ok(())
    }

    pub async fn exists(&self, title: &str) -> Result<bool, BookServiceError> {
        Ok(self.books_repository.exists_by_title(title).await?)
    }

    pub async fn count(&self) -> Result<i64, BookServiceError> {
        Ok(self.books_repository.count_books().await?)
    }
}
