use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::api::{starts_with_ignore_case, Book, BookDetails, BookId, BookSearchField};
use crate::books_repository::{BookRepository, BookRepositoryError};

#[derive(Default)]
pub struct InMemoryBooksRepository {
    book_sequence_generator: AtomicI32,
    books: parking_lot::RwLock<BTreeMap<BookId, BookDetails>>,
}

fn title_taken_by_other(
    books: &BTreeMap<BookId, BookDetails>,
    title: &str,
    except: Option<BookId>,
) -> bool {
    books
        .iter()
        .any(|(&book_id, details)| details.title == title && Some(book_id) != except)
}

#[async_trait::async_trait]
impl BookRepository for InMemoryBooksRepository {
    async fn add_book(&self, details: BookDetails) -> Result<Book, BookRepositoryError> {
        let mut locked_books = self.books.write();
        if title_taken_by_other(&locked_books, &details.title, None) {
            return Err(BookRepositoryError::TitleTaken(details.title));
        }
        let book_id = self.book_sequence_generator.fetch_add(1, Ordering::Relaxed) + 1;
        locked_books.insert(book_id, details.clone());
        Ok(Book { book_id, details })
    }

    async fn replace_book(&self, book: &Book) -> Result<bool, BookRepositoryError> {
        let mut locked_books = self.books.write();
        if title_taken_by_other(&locked_books, &book.details.title, Some(book.book_id)) {
            return Err(BookRepositoryError::TitleTaken(book.details.title.clone()));
        }
        if let Some(details) = locked_books.get_mut(&book.book_id) {
            *details = book.details.clone();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn find_book(&self, book_id: BookId) -> Result<Option<Book>, BookRepositoryError> {
        Ok(self.books.read().get(&book_id).map(|details| Book {
            book_id,
            details: details.clone(),
        }))
    }

    async fn find_book_by_title(&self, title: &str) -> Result<Option<Book>, BookRepositoryError> {
        Ok(self
            .books
            .read()
            .iter()
            .find(|(_, details)| details.title == title)
            .map(|(&book_id, details)| Book {
                book_id,
                details: details.clone(),
            }))
    }

    async fn list_books(&self) -> Result<Vec<Book>, BookRepositoryError> {
        Ok(self
            .books
            .read()
            .iter()
            .map(|(&book_id, details)| Book {
                book_id,
                details: details.clone(),
            })
            .collect())
    }

    async fn find_books_by_prefix(
        &self,
        field: BookSearchField,
        prefix: &str,
    ) -> Result<Vec<Book>, BookRepositoryError> {
        Ok(self
            .books
            .read()
            .iter()
            .filter(|(_, details)| {
                let value = match field {
                    BookSearchField::Title => details.title.as_str(),
                    BookSearchField::Author => details.author.as_str(),
                    BookSearchField::Category => details.category.as_str(),
                };
                starts_with_ignore_case(value, prefix)
            })
            .map(|(&book_id, details)| Book {
                book_id,
                details: details.clone(),
            })
            .collect())
    }

    async fn exists_by_title(&self, title: &str) -> Result<bool, BookRepositoryError> {
        Ok(title_taken_by_other(&self.books.read(), title, None))
    }

    async fn count_books(&self) -> Result<i64, BookRepositoryError> {
        Ok(self.books.read().len() as i64)
    }

    async fn delete_book(&self, book_id: BookId) -> Result<bool, BookRepositoryError> {
        Ok(self.books.write().remove(&book_id).is_some())
    }
}

#[cfg(test)]
mod in_memory_books_repository_tests {
    use crate::api::{BookDetails, BookSearchField, Category};
    use crate::books_repository::{BookRepository, BookRepositoryError, InMemoryBooksRepository};

    fn book_details(title: &str, author: &str, category: Category) -> BookDetails {
        BookDetails {
            author: author.to_string(),
            title: title.to_string(),
            category,
            year_of_first_publication: 2008,
            isbn: None,
        }
    }

    #[tokio::test]
    /// Adds a book, reads it back by id and by title, then deletes it
    async fn test_add_book_and_get_it() {
        let repo = InMemoryBooksRepository::default();

        let not_existing_book_id = 20000;
        assert_eq!(repo.find_book(not_existing_book_id).await.unwrap(), None);

        let details = book_details("Title", "Author", Category::Fantasy);
        let book = repo
            .add_book(details.clone())
            .await
            .expect("Failed to add book");
        assert_eq!(book.details, details);

        assert_eq!(repo.find_book(book.book_id).await.unwrap(), Some(book.clone()));
        assert_eq!(
            repo.find_book_by_title("Title").await.unwrap(),
            Some(book.clone())
        );
        assert_eq!(repo.find_book_by_title("title").await.unwrap(), None);
        assert!(repo.exists_by_title("Title").await.unwrap());
        assert_eq!(repo.count_books().await.unwrap(), 1);

        assert!(repo.delete_book(book.book_id).await.unwrap());
        assert!(!repo.delete_book(book.book_id).await.unwrap());
        assert_eq!(repo.count_books().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_title_uniqueness_is_enforced_by_repository() {
        let repo = InMemoryBooksRepository::default();
        let first = repo
            .add_book(book_details("Title", "Author", Category::Fantasy))
            .await
            .unwrap();
        let second = repo
            .add_book(book_details("Other", "Author", Category::Fantasy))
            .await
            .unwrap();

        let duplicate = repo
            .add_book(book_details("Title", "Someone else", Category::Crime))
            .await;
        assert!(matches!(duplicate, Err(BookRepositoryError::TitleTaken(..))));

        let renamed_onto_first = crate::api::Book {
            book_id: second.book_id,
            details: book_details("Title", "Author", Category::Fantasy),
        };
        let replace_result = repo.replace_book(&renamed_onto_first).await;
        assert!(matches!(
            replace_result,
            Err(BookRepositoryError::TitleTaken(..))
        ));

        // replacing a book with its own title is fine
        let same_title = crate::api::Book {
            book_id: first.book_id,
            details: book_details("Title", "New author", Category::Horror),
        };
        assert!(repo.replace_book(&same_title).await.unwrap());
        assert_eq!(
            repo.find_book(first.book_id).await.unwrap(),
            Some(same_title)
        );
    }

    #[tokio::test]
    async fn test_list_and_prefix_search() {
        let repo = InMemoryBooksRepository::default();
        assert_eq!(repo.list_books().await.unwrap(), vec![]);

        let hobbit = repo
            .add_book(book_details("The Hobbit", "Tolkien", Category::Fantasy))
            .await
            .unwrap();
        let dune = repo
            .add_book(book_details("Dune", "Herbert", Category::ScienceFiction))
            .await
            .unwrap();
        let silmarillion = repo
            .add_book(book_details("The Silmarillion", "Tolkien", Category::Fantasy))
            .await
            .unwrap();

        assert_eq!(
            repo.list_books().await.unwrap(),
            vec![hobbit.clone(), dune.clone(), silmarillion.clone()]
        );
        assert_eq!(
            repo.find_books_by_prefix(BookSearchField::Title, "the ")
                .await
                .unwrap(),
            vec![hobbit.clone(), silmarillion.clone()]
        );
        assert_eq!(
            repo.find_books_by_prefix(BookSearchField::Author, "HERB")
                .await
                .unwrap(),
            vec![dune.clone()]
        );
        assert_eq!(
            repo.find_books_by_prefix(BookSearchField::Category, "science")
                .await
                .unwrap(),
            vec![dune]
        );
        assert_eq!(
            repo.find_books_by_prefix(BookSearchField::Title, "x")
                .await
                .unwrap(),
            vec![]
        );
    }
}
