use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::api::{BookId, Specimen, SpecimenDetails, SpecimenId, Status};
use crate::books_repository::{BookRepository, BookRepositoryError};
use crate::specimens_repository::{SpecimenRepository, SpecimenRepositoryError};

const ISBN_13_RANGE: RangeInclusive<i64> = 1_000_000_000_000..=9_999_999_999_999;

#[derive(thiserror::Error, Debug)]
pub enum SpecimenServiceError {
    #[error("Specimen {0} does not exist")]
    SpecimenNotExist(SpecimenId),

    #[error("Book {0} does not exist")]
    BookNotExist(BookId),

    #[error("{0} is not a 13 digit ISBN")]
    InvalidIsbn(i64),

    #[error(transparent)]
    Repository(#[from] SpecimenRepositoryError),

    #[error("Book lookup failed {0}")]
    BookLookup(#[from] BookRepositoryError),
}

/// Physical copies of books and their availability
pub struct SpecimenService {
    specimens_repository: Arc<dyn SpecimenRepository>,
    books_repository: Arc<dyn BookRepository>,
}

impl SpecimenService {
    pub fn new(
        specimens_repository: Arc<dyn SpecimenRepository>,
        books_repository: Arc<dyn BookRepository>,
    ) -> Self {
        Self {
            specimens_repository,
            books_repository,
        }
    }

    pub async fn find_all_for_book(
        &self,
        book_id: BookId,
    ) -> Result<Vec<Specimen>, SpecimenServiceError> {
        Ok(self
            .specimens_repository
            .list_specimens_for_book(book_id, None)
            .await?)
    }

    pub async fn find_all_for_book_by_status(
        &self,
        status: Status,
        book_id: BookId,
    ) -> Result<Vec<Specimen>, SpecimenServiceError> {
        Ok(self
            .specimens_repository
            .list_specimens_for_book(book_id, Some(status))
            .await?)
    }

    pub async fn find_one(&self, specimen_id: SpecimenId) -> Result<Specimen, SpecimenServiceError> {
        self.specimens_repository
            .find_specimen(specimen_id)
            .await?
            .ok_or(SpecimenServiceError::SpecimenNotExist(specimen_id))
    }

    /// Identical copies are allowed. The ISBN format is checked and the
    /// book has to be stored already
    #[tracing::instrument(skip(self, details), fields(book_id = details.book_id))]
    pub async fn save(&self, details: SpecimenDetails) -> Result<Specimen, SpecimenServiceError> {
        if !ISBN_13_RANGE.contains(&details.isbn) {
            return Err(SpecimenServiceError::InvalidIsbn(details.isbn));
        }
        if self.books_repository.find_book(details.book_id).await?.is_none() {
            tracing::warn!("Book {} does not exist", details.book_id);
            return Err(SpecimenServiceError::BookNotExist(details.book_id));
        }
        let specimen = self.specimens_repository.add_specimen(details).await?;
        tracing::info!("Saved specimen {}", specimen.specimen_id);
        Ok(specimen)
    }

    pub async fn change_status_to_available(
        &self,
        specimen_id: SpecimenId,
    ) -> Result<Specimen, SpecimenServiceError> {
        self.change_status(specimen_id, Status::Available).await
    }

    pub async fn change_status_to_rented(
        &self,
        specimen_id: SpecimenId,
    ) -> Result<Specimen, SpecimenServiceError> {
        self.change_status(specimen_id, Status::Rented).await
    }

    pub async fn change_status_to_lost(
        &self,
        specimen_id: SpecimenId,
    ) -> Result<Specimen, SpecimenServiceError> {
        self.change_status(specimen_id, Status::Lost).await
    }

    /// Every status may follow every other one, nothing else of the specimen changes
    #[tracing::instrument(skip(self))]
    async fn change_status(
        &self,
        specimen_id: SpecimenId,
        status: Status,
    ) -> Result<Specimen, SpecimenServiceError> {
        let mut specimen = self.find_one(specimen_id).await?;
        tracing::debug!(
            "Specimen {} goes from {} to {}",
            specimen_id,
            specimen.details.status,
            status
        );
        specimen.details.status = status;
        if !self.specimens_repository.replace_specimen(&specimen).await? {
            return Err(SpecimenServiceError::SpecimenNotExist(specimen_id));
        }
        Ok(specimen)
    }

    /// Number of copies of the book in the given status, e.g. how many are available
    pub async fn count_by_status_and_book(
        &self,
        status: Status,
        book_id: BookId,
    ) -> Result<i64, SpecimenServiceError> {
        Ok(self
            .specimens_repository
            .count_specimens(book_id, status)
            .await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, specimen_id: SpecimenId) -> Result<(), SpecimenServiceError> {
        if !self.specimens_repository.delete_specimen(specimen_id).await? {
            return Err(SpecimenServiceError::SpecimenNotExist(specimen_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod specimen_service_tests {
    use super::*;
    use crate::api::{BookDetails, Category};
    use crate::books_repository::InMemoryBooksRepository;
    use crate::specimens_repository::InMemorySpecimensRepository;

    const BOOK_ID: BookId = 1;

    /// Service with two stored books, `BOOK_ID` and `BOOK_ID + 1`
    async fn specimen_service() -> SpecimenService {
        let books_repository = Arc::new(InMemoryBooksRepository::default());
        for title in ["First", "Second"] {
            books_repository
                .add_book(BookDetails {
                    author: "Author".to_string(),
                    title: title.to_string(),
                    category: Category::Fantasy,
                    year_of_first_publication: 2008,
                    isbn: None,
                })
                .await
                .expect("Failed to add book");
        }
        SpecimenService::new(
            Arc::new(InMemorySpecimensRepository::default()),
            books_repository,
        )
    }

    fn specimen_details(status: Status, isbn: i64) -> SpecimenDetails {
        SpecimenDetails {
            status,
            publisher: "Publisher".to_string(),
            year_of_publication: 2008,
            isbn,
            book_id: BOOK_ID,
        }
    }

    #[tokio::test]
    async fn test_find_all_for_book() {
        let service = specimen_service().await;
        service
            .save(specimen_details(Status::Available, 9788375748758))
            .await
            .unwrap();
        service
            .save(SpecimenDetails {
                book_id: BOOK_ID + 1,
                ..specimen_details(Status::Available, 9788375748758)
            })
            .await
            .unwrap();

        assert_eq!(service.find_all_for_book(BOOK_ID).await.unwrap().len(), 1);
        assert_eq!(service.find_all_for_book(BOOK_ID + 1).await.unwrap().len(), 1);
        assert_eq!(service.find_all_for_book(BOOK_ID + 2).await.unwrap(), vec![]);
    }

    #[tokio::test]
    async fn test_find_all_for_book_by_status() {
        let service = specimen_service().await;
        let rented = service
            .save(specimen_details(Status::Rented, 9788375748758))
            .await
            .unwrap();
        service
            .save(specimen_details(Status::Lost, 9788375748755))
            .await
            .unwrap();

        assert_eq!(
            service
                .find_all_for_book_by_status(Status::Rented, BOOK_ID)
                .await
                .unwrap(),
            vec![rented]
        );
        assert_eq!(
            service
                .find_all_for_book_by_status(Status::Available, BOOK_ID)
                .await
                .unwrap(),
            vec![]
        );
    }

    #[tokio::test]
    async fn test_save_new_specimen_and_find_one() {
        let service = specimen_service().await;
        let saved = service
            .save(specimen_details(Status::Rented, 9788375748758))
            .await
            .unwrap();

        let found = service.find_one(saved.specimen_id).await.unwrap();
        assert_eq!(found.details.status, Status::Rented);
        assert_eq!(found.details.publisher, "Publisher");
        assert_eq!(found.details.year_of_publication, 2008);
    }

    #[tokio::test]
    async fn test_identical_specimens_are_allowed() {
        let service = specimen_service().await;
        let first = service
            .save(specimen_details(Status::Available, 9788375748758))
            .await
            .unwrap();
        let second = service
            .save(specimen_details(Status::Available, 9788375748758))
            .await
            .unwrap();
        assert_ne!(first.specimen_id, second.specimen_id);
        assert_eq!(
            service
                .count_by_status_and_book(Status::Available, BOOK_ID)
                .await
                .unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_save_rejects_malformed_isbn() {
        let service = specimen_service().await;
        for isbn in [0, 978837574875, 97883757487580, -9788375748758] {
            assert!(matches!(
                service.save(specimen_details(Status::Available, isbn)).await,
                Err(SpecimenServiceError::InvalidIsbn(..))
            ));
        }
        assert_eq!(service.find_all_for_book(BOOK_ID).await.unwrap(), vec![]);
    }

    #[tokio::test]
    async fn test_save_rejects_specimen_of_missing_book() {
        let service = specimen_service().await;
        let missing_book_id = 424242;

        let result = service
            .save(SpecimenDetails {
                book_id: missing_book_id,
                ..specimen_details(Status::Available, 9788375748758)
            })
            .await;
        assert!(matches!(
            result,
            Err(SpecimenServiceError::BookNotExist(book_id)) if book_id == missing_book_id
        ));
        assert_eq!(
            service
                .count_by_status_and_book(Status::Available, missing_book_id)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_change_status_keeps_other_fields() {
        let service = specimen_service().await;
        let saved = service
            .save(specimen_details(Status::Rented, 9788375748758))
            .await
            .unwrap();

        let available = service
            .change_status_to_available(saved.specimen_id)
            .await
            .unwrap();
        assert_eq!(available.details.status, Status::Available);
        assert_eq!(
            service.find_one(saved.specimen_id).await.unwrap(),
            Specimen {
                details: SpecimenDetails {
                    status: Status::Available,
                    ..saved.details.clone()
                },
                ..saved.clone()
            }
        );

        let rented = service
            .change_status_to_rented(saved.specimen_id)
            .await
            .unwrap();
        assert_eq!(rented.details.status, Status::Rented);
        assert_eq!(rented.details.publisher, "Publisher");

        let lost = service.change_status_to_lost(saved.specimen_id).await.unwrap();
        assert_eq!(lost.details.status, Status::Lost);
        assert_eq!(lost.details.year_of_publication, 2008);

        // no transition is forbidden, a lost copy can be rented right away
        let rented_again = service
            .change_status_to_rented(saved.specimen_id)
            .await
            .unwrap();
        assert_eq!(rented_again.details.status, Status::Rented);
    }

    #[tokio::test]
    async fn test_change_status_of_missing_specimen_fails() {
        let service = specimen_service().await;
        assert!(matches!(
            service.change_status_to_lost(7).await,
            Err(SpecimenServiceError::SpecimenNotExist(7))
        ));
    }

    #[tokio::test]
    async fn test_count_by_status_and_book() {
        let service = specimen_service().await;
        let specimens = [
            (Status::Lost, 9788375748758),
            (Status::Lost, 9788375748755),
            (Status::Rented, 9788375748754),
            (Status::Rented, 9788375748753),
            (Status::Rented, 9788375748752),
            (Status::Available, 9788375748751),
        ];
        for (status, isbn) in specimens {
            service.save(specimen_details(status, isbn)).await.unwrap();
        }
        service
            .save(SpecimenDetails {
                book_id: BOOK_ID + 1,
                ..specimen_details(Status::Available, 9788375748750)
            })
            .await
            .unwrap();

        for (status, expected) in [
            (Status::Available, 1),
            (Status::Rented, 3),
            (Status::Lost, 2),
        ] {
            assert_eq!(
                service
                    .count_by_status_and_book(status, BOOK_ID)
                    .await
                    .unwrap(),
                expected,
                "count of {} specimens",
                status
            );
        }
    }

    #[tokio::test]
    async fn test_delete_specimen() {
        let service = specimen_service().await;
        let saved = service
            .save(specimen_details(Status::Available, 9788375748758))
            .await
            .unwrap();

        service.delete(saved.specimen_id).await.unwrap();
        assert_eq!(service.find_all_for_book(BOOK_ID).await.unwrap(), vec![]);

        assert!(matches!(
            service.delete(saved.specimen_id).await,
            Err(SpecimenServiceError::SpecimenNotExist(..))
        ));
    }

    #[tokio::test]
    async fn test_find_one_of_missing_specimen_fails() {
        let service = specimen_service().await;
        assert!(matches!(
            service.find_one(1).await,
            Err(SpecimenServiceError::SpecimenNotExist(1))
        ));
    }
}
