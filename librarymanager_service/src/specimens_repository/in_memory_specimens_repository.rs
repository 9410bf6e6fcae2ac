use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::api::{BookId, Specimen, SpecimenDetails, SpecimenId, Status};
use crate::specimens_repository::{SpecimenRepository, SpecimenRepositoryError};

#[derive(Default)]
pub struct InMemorySpecimensRepository {
    specimen_sequence_generator: AtomicI32,
    specimens: parking_lot::RwLock<BTreeMap<SpecimenId, SpecimenDetails>>,
}

fn belongs_to(details: &SpecimenDetails, book_id: BookId, status: Option<Status>) -> bool {
    details.book_id == book_id && status.map_or(true, |status| details.status == status)
}

#[async_trait::async_trait]
impl SpecimenRepository for InMemorySpecimensRepository {
    async fn add_specimen(
        &self,
        details: SpecimenDetails,
    ) -> Result<Specimen, SpecimenRepositoryError> {
        let specimen_id = self
            .specimen_sequence_generator
            .fetch_add(1, Ordering::Relaxed)
            + 1;
        self.specimens.write().insert(specimen_id, details.clone());
        Ok(Specimen {
            specimen_id,
            details,
        })
    }

    async fn replace_specimen(&self, specimen: &Specimen) -> Result<bool, SpecimenRepositoryError> {
        let mut locked_specimens = self.specimens.write();
        if let Some(details) = locked_specimens.get_mut(&specimen.specimen_id) {
            *details = specimen.details.clone();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn find_specimen(
        &self,
        specimen_id: SpecimenId,
    ) -> Result<Option<Specimen>, SpecimenRepositoryError> {
        Ok(self
            .specimens
            .read()
            .get(&specimen_id)
            .map(|details| Specimen {
                specimen_id,
                details: details.clone(),
            }))
    }

    async fn list_specimens_for_book(
        &self,
        book_id: BookId,
        status: Option<Status>,
    ) -> Result<Vec<Specimen>, SpecimenRepositoryError> {
        Ok(self
            .specimens
            .read()
            .iter()
            .filter(|(_, details)| belongs_to(details, book_id, status))
            .map(|(&specimen_id, details)| Specimen {
                specimen_id,
                details: details.clone(),
            })
            .collect())
    }

    async fn count_specimens(
        &self,
        book_id: BookId,
        status: Status,
    ) -> Result<i64, SpecimenRepositoryError> {
        Ok(self
            .specimens
            .read()
            .values()
            .filter(|details| belongs_to(details, book_id, Some(status)))
            .count() as i64)
    }

    async fn delete_specimen(
        &self,
        specimen_id: SpecimenId,
    ) -> Result<bool, SpecimenRepositoryError> {
        Ok(self.specimens.write().remove(&specimen_id).is_some())
    }
}

#[cfg(test)]
mod in_memory_specimens_repository_tests {
    use super::*;

    fn specimen_details(status: Status, book_id: BookId, isbn: i64) -> SpecimenDetails {
        SpecimenDetails {
            status,
            publisher: "Publisher".to_string(),
            year_of_publication: 2008,
            isbn,
            book_id,
        }
    }

    #[tokio::test]
    /// 1. Adds specimens for two books
    /// 2. Lists them per book, with and without status
    /// 3. Replaces one and deletes another
    async fn test_specimen_management() {
        let repository = InMemorySpecimensRepository::default();
        assert_eq!(repository.find_specimen(1).await.unwrap(), None);

        let rented = repository
            .add_specimen(specimen_details(Status::Rented, 1, 9788375748758))
            .await
            .unwrap();
        let available = repository
            .add_specimen(specimen_details(Status::Available, 1, 9788375748751))
            .await
            .unwrap();
        let other_book = repository
            .add_specimen(specimen_details(Status::Available, 2, 9788375748752))
            .await
            .unwrap();

        assert_eq!(
            repository.list_specimens_for_book(1, None).await.unwrap(),
            vec![rented.clone(), available.clone()]
        );
        assert_eq!(
            repository
                .list_specimens_for_book(1, Some(Status::Available))
                .await
                .unwrap(),
            vec![available.clone()]
        );
        assert_eq!(
            repository.count_specimens(2, Status::Available).await.unwrap(),
            1
        );
        assert_eq!(repository.count_specimens(2, Status::Lost).await.unwrap(), 0);

        let lost = Specimen {
            details: SpecimenDetails {
                status: Status::Lost,
                ..rented.details.clone()
            },
            ..rented.clone()
        };
        assert!(repository.replace_specimen(&lost).await.unwrap());
        assert_eq!(
            repository.find_specimen(rented.specimen_id).await.unwrap(),
            Some(lost)
        );

        let never_stored = Specimen {
            specimen_id: 1000,
            ..other_book.clone()
        };
        assert!(!repository.replace_specimen(&never_stored).await.unwrap());

        assert!(repository
            .delete_specimen(other_book.specimen_id)
            .await
            .unwrap());
        assert!(!repository
            .delete_specimen(other_book.specimen_id)
            .await
            .unwrap());
        assert_eq!(
            repository.list_specimens_for_book(2, None).await.unwrap(),
            vec![]
        );
    }
}
