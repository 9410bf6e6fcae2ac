pub use in_memory_specimens_repository::InMemorySpecimensRepository;
pub use postgres_specimens_repository::PostgresSpecimensRepository;

use crate::api::{BookId, Specimen, SpecimenDetails, SpecimenId, Status};

mod in_memory_specimens_repository;
mod postgres_specimens_repository;

#[derive(thiserror::Error, Debug)]
pub enum SpecimenRepositoryError {
    #[error("DatabaseFailure failure {0}")]
    DatabaseFailure(#[from] tokio_postgres::Error),

    #[error("Other error {0}")]
    Other(String),
}

#[async_trait::async_trait]
pub trait SpecimenRepository: Send + Sync {
    /// Adds specimen to repository, returns it with the assigned id.
    /// The owning book is not checked here, `SpecimenService` does it
    async fn add_specimen(
        &self,
        details: SpecimenDetails,
    ) -> Result<Specimen, SpecimenRepositoryError>;
    /// Replaces all fields of the specimen with matching id,
    /// returns false if there was no such specimen
    async fn replace_specimen(&self, specimen: &Specimen) -> Result<bool, SpecimenRepositoryError>;
    async fn find_specimen(
        &self,
        specimen_id: SpecimenId,
    ) -> Result<Option<Specimen>, SpecimenRepositoryError>;
    /// Specimens of the book ordered by id, optionally narrowed to one status
    async fn list_specimens_for_book(
        &self,
        book_id: BookId,
        status: Option<Status>,
    ) -> Result<Vec<Specimen>, SpecimenRepositoryError>;
    async fn count_specimens(
        &self,
        book_id: BookId,
        status: Status,
    ) -> Result<i64, SpecimenRepositoryError>;
    /// Returns false if there was nothing to delete
    async fn delete_specimen(&self, specimen_id: SpecimenId)
        -> Result<bool, SpecimenRepositoryError>;
}
