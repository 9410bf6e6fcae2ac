use actix_web::http::header::LOCATION;
use actix_web::web::Data;
use actix_web::Error;
use actix_web::HttpResponse;
use paperclip::actix::{
    api_v2_operation,
    web::{self},
};

use crate::api::{
    BookDetails, BookId, BookSearchQuery, BookTitleQuery, PageQuery, SpecimenCountQuery,
    SpecimenDetails, SpecimenId, SpecimenStatusFilter, User, UserDetails, UserEmailQuery, UserId,
    UserSearchQuery,
};
use crate::book_service::{BookService, BookServiceError};
use crate::specimen_service::{SpecimenService, SpecimenServiceError};
use crate::user_service::{UserService, UserServiceError};

fn book_error_response(operation: &str, err: BookServiceError) -> HttpResponse {
    match err {
        BookServiceError::NotExist(_) => HttpResponse::NotFound().json(err.to_string()),
        BookServiceError::AlreadyExists(_) => HttpResponse::Conflict().json(err.to_string()),
        BookServiceError::Repository(_) => {
            tracing::error!("{} failed {}", operation, err);
            HttpResponse::InternalServerError().finish()
        }
    }
}

fn specimen_error_response(operation: &str, err: SpecimenServiceError) -> HttpResponse {
    match err {
        SpecimenServiceError::SpecimenNotExist(_) | SpecimenServiceError::BookNotExist(_) => {
            HttpResponse::NotFound().json(err.to_string())
        }
        SpecimenServiceError::InvalidIsbn(_) => HttpResponse::BadRequest().json(err.to_string()),
        SpecimenServiceError::Repository(_) | SpecimenServiceError::BookLookup(_) => {
            tracing::error!("{} failed {}", operation, err);
            HttpResponse::InternalServerError().finish()
        }
    }
}

fn user_error_response(operation: &str, err: UserServiceError) -> HttpResponse {
    match err {
        UserServiceError::NotExist(_) => HttpResponse::NotFound().json(err.to_string()),
        UserServiceError::AlreadyExists(_) => HttpResponse::Conflict().json(err.to_string()),
        UserServiceError::PasswordHashing(_) | UserServiceError::Repository(_) => {
            tracing::error!("{} failed {}", operation, err);
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[api_v2_operation]
pub async fn health() -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().finish())
}

#[api_v2_operation]
pub async fn get_all_books(book_service: Data<BookService>) -> Result<HttpResponse, Error> {
    Ok(match book_service.find_all().await {
        Ok(books) => HttpResponse::Ok().json(books),
        Err(err) => book_error_response("Get all books", err),
    })
}

#[api_v2_operation]
pub async fn search_books(
    book_service: Data<BookService>,
    query: web::Query<BookSearchQuery>,
) -> Result<HttpResponse, Error> {
    let query = query.into_inner();
    Ok(
        match book_service.find_by_prefix(query.by, &query.prefix).await {
            Ok(books) => HttpResponse::Ok().json(books),
            Err(err) => book_error_response("Search books", err),
        },
    )
}

#[api_v2_operation]
pub async fn count_books(book_service: Data<BookService>) -> Result<HttpResponse, Error> {
    Ok(match book_service.count().await {
        Ok(count) => HttpResponse::Ok().json(count),
        Err(err) => book_error_response("Count books", err),
    })
}

#[api_v2_operation]
pub async fn book_exists(
    book_service: Data<BookService>,
    query: web::Query<BookTitleQuery>,
) -> Result<HttpResponse, Error> {
    Ok(match book_service.exists(&query.title).await {
        Ok(exists) => HttpResponse::Ok().json(exists),
        Err(err) => book_error_response("Check book existence", err),
    })
}

#[api_v2_operation]
pub async fn add_book(
    book_service: Data<BookService>,
    details: web::Json<BookDetails>,
) -> Result<HttpResponse, Error> {
    Ok(match book_service.save(details.into_inner()).await {
        Ok(book) => HttpResponse::Created()
            .append_header((LOCATION, format!("/api/book/{}", book.book_id)))
            .json(book),
        Err(err) => book_error_response("Add book", err),
    })
}

#[api_v2_operation]
pub async fn update_book(
    book_service: Data<BookService>,
    details: web::Json<BookDetails>,
) -> Result<HttpResponse, Error> {
    Ok(match book_service.update(details.into_inner()).await {
        Ok(book) => HttpResponse::Ok().json(book),
        Err(err) => book_error_response("Update book", err),
    })
}

#[api_v2_operation]
pub async fn get_book(
    book_service: Data<BookService>,
    book_id: web::Path<BookId>,
) -> Result<HttpResponse, Error> {
    Ok(match book_service.find_one(book_id.into_inner()).await {
        Ok(book) => HttpResponse::Ok().json(book),
        Err(err) => book_error_response("Get book", err),
    })
}

#[api_v2_operation]
pub async fn delete_book(
    book_service: Data<BookService>,
    book_id: web::Path<BookId>,
) -> Result<HttpResponse, Error> {
    let result = match book_service.find_one(book_id.into_inner()).await {
        Ok(book) => book_service.delete(&book).await,
        Err(err) => Err(err),
    };
    Ok(match result {
        Ok(()) => HttpResponse::Ok().finish(),
        Err(err) => book_error_response("Delete book", err),
    })
}

#[api_v2_operation]
pub async fn get_specimens_for_book(
    specimen_service: Data<SpecimenService>,
    book_id: web::Path<BookId>,
    filter: web::Query<SpecimenStatusFilter>,
) -> Result<HttpResponse, Error> {
    let book_id = book_id.into_inner();
    let specimens = match filter.status {
        Some(status) => {
            specimen_service
                .find_all_for_book_by_status(status, book_id)
                .await
        }
        None => specimen_service.find_all_for_book(book_id).await,
    };
    Ok(match specimens {
        Ok(specimens) => HttpResponse::Ok().json(specimens),
        Err(err) => specimen_error_response("Get specimens", err),
    })
}

#[api_v2_operation]
pub async fn count_specimens_for_book(
    specimen_service: Data<SpecimenService>,
    book_id: web::Path<BookId>,
    query: web::Query<SpecimenCountQuery>,
) -> Result<HttpResponse, Error> {
    Ok(
        match specimen_service
            .count_by_status_and_book(query.status, book_id.into_inner())
            .await
        {
            Ok(count) => HttpResponse::Ok().json(count),
            Err(err) => specimen_error_response("Count specimens", err),
        },
    )
}

#[api_v2_operation]
pub async fn add_specimen(
    specimen_service: Data<SpecimenService>,
    details: web::Json<SpecimenDetails>,
) -> Result<HttpResponse, Error> {
    Ok(match specimen_service.save(details.into_inner()).await {
        Ok(specimen) => HttpResponse::Created()
            .append_header((
                LOCATION,
                format!("/api/specimen/{}", specimen.specimen_id),
            ))
            .json(specimen),
        Err(err) => specimen_error_response("Add specimen", err),
    })
}

#[api_v2_operation]
pub async fn get_specimen(
    specimen_service: Data<SpecimenService>,
    specimen_id: web::Path<SpecimenId>,
) -> Result<HttpResponse, Error> {
    Ok(
        match specimen_service.find_one(specimen_id.into_inner()).await {
            Ok(specimen) => HttpResponse::Ok().json(specimen),
            Err(err) => specimen_error_response("Get specimen", err),
        },
    )
}

#[api_v2_operation]
pub async fn delete_specimen(
    specimen_service: Data<SpecimenService>,
    specimen_id: web::Path<SpecimenId>,
) -> Result<HttpResponse, Error> {
    Ok(
        match specimen_service.delete(specimen_id.into_inner()).await {
            Ok(()) => HttpResponse::Ok().finish(),
            Err(err) => specimen_error_response("Delete specimen", err),
        },
    )
}

#[api_v2_operation]
pub async fn mark_specimen_available(
    specimen_service: Data<SpecimenService>,
    specimen_id: web::Path<SpecimenId>,
) -> Result<HttpResponse, Error> {
    Ok(
        match specimen_service
            .change_status_to_available(specimen_id.into_inner())
            .await
        {
            Ok(specimen) => HttpResponse::Ok().json(specimen),
            Err(err) => specimen_error_response("Mark specimen available", err),
        },
    )
}

#[api_v2_operation]
pub async fn mark_specimen_rented(
    specimen_service: Data<SpecimenService>,
    specimen_id: web::Path<SpecimenId>,
) -> Result<HttpResponse, Error> {
    Ok(
        match specimen_service
            .change_status_to_rented(specimen_id.into_inner())
            .await
        {
            Ok(specimen) => HttpResponse::Ok().json(specimen),
            Err(err) => specimen_error_response("Mark specimen rented", err),
        },
    )
}

#[api_v2_operation]
pub async fn mark_specimen_lost(
    specimen_service: Data<SpecimenService>,
    specimen_id: web::Path<SpecimenId>,
) -> Result<HttpResponse, Error> {
    Ok(
        match specimen_service
            .change_status_to_lost(specimen_id.into_inner())
            .await
        {
            Ok(specimen) => HttpResponse::Ok().json(specimen),
            Err(err) => specimen_error_response("Mark specimen lost", err),
        },
    )
}

#[api_v2_operation]
pub async fn get_users(
    user_service: Data<UserService>,
    page: web::Query<PageQuery>,
) -> Result<HttpResponse, Error> {
    let offset = page.offset.unwrap_or(0) as usize;
    let limit = page.limit.map_or(usize::MAX, |limit| limit as usize);
    Ok(match user_service.find_all_paged(offset, limit).await {
        Ok(users) => HttpResponse::Ok().json(users),
        Err(err) => user_error_response("Get users", err),
    })
}

#[api_v2_operation]
pub async fn search_users(
    user_service: Data<UserService>,
    query: web::Query<UserSearchQuery>,
) -> Result<HttpResponse, Error> {
    let query = query.into_inner();
    Ok(
        match user_service.find_by_prefix(query.by, &query.prefix).await {
            Ok(users) => HttpResponse::Ok().json(users),
            Err(err) => user_error_response("Search users", err),
        },
    )
}

#[api_v2_operation]
pub async fn count_users(user_service: Data<UserService>) -> Result<HttpResponse, Error> {
    Ok(match user_service.count().await {
        Ok(count) => HttpResponse::Ok().json(count),
        Err(err) => user_error_response("Count users", err),
    })
}

#[api_v2_operation]
pub async fn user_exists(
    user_service: Data<UserService>,
    query: web::Query<UserEmailQuery>,
) -> Result<HttpResponse, Error> {
    Ok(match user_service.exists(&query.email).await {
        Ok(exists) => HttpResponse::Ok().json(exists),
        Err(err) => user_error_response("Check user existence", err),
    })
}

#[api_v2_operation]
pub async fn get_user_by_email(
    user_service: Data<UserService>,
    email: web::Path<String>,
) -> Result<HttpResponse, Error> {
    Ok(match user_service.find_by_email(&email).await {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(err) => user_error_response("Get user by email", err),
    })
}

#[api_v2_operation]
pub async fn add_user(
    user_service: Data<UserService>,
    details: web::Json<UserDetails>,
) -> Result<HttpResponse, Error> {
    Ok(match user_service.save(details.into_inner()).await {
        Ok(user) => HttpResponse::Created()
            .append_header((LOCATION, format!("/api/user/{}", user.user_id)))
            .json(user),
        Err(err) => user_error_response("Add user", err),
    })
}

#[api_v2_operation]
pub async fn update_user(
    user_service: Data<UserService>,
    user: web::Json<User>,
) -> Result<HttpResponse, Error> {
    Ok(match user_service.update(user.into_inner()).await {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(err) => user_error_response("Update user", err),
    })
}

#[api_v2_operation]
pub async fn get_user(
    user_service: Data<UserService>,
    user_id: web::Path<UserId>,
) -> Result<HttpResponse, Error> {
    Ok(match user_service.find_by_id(user_id.into_inner()).await {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(err) => user_error_response("Get user", err),
    })
}

#[api_v2_operation]
pub async fn delete_user(
    user_service: Data<UserService>,
    user_id: web::Path<UserId>,
) -> Result<HttpResponse, Error> {
    Ok(match user_service.delete_by_id(user_id.into_inner()).await {
        Ok(()) => HttpResponse::Ok().finish(),
        Err(err) => user_error_response("Delete user", err),
    })
}
