use std::fmt;
use std::str::FromStr;

use paperclip::actix::Apiv2Schema;
use serde::{Deserialize, Serialize};

pub type BookId = i32;
pub type SpecimenId = i32;
pub type UserId = i32;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind} value {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

/// Implements `as_str`, `Display` and `FromStr` over the serialized
/// SCREAMING_SNAKE_CASE names, which are also what the database stores
macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, Apiv2Schema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Fantasy,
    ScienceFiction,
    Crime,
    Thriller,
    Horror,
    Romance,
    Biography,
    History,
    Poetry,
    Drama,
    Children,
    Guide,
    Science,
    Other,
}

text_enum!(Category, "category", {
    Fantasy => "FANTASY",
    ScienceFiction => "SCIENCE_FICTION",
    Crime => "CRIME",
    Thriller => "THRILLER",
    Horror => "HORROR",
    Romance => "ROMANCE",
    Biography => "BIOGRAPHY",
    History => "HISTORY",
    Poetry => "POETRY",
    Drama => "DRAMA",
    Children => "CHILDREN",
    Guide => "GUIDE",
    Science => "SCIENCE",
    Other => "OTHER",
});

/// State of a single physical copy.
/// Every state can be reached from every other one
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, Apiv2Schema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Available,
    Rented,
    Lost,
}

text_enum!(Status, "status", {
    Available => "AVAILABLE",
    Rented => "RENTED",
    Lost => "LOST",
});

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, Apiv2Schema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Admin,
}

text_enum!(Role, "role", {
    User => "USER",
    Admin => "ADMIN",
});

impl Role {
    /// Authority string handed to the authentication middleware
    pub fn authority(&self) -> String {
        format!("ROLE_{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct BookDetails {
    pub author: String,
    /// Unique among all books, compared case-sensitively
    pub title: String,
    pub category: Category,
    pub year_of_first_publication: i32,
    pub isbn: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Book {
    pub book_id: BookId,
    #[serde(flatten)]
    pub details: BookDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct SpecimenDetails {
    pub status: Status,
    pub publisher: String,
    pub year_of_publication: i32,
    /// 13 digit ISBN of this edition
    pub isbn: i64,
    /// Book this specimen is a copy of
    pub book_id: BookId,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Specimen {
    pub specimen_id: SpecimenId,
    #[serde(flatten)]
    pub details: SpecimenDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct UserDetails {
    pub name: String,
    pub surname: String,
    /// Unique among all users, used as the login identity
    pub email: String,
    pub phone_number: i64,
    /// Plaintext when saving a new user, the stored hash everywhere else
    #[serde(skip_serializing)]
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct User {
    pub user_id: UserId,
    pub details: UserDetails,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookSearchField {
    Title,
    Author,
    Category,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserSearchField {
    Name,
    Surname,
    Email,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct BookSearchQuery {
    pub by: BookSearchField,
    pub prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct UserSearchQuery {
    pub by: UserSearchField,
    pub prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct BookTitleQuery {
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct UserEmailQuery {
    pub email: String,
}

/// Without offset the list starts at the first element, without limit it is not cut
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct PageQuery {
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct SpecimenStatusFilter {
    pub status: Option<Status>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct SpecimenCountQuery {
    pub status: Status,
}

/// Case-insensitive "starts with", shared by the in-memory repositories
pub fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value.to_lowercase().starts_with(&prefix.to_lowercase())
}
