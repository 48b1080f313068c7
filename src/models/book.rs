//! Book, reservation and loan types
//!
//! Books live embedded in their owner's document; a book's reservation list
//! is append-only history, the most recent open entry being the active one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Lifecycle status of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    Available,
    Reserved,
    Borrowed,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "available",
            BookStatus::Reserved => "reserved",
            BookStatus::Borrowed => "borrowed",
        }
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "available" => Ok(BookStatus::Available),
            "reserved" => Ok(BookStatus::Reserved),
            "borrowed" => Ok(BookStatus::Borrowed),
            _ => Err(format!(
                "Invalid status '{}'. Must be: available, reserved or borrowed",
                s
            )),
        }
    }
}

/// One request-to-borrow-and-return cycle, recorded in a book's history
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Reservation {
    pub reserved_at: DateTime<Utc>,
    pub loaned_at: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
    pub borrower_email: String,
}

impl Reservation {
    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }
}

/// A shareable book, embedded in its owner's document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub description: String,
    pub cover: String,
    pub status: BookStatus,
    pub topics: Vec<Uuid>,
    pub reservations: Vec<Reservation>,
}

impl Book {
    /// The active reservation, when one exists: the most recently appended
    /// entry with no return date yet.
    pub fn active_reservation(&self) -> Option<&Reservation> {
        self.reservations.last().filter(|r| r.is_open())
    }
}

/// Payload for creating or updating a book
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookInput {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "author must not be empty"))]
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover: String,
    /// Topic display names, resolved against the topic catalog
    pub topics: Vec<String>,
}

/// Read view of an owner's book, with topic references resolved to names
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookView {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub status: BookStatus,
    pub description: String,
    pub cover: String,
    pub topics: Vec<String>,
    pub reservations: Vec<Reservation>,
}

/// A catalog search hit, annotated with the owning user's email and location
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookSearchResult {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub description: String,
    pub cover: String,
    pub status: BookStatus,
    pub topics: Vec<Uuid>,
    pub reservations: Vec<Reservation>,
    pub owner_email: String,
    pub city: String,
    pub province: String,
    pub country: String,
}

/// A book currently held by (or reserved for) a requesting user
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoanView {
    pub title: String,
    pub author: String,
    pub description: String,
    pub cover: String,
    pub status: BookStatus,
    pub owner_email: String,
    pub reserved_at: DateTime<Utc>,
    pub loaned_at: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Available".parse::<BookStatus>(), Ok(BookStatus::Available));
        assert_eq!("RESERVED".parse::<BookStatus>(), Ok(BookStatus::Reserved));
        assert_eq!("borrowed".parse::<BookStatus>(), Ok(BookStatus::Borrowed));
        assert!("lent".parse::<BookStatus>().is_err());
    }

    #[test]
    fn active_reservation_is_last_open_entry() {
        let closed = Reservation {
            reserved_at: Utc::now(),
            loaned_at: None,
            returned_at: Some(Utc::now()),
            borrower_email: "a@x.com".into(),
        };
        let open = Reservation {
            reserved_at: Utc::now(),
            loaned_at: None,
            returned_at: None,
            borrower_email: "b@x.com".into(),
        };

        let mut book = Book {
            id: Uuid::new_v4(),
            title: "T".into(),
            author: "A".into(),
            description: String::new(),
            cover: String::new(),
            status: BookStatus::Reserved,
            topics: vec![Uuid::new_v4()],
            reservations: vec![closed.clone(), open],
        };
        assert_eq!(
            book.active_reservation().map(|r| r.borrower_email.as_str()),
            Some("b@x.com")
        );

        // A closed entry at the tail means no active reservation even if an
        // earlier one is still open.
        book.reservations = vec![
            Reservation {
                returned_at: None,
                ..closed.clone()
            },
            closed,
        ];
        assert!(book.active_reservation().is_none());
    }
}
