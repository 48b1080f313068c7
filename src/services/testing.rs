//! In-memory doubles shared by the service unit tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookStatus, Reservation},
        catalog::CatalogQuery,
        owner::{Owner, OwnerRegion},
        topic::Topic,
    },
    repository::{OwnerStore, TopicStore},
    services::email::Notifier,
};

/// Yield a few times so fire-and-forget tasks spawned by the code under test
/// get a chance to run on the current-thread test runtime.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

pub fn sample_topic(name: &str) -> Topic {
    Topic {
        id: Uuid::new_v4(),
        name: name.to_string(),
        image: None,
        description: None,
    }
}

pub fn sample_book(title: &str, status: BookStatus) -> Book {
    Book {
        id: Uuid::new_v4(),
        title: title.to_string(),
        author: "Author".to_string(),
        description: String::new(),
        cover: String::new(),
        status,
        topics: vec![Uuid::new_v4()],
        reservations: Vec::new(),
    }
}

pub fn sample_owner(email: &str, books: Vec<Book>) -> Owner {
    Owner {
        id: Uuid::new_v4(),
        name: "Owner".to_string(),
        email: email.to_string(),
        password_hash: String::new(),
        image: None,
        postal_code: None,
        phone: None,
        biography: None,
        interests: None,
        region: OwnerRegion {
            city: "Getafe".to_string(),
            province: "Madrid".to_string(),
            country: "Spain".to_string(),
            continent: "Europe".to_string(),
        },
        is_verified: true,
        verification_token: None,
        token_generated_at: None,
        token_verified_at: None,
        books,
    }
}

pub fn open_reservation(borrower: &str) -> Reservation {
    Reservation {
        reserved_at: Utc::now(),
        loaned_at: None,
        returned_at: None,
        borrower_email: borrower.to_string(),
    }
}

/// Owner and topic store over plain vectors
pub struct MemoryStore {
    owners: Mutex<Vec<Owner>>,
    topics: Mutex<Vec<Topic>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            owners: Mutex::new(Vec::new()),
            topics: Mutex::new(Vec::new()),
        })
    }

    pub fn add_owner(&self, owner: Owner) {
        self.owners.lock().unwrap().push(owner);
    }

    pub fn add_topic(&self, topic: Topic) {
        self.topics.lock().unwrap().push(topic);
    }

    /// Snapshot of an owner document; panics when absent
    pub fn owner(&self, email: &str) -> Owner {
        self.owners
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.email == email)
            .cloned()
            .unwrap_or_else(|| panic!("no owner {} in memory store", email))
    }
}

/// Document-level predicate evaluation: an owner matches when any of its
/// books satisfies each book-level predicate independently, mirroring the
/// over-fetching store queries.
fn matches_owner(query: &CatalogQuery, owner: &Owner) -> bool {
    let any_status =
        |status: &str| owner.books.iter().any(|b| b.status.as_str() == status);
    let any_topic = |topic: &Uuid| owner.books.iter().any(|b| b.topics.contains(topic));

    match query {
        CatalogQuery::All => true,
        CatalogQuery::Topic(topic) => any_topic(topic),
        CatalogQuery::Status(status) => any_status(status),
        CatalogQuery::TopicStatus { topic, status } => any_topic(topic) && any_status(status),
        CatalogQuery::Country(country) => owner.region.country == *country,
        CatalogQuery::Province(province) => owner.region.province == *province,
        CatalogQuery::City(city) => owner.region.city == *city,
        CatalogQuery::CountryTopic { country, topic } => {
            owner.region.country == *country && any_topic(topic)
        }
        CatalogQuery::ProvinceTopic { province, topic } => {
            owner.region.province == *province && any_topic(topic)
        }
        CatalogQuery::CityTopic { city, topic } => {
            owner.region.city == *city && any_topic(topic)
        }
        CatalogQuery::RegionStatus {
            country,
            province,
            city,
            status,
        } => {
            owner.region.country == *country
                && province.as_ref().map_or(true, |p| owner.region.province == *p)
                && city.as_ref().map_or(true, |c| owner.region.city == *c)
                && any_status(status)
        }
        CatalogQuery::RegionTopicStatus {
            country,
            province,
            city,
            topic,
            status,
        } => {
            owner.region.country == *country
                && province.as_ref().map_or(true, |p| owner.region.province == *p)
                && city.as_ref().map_or(true, |c| owner.region.city == *c)
                && any_topic(topic)
                && any_status(status)
        }
    }
}

#[async_trait]
impl OwnerStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Owner>> {
        Ok(self.owners.lock().unwrap().iter().find(|o| o.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Owner>> {
        Ok(self
            .owners
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn exists_by_email(&self, email: &str) -> AppResult<bool> {
        Ok(self
            .owners
            .lock()
            .unwrap()
            .iter()
            .any(|o| o.email.eq_ignore_ascii_case(email)))
    }

    async fn find_by_verification_token(&self, token: &str) -> AppResult<Option<Owner>> {
        Ok(self
            .owners
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.verification_token.as_deref() == Some(token))
            .cloned())
    }

    async fn find_all(&self) -> AppResult<Vec<Owner>> {
        Ok(self.owners.lock().unwrap().clone())
    }

    async fn find_matching(&self, query: &CatalogQuery) -> AppResult<Vec<Owner>> {
        Ok(self
            .owners
            .lock()
            .unwrap()
            .iter()
            .filter(|o| matches_owner(query, o))
            .cloned()
            .collect())
    }

    async fn search_title_author(&self, term: &str) -> AppResult<Vec<Owner>> {
        let needle = term.to_lowercase();
        Ok(self
            .owners
            .lock()
            .unwrap()
            .iter()
            .filter(|o| {
                o.books.iter().any(|b| {
                    b.title.to_lowercase().contains(&needle)
                        || b.author.to_lowercase().contains(&needle)
                })
            })
            .cloned()
            .collect())
    }

    async fn save(&self, owner: &Owner) -> AppResult<()> {
        let mut owners = self.owners.lock().unwrap();
        if let Some(existing) = owners.iter_mut().find(|o| o.id == owner.id) {
            *existing = owner.clone();
        } else {
            owners.push(owner.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl TopicStore for MemoryStore {
    async fn find_all(&self) -> AppResult<Vec<Topic>> {
        Ok(self.topics.lock().unwrap().clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Topic>> {
        Ok(self.topics.lock().unwrap().iter().find(|t| t.id == id).cloned())
    }

    async fn find_by_names(&self, names: &[String]) -> AppResult<Vec<Topic>> {
        Ok(self
            .topics
            .lock()
            .unwrap()
            .iter()
            .filter(|t| names.contains(&t.name))
            .cloned()
            .collect())
    }
}

/// Notifier that records every delivery
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

/// Notifier that always fails
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _to: &str, _subject: &str, _body: &str) -> AppResult<()> {
        Err(AppError::Internal("smtp unreachable".to_string()))
    }
}
