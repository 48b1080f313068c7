//! Book lifecycle service
//!
//! Owns every mutation of a book and its reservation history, always scoped
//! to one owner's book list: add/update/remove, status transitions,
//! reservations and returns, plus the cross-owner borrowed-books view.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookInput, BookStatus, BookView, LoanView, Reservation},
        owner::Owner,
        topic::Topic,
    },
    repository::{OwnerStore, TopicStore},
    services::email::Notifier,
};

#[derive(Clone)]
pub struct BooksService {
    owners: Arc<dyn OwnerStore>,
    topics: Arc<dyn TopicStore>,
    notifier: Arc<dyn Notifier>,
}

impl BooksService {
    pub fn new(
        owners: Arc<dyn OwnerStore>,
        topics: Arc<dyn TopicStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            owners,
            topics,
            notifier,
        }
    }

    async fn get_owner(&self, email: &str) -> AppResult<Owner> {
        self.owners
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", email)))
    }

    /// Resolve topic display names against the topic catalog, preserving the
    /// requested order. Unknown names are reported individually.
    async fn resolve_topics(&self, names: &[String]) -> AppResult<Vec<Topic>> {
        if names.is_empty() {
            return Err(AppError::InvalidInput(
                "At least one topic is required".to_string(),
            ));
        }

        let found = self.topics.find_by_names(names).await?;

        let missing: Vec<&str> = names
            .iter()
            .filter(|name| !found.iter().any(|t| &t.name == *name))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "Unknown topics: {}",
                missing.join(", ")
            )));
        }

        let mut resolved: Vec<Topic> = Vec::with_capacity(names.len());
        for name in names {
            if resolved.iter().any(|t| &t.name == name) {
                continue;
            }
            if let Some(topic) = found.iter().find(|t| &t.name == name) {
                resolved.push(topic.clone());
            }
        }
        Ok(resolved)
    }

    async fn topic_names(&self) -> AppResult<HashMap<Uuid, String>> {
        Ok(self
            .topics
            .find_all()
            .await?
            .into_iter()
            .map(|t| (t.id, t.name))
            .collect())
    }

    fn check_index(owner: &Owner, index: usize) -> AppResult<()> {
        if index >= owner.books.len() {
            return Err(AppError::OutOfRange(format!(
                "Book index {} out of range (owner has {} books)",
                index,
                owner.books.len()
            )));
        }
        Ok(())
    }

    /// All books of an owner, in list order
    pub async fn list_books(&self, owner_email: &str) -> AppResult<Vec<BookView>> {
        let owner = self.get_owner(owner_email).await?;
        let names = self.topic_names().await?;

        Ok(owner
            .books
            .iter()
            .map(|book| view_from_map(book, &names))
            .collect())
    }

    /// Append a new book to the owner's list. New books always start
    /// available, with an empty reservation history.
    pub async fn add_book(&self, owner_email: &str, input: BookInput) -> AppResult<BookView> {
        let mut owner = self.get_owner(owner_email).await?;
        let topics = self.resolve_topics(&input.topics).await?;

        let book = Book {
            id: Uuid::new_v4(),
            title: input.title,
            author: input.author,
            description: input.description,
            cover: input.cover,
            status: BookStatus::Available,
            topics: topics.iter().map(|t| t.id).collect(),
            reservations: Vec::new(),
        };

        let view = view_with_names(&book, topics.iter().map(|t| t.name.clone()).collect());
        owner.books.push(book);
        self.owners.save(&owner).await?;

        Ok(view)
    }

    /// Overwrite a book's descriptive fields in place. Status and
    /// reservation history are untouched.
    pub async fn update_book(
        &self,
        owner_email: &str,
        index: usize,
        input: BookInput,
    ) -> AppResult<BookView> {
        let mut owner = self.get_owner(owner_email).await?;
        Self::check_index(&owner, index)?;
        let topics = self.resolve_topics(&input.topics).await?;

        let book = &mut owner.books[index];
        book.title = input.title;
        book.author = input.author;
        book.description = input.description;
        book.cover = input.cover;
        book.topics = topics.iter().map(|t| t.id).collect();

        let view = view_with_names(book, topics.iter().map(|t| t.name.clone()).collect());
        self.owners.save(&owner).await?;

        Ok(view)
    }

    /// Delete the book at the given position, discarding its reservation
    /// history. Later positions shift down by one.
    pub async fn remove_book(&self, owner_email: &str, index: usize) -> AppResult<()> {
        let mut owner = self.get_owner(owner_email).await?;
        Self::check_index(&owner, index)?;

        owner.books.remove(index);
        self.owners.save(&owner).await
    }

    /// Set a book's status directly.
    ///
    /// Moving to borrowed stamps a loan date on every reservation still
    /// missing one; moving to available stamps a return date on every
    /// reservation still open — the whole history is swept, not only the
    /// active entry. No transition guard is applied beyond validating the
    /// status literal.
    pub async fn change_status(
        &self,
        owner_email: &str,
        index: usize,
        new_status: &str,
    ) -> AppResult<BookView> {
        let mut owner = self.get_owner(owner_email).await?;
        Self::check_index(&owner, index)?;

        let status: BookStatus = new_status.parse().map_err(AppError::InvalidInput)?;
        let now = Utc::now();

        let book = &mut owner.books[index];
        book.status = status;

        match status {
            BookStatus::Borrowed => {
                for reservation in book.reservations.iter_mut() {
                    if reservation.loaned_at.is_none() {
                        reservation.loaned_at = Some(now);
                    }
                }
            }
            BookStatus::Available => {
                for reservation in book.reservations.iter_mut() {
                    if reservation.returned_at.is_none() {
                        reservation.returned_at = Some(now);
                    }
                }
            }
            BookStatus::Reserved => {}
        }

        let names = self.topic_names().await?;
        let view = view_from_map(&owner.books[index], &names);
        self.owners.save(&owner).await?;

        Ok(view)
    }

    /// Reserve the owner's first book with the given title for the
    /// requester. The owner is notified by email after the reservation is
    /// persisted; a notification failure is logged, never reported back.
    pub async fn reserve_book(
        &self,
        requester_email: &str,
        owner_email: &str,
        title: &str,
    ) -> AppResult<()> {
        let mut owner = self
            .owners
            .find_by_email(owner_email)
            .await?
            .ok_or_else(|| AppError::NotFound("Book owner not found".to_string()))?;

        let book = owner
            .books
            .iter_mut()
            .find(|b| b.title == title)
            .ok_or_else(|| AppError::NotFound(format!("Book '{}' not found", title)))?;

        if book.status != BookStatus::Available {
            return Err(AppError::Conflict(format!(
                "Book '{}' is not available for reservation",
                title
            )));
        }

        book.reservations.push(Reservation {
            reserved_at: Utc::now(),
            loaned_at: None,
            returned_at: None,
            borrower_email: requester_email.to_string(),
        });
        book.status = BookStatus::Reserved;

        let to = owner.email.clone();
        self.owners.save(&owner).await?;

        let notifier = Arc::clone(&self.notifier);
        let subject = format!("Your book \"{}\" has been reserved", title);
        let body = format!(
            "{} has reserved your book \"{}\".\n\nGet in touch to arrange the handover.",
            requester_email, title
        );
        tokio::spawn(async move {
            if let Err(err) = notifier.send(&to, &subject, &body).await {
                tracing::warn!("Failed to notify {} about a reservation: {}", to, err);
            }
        });

        Ok(())
    }

    /// Close the requester's open reservation on the owner's book with the
    /// given title, making the book available again.
    pub async fn return_book(
        &self,
        requester_email: &str,
        owner_email: &str,
        title: &str,
    ) -> AppResult<()> {
        let mut owner = self
            .owners
            .find_by_email(owner_email)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("The book to return is not associated with any user".to_string())
            })?;

        let mut target: Option<(usize, usize)> = None;
        'books: for (book_idx, book) in owner.books.iter().enumerate() {
            if book.title != title {
                continue;
            }
            for (res_idx, reservation) in book.reservations.iter().enumerate() {
                if reservation.borrower_email == requester_email && reservation.returned_at.is_none()
                {
                    target = Some((book_idx, res_idx));
                    break 'books;
                }
            }
        }

        let (book_idx, res_idx) = target.ok_or_else(|| {
            AppError::NotFound("No matching book or reservation".to_string())
        })?;

        let book = &mut owner.books[book_idx];
        book.reservations[res_idx].returned_at = Some(Utc::now());
        book.status = BookStatus::Available;

        self.owners.save(&owner).await
    }

    /// Every book across all owners currently held by (or reserved for) the
    /// requester. Only the most recent reservation of each book counts.
    /// Full-corpus scan; fine at this scale.
    pub async fn borrowed_by(&self, requester_email: &str) -> AppResult<Vec<LoanView>> {
        let owners = self.owners.find_all().await?;
        let mut loans = Vec::new();

        for owner in &owners {
            for book in &owner.books {
                if book.status != BookStatus::Reserved && book.status != BookStatus::Borrowed {
                    continue;
                }
                if let Some(last) = book.reservations.last() {
                    if last.borrower_email == requester_email && last.returned_at.is_none() {
                        loans.push(LoanView {
                            title: book.title.clone(),
                            author: book.author.clone(),
                            description: book.description.clone(),
                            cover: book.cover.clone(),
                            status: book.status,
                            owner_email: owner.email.clone(),
                            reserved_at: last.reserved_at,
                            loaned_at: last.loaned_at,
                            returned_at: last.returned_at,
                        });
                    }
                }
            }
        }

        Ok(loans)
    }
}

fn view_with_names(book: &Book, topics: Vec<String>) -> BookView {
    BookView {
        id: book.id,
        title: book.title.clone(),
        author: book.author.clone(),
        status: book.status,
        description: book.description.clone(),
        cover: book.cover.clone(),
        topics,
        reservations: book.reservations.clone(),
    }
}

fn view_from_map(book: &Book, names: &HashMap<Uuid, String>) -> BookView {
    let topics = book
        .topics
        .iter()
        .map(|id| names.get(id).cloned().unwrap_or_else(|| id.to_string()))
        .collect();
    view_with_names(book, topics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{
        open_reservation, sample_book, sample_owner, sample_topic, settle, FailingNotifier,
        MemoryStore, RecordingNotifier,
    };

    fn input(title: &str, topics: &[&str]) -> BookInput {
        BookInput {
            title: title.to_string(),
            author: "Author".to_string(),
            description: "".to_string(),
            cover: "".to_string(),
            topics: topics.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn service(store: &Arc<MemoryStore>) -> BooksService {
        BooksService::new(
            store.clone(),
            store.clone(),
            RecordingNotifier::new(),
        )
    }

    #[tokio::test]
    async fn list_books_unknown_owner() {
        let store = MemoryStore::new();
        let result = service(&store).list_books("nobody@x.com").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_books_resolves_topic_names_in_order() {
        let store = MemoryStore::new();
        let scifi = sample_topic("scifi");
        let mut book = sample_book("Dune", BookStatus::Available);
        book.topics = vec![scifi.id];
        store.add_topic(scifi);
        store.add_owner(sample_owner("ana@x.com", vec![book]));

        let views = service(&store).list_books("ana@x.com").await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].topics, vec!["scifi".to_string()]);
    }

    #[tokio::test]
    async fn add_book_starts_available_with_empty_history() {
        let store = MemoryStore::new();
        store.add_topic(sample_topic("scifi"));
        store.add_owner(sample_owner("ana@x.com", vec![]));

        let view = service(&store)
            .add_book("ana@x.com", input("Dune", &["scifi"]))
            .await
            .unwrap();

        assert_eq!(view.status, BookStatus::Available);
        assert!(view.reservations.is_empty());
        assert_eq!(view.topics, vec!["scifi".to_string()]);

        let owner = store.owner("ana@x.com");
        assert_eq!(owner.books.len(), 1);
        assert_eq!(owner.books[0].id, view.id);
    }

    #[tokio::test]
    async fn add_book_rejects_empty_topic_list() {
        let store = MemoryStore::new();
        store.add_owner(sample_owner("ana@x.com", vec![]));

        let result = service(&store).add_book("ana@x.com", input("Dune", &[])).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn add_book_names_the_unresolvable_topics() {
        let store = MemoryStore::new();
        store.add_topic(sample_topic("scifi"));
        store.add_owner(sample_owner("ana@x.com", vec![]));

        let result = service(&store)
            .add_book("ana@x.com", input("Dune", &["scifi", "steampunk"]))
            .await;

        match result {
            Err(AppError::InvalidInput(msg)) => assert!(msg.contains("steampunk")),
            other => panic!("expected InvalidInput, got {:?}", other.map(|v| v.title)),
        }
        // The book was never added.
        assert!(store.owner("ana@x.com").books.is_empty());
    }

    #[tokio::test]
    async fn update_book_preserves_status_and_history() {
        let store = MemoryStore::new();
        store.add_topic(sample_topic("scifi"));
        let mut book = sample_book("Dune", BookStatus::Reserved);
        book.reservations.push(open_reservation("bob@x.com"));
        store.add_owner(sample_owner("ana@x.com", vec![book]));

        let view = service(&store)
            .update_book("ana@x.com", 0, input("Dune Messiah", &["scifi"]))
            .await
            .unwrap();

        assert_eq!(view.title, "Dune Messiah");
        assert_eq!(view.status, BookStatus::Reserved);
        assert_eq!(view.reservations.len(), 1);
    }

    #[tokio::test]
    async fn update_book_out_of_range() {
        let store = MemoryStore::new();
        store.add_topic(sample_topic("scifi"));
        store.add_owner(sample_owner("ana@x.com", vec![sample_book("Dune", BookStatus::Available)]));

        let result = service(&store)
            .update_book("ana@x.com", 1, input("Dune", &["scifi"]))
            .await;
        assert!(matches!(result, Err(AppError::OutOfRange(_))));
    }

    #[tokio::test]
    async fn remove_book_shifts_later_positions_down() {
        let store = MemoryStore::new();
        store.add_owner(sample_owner(
            "ana@x.com",
            vec![
                sample_book("A", BookStatus::Available),
                sample_book("B", BookStatus::Available),
                sample_book("C", BookStatus::Available),
            ],
        ));

        service(&store).remove_book("ana@x.com", 1).await.unwrap();

        let titles: Vec<String> = store
            .owner("ana@x.com")
            .books
            .iter()
            .map(|b| b.title.clone())
            .collect();
        assert_eq!(titles, vec!["A".to_string(), "C".to_string()]);
    }

    #[tokio::test]
    async fn change_status_rejects_unknown_literal() {
        let store = MemoryStore::new();
        store.add_owner(sample_owner("ana@x.com", vec![sample_book("Dune", BookStatus::Available)]));

        let result = service(&store).change_status("ana@x.com", 0, "lent").await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn change_status_accepts_any_casing() {
        let store = MemoryStore::new();
        store.add_owner(sample_owner("ana@x.com", vec![sample_book("Dune", BookStatus::Available)]));

        let view = service(&store)
            .change_status("ana@x.com", 0, "Borrowed")
            .await
            .unwrap();
        assert_eq!(view.status, BookStatus::Borrowed);
    }

    // The sweep below is intentionally history-wide: a direct status change
    // stamps every reservation still missing the date, not only the active
    // one. A change here must be a deliberate decision.
    #[tokio::test]
    async fn change_status_to_borrowed_stamps_every_open_loan_date() {
        let store = MemoryStore::new();
        let mut book = sample_book("Dune", BookStatus::Reserved);
        let mut settled = open_reservation("old@x.com");
        settled.loaned_at = Some(Utc::now());
        settled.returned_at = Some(Utc::now());
        let earlier_loaned_at = settled.loaned_at;
        book.reservations.push(settled);
        book.reservations.push(open_reservation("bob@x.com"));
        book.reservations.push(open_reservation("eve@x.com"));
        store.add_owner(sample_owner("ana@x.com", vec![book]));

        service(&store)
            .change_status("ana@x.com", 0, "borrowed")
            .await
            .unwrap();

        let books = store.owner("ana@x.com").books;
        // The settled entry keeps its original loan date.
        assert_eq!(books[0].reservations[0].loaned_at, earlier_loaned_at);
        // Both open entries were stamped, not just the most recent.
        assert!(books[0].reservations[1].loaned_at.is_some());
        assert!(books[0].reservations[2].loaned_at.is_some());
    }

    #[tokio::test]
    async fn change_status_to_available_closes_every_open_reservation() {
        let store = MemoryStore::new();
        let mut book = sample_book("Dune", BookStatus::Borrowed);
        book.reservations.push(open_reservation("bob@x.com"));
        book.reservations.push(open_reservation("eve@x.com"));
        store.add_owner(sample_owner("ana@x.com", vec![book]));

        service(&store)
            .change_status("ana@x.com", 0, "available")
            .await
            .unwrap();

        let books = store.owner("ana@x.com").books;
        assert!(books[0]
            .reservations
            .iter()
            .all(|r| r.returned_at.is_some()));
    }

    #[tokio::test]
    async fn reserve_book_appends_reservation_and_notifies_owner() {
        let store = MemoryStore::new();
        store.add_owner(sample_owner("ana@x.com", vec![sample_book("Dune", BookStatus::Available)]));
        let notifier = RecordingNotifier::new();
        let service = BooksService::new(store.clone(), store.clone(), notifier.clone());

        service
            .reserve_book("bob@x.com", "ana@x.com", "Dune")
            .await
            .unwrap();

        let books = store.owner("ana@x.com").books;
        assert_eq!(books[0].status, BookStatus::Reserved);
        assert_eq!(books[0].reservations.len(), 1);
        assert_eq!(books[0].reservations[0].borrower_email, "bob@x.com");
        assert!(books[0].reservations[0].loaned_at.is_none());
        assert!(books[0].reservations[0].returned_at.is_none());

        settle().await;
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "ana@x.com");
    }

    #[tokio::test]
    async fn reserve_book_succeeds_even_when_notification_fails() {
        let store = MemoryStore::new();
        store.add_owner(sample_owner("ana@x.com", vec![sample_book("Dune", BookStatus::Available)]));
        let service = BooksService::new(store.clone(), store.clone(), Arc::new(FailingNotifier));

        service
            .reserve_book("bob@x.com", "ana@x.com", "Dune")
            .await
            .unwrap();

        settle().await;
        assert_eq!(store.owner("ana@x.com").books[0].reservations.len(), 1);
    }

    #[tokio::test]
    async fn reserve_book_conflicts_on_non_available_book() {
        let store = MemoryStore::new();
        let mut book = sample_book("Dune", BookStatus::Reserved);
        book.reservations.push(open_reservation("eve@x.com"));
        store.add_owner(sample_owner("ana@x.com", vec![book]));

        let result = service(&store)
            .reserve_book("bob@x.com", "ana@x.com", "Dune")
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        // No reservation was appended.
        assert_eq!(store.owner("ana@x.com").books[0].reservations.len(), 1);
    }

    #[tokio::test]
    async fn reserve_book_unknown_owner_or_title() {
        let store = MemoryStore::new();
        store.add_owner(sample_owner("ana@x.com", vec![sample_book("Dune", BookStatus::Available)]));
        let service = service(&store);

        let result = service.reserve_book("bob@x.com", "ghost@x.com", "Dune").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let result = service.reserve_book("bob@x.com", "ana@x.com", "Hyperion").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn return_book_requires_a_matching_open_reservation() {
        let store = MemoryStore::new();
        let mut book = sample_book("Dune", BookStatus::Reserved);
        book.reservations.push(open_reservation("eve@x.com"));
        store.add_owner(sample_owner("ana@x.com", vec![book]));

        // bob never reserved this book
        let result = service(&store)
            .return_book("bob@x.com", "ana@x.com", "Dune")
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn reserve_then_return_round_trip() {
        let store = MemoryStore::new();
        store.add_owner(sample_owner("ana@x.com", vec![sample_book("Dune", BookStatus::Available)]));
        let service = service(&store);

        service
            .reserve_book("bob@x.com", "ana@x.com", "Dune")
            .await
            .unwrap();

        let loans = service.borrowed_by("bob@x.com").await.unwrap();
        assert_eq!(loans.len(), 1);
        assert_eq!(loans[0].title, "Dune");
        assert!(loans[0].returned_at.is_none());

        service
            .return_book("bob@x.com", "ana@x.com", "Dune")
            .await
            .unwrap();

        let books = store.owner("ana@x.com").books;
        assert_eq!(books[0].status, BookStatus::Available);
        assert!(books[0].reservations[0].returned_at.is_some());
        // Never picked up, so no loan date was ever stamped.
        assert!(books[0].reservations[0].loaned_at.is_none());

        assert!(service.borrowed_by("bob@x.com").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn borrowed_by_only_considers_the_last_reservation() {
        let store = MemoryStore::new();
        let mut book = sample_book("Dune", BookStatus::Reserved);
        // bob's old open entry is shadowed by eve's newer one
        book.reservations.push(open_reservation("bob@x.com"));
        book.reservations.push(open_reservation("eve@x.com"));
        store.add_owner(sample_owner("ana@x.com", vec![book]));
        let service = service(&store);

        assert!(service.borrowed_by("bob@x.com").await.unwrap().is_empty());
        assert_eq!(service.borrowed_by("eve@x.com").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn borrowed_by_skips_available_books() {
        let store = MemoryStore::new();
        let mut book = sample_book("Dune", BookStatus::Available);
        book.reservations.push(open_reservation("bob@x.com"));
        store.add_owner(sample_owner("ana@x.com", vec![book]));

        assert!(service(&store)
            .borrowed_by("bob@x.com")
            .await
            .unwrap()
            .is_empty());
    }
}
