//! Catalog filtering and search across all owners' books
//!
//! Each filter request executes exactly one store query, selected by
//! [`CatalogQuery::plan`]; a post-filter pass then re-checks per book the
//! dimensions the document-level query could not express.

use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookSearchResult},
        catalog::{BookFilter, CatalogQuery},
        owner::Owner,
    },
    repository::OwnerStore,
};

#[derive(Clone)]
pub struct CatalogService {
    owners: Arc<dyn OwnerStore>,
}

impl CatalogService {
    pub fn new(owners: Arc<dyn OwnerStore>) -> Self {
        Self { owners }
    }

    /// Filter books by up to five optional dimensions
    pub async fn filter_books(&self, filter: &BookFilter) -> AppResult<Vec<BookSearchResult>> {
        let query = CatalogQuery::plan(filter);
        let owners = self.owners.find_matching(&query).await?;

        Ok(owners
            .iter()
            .flat_map(|owner| {
                owner
                    .books
                    .iter()
                    .filter(|book| book_passes(book, filter))
                    .map(|book| to_result(owner, book))
            })
            .collect())
    }

    /// Case-insensitive substring search on title or author. Results from
    /// the store query are re-checked per book: a matching owner document
    /// also carries its non-matching books.
    pub async fn search_books(&self, term: &str) -> AppResult<Vec<BookSearchResult>> {
        let owners = self.owners.search_title_author(term).await?;
        let needle = term.to_lowercase();

        Ok(owners
            .iter()
            .flat_map(|owner| {
                owner
                    .books
                    .iter()
                    .filter(|book| {
                        book.title.to_lowercase().contains(&needle)
                            || book.author.to_lowercase().contains(&needle)
                    })
                    .map(|book| to_result(owner, book))
            })
            .collect())
    }
}

/// Per-book re-check of the topic and status dimensions. Province and city
/// outside the country-scoped queries are not re-validated here.
fn book_passes(book: &Book, filter: &BookFilter) -> bool {
    filter.topic.map_or(true, |topic| book.topics.contains(&topic))
        && filter
            .status
            .as_deref()
            .map_or(true, |status| book.status.as_str().eq_ignore_ascii_case(status))
}

fn to_result(owner: &Owner, book: &Book) -> BookSearchResult {
    BookSearchResult {
        id: book.id,
        title: book.title.clone(),
        author: book.author.clone(),
        description: book.description.clone(),
        cover: book.cover.clone(),
        status: book.status,
        topics: book.topics.clone(),
        reservations: book.reservations.clone(),
        owner_email: owner.email.clone(),
        city: owner.region.city.clone(),
        province: owner.region.province.clone(),
        country: owner.region.country.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::book::BookStatus;
    use crate::services::testing::{sample_book, sample_owner, MemoryStore};
    use uuid::Uuid;

    fn service(store: &Arc<MemoryStore>) -> CatalogService {
        CatalogService::new(store.clone())
    }

    fn filter_status(status: &str) -> BookFilter {
        BookFilter {
            status: Some(status.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn no_dimensions_returns_every_book_of_every_owner() {
        let store = MemoryStore::new();
        store.add_owner(sample_owner(
            "ana@x.com",
            vec![
                sample_book("A", BookStatus::Available),
                sample_book("B", BookStatus::Reserved),
            ],
        ));
        store.add_owner(sample_owner(
            "bob@x.com",
            vec![sample_book("C", BookStatus::Borrowed)],
        ));

        let results = service(&store)
            .filter_books(&BookFilter::default())
            .await
            .unwrap();

        let mut titles: Vec<String> = results.iter().map(|r| r.title.clone()).collect();
        titles.sort();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn status_dimension_never_leaks_other_statuses() {
        let store = MemoryStore::new();
        // This owner matches the document-level status query through "A",
        // which must not drag "B" into the results.
        store.add_owner(sample_owner(
            "ana@x.com",
            vec![
                sample_book("A", BookStatus::Available),
                sample_book("B", BookStatus::Borrowed),
            ],
        ));

        let results = service(&store)
            .filter_books(&filter_status("available"))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "A");
        assert_eq!(results[0].status, BookStatus::Available);
    }

    #[tokio::test]
    async fn topic_dimension_is_rechecked_per_book() {
        let store = MemoryStore::new();
        let topic = Uuid::new_v4();
        let mut tagged = sample_book("Dune", BookStatus::Available);
        tagged.topics = vec![topic];
        let untagged = sample_book("Hyperion", BookStatus::Available);
        store.add_owner(sample_owner("ana@x.com", vec![tagged, untagged]));

        let filter = BookFilter {
            topic: Some(topic),
            ..Default::default()
        };
        let results = service(&store).filter_books(&filter).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Dune");
    }

    #[tokio::test]
    async fn combined_topic_status_drops_document_level_false_positives() {
        let store = MemoryStore::new();
        let topic = Uuid::new_v4();
        // One book carries the topic, a different one carries the status:
        // the owner document matches the combined query but no single book
        // does.
        let mut tagged = sample_book("Dune", BookStatus::Borrowed);
        tagged.topics = vec![topic];
        let available = sample_book("Hyperion", BookStatus::Available);
        store.add_owner(sample_owner("ana@x.com", vec![tagged, available]));

        let filter = BookFilter {
            topic: Some(topic),
            status: Some("available".to_string()),
            ..Default::default()
        };
        let results = service(&store).filter_books(&filter).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn results_carry_owner_email_and_location() {
        let store = MemoryStore::new();
        store.add_owner(sample_owner(
            "ana@x.com",
            vec![sample_book("Dune", BookStatus::Available)],
        ));

        let results = service(&store)
            .filter_books(&BookFilter::default())
            .await
            .unwrap();

        assert_eq!(results[0].owner_email, "ana@x.com");
        assert_eq!(results[0].country, "Spain");
        assert_eq!(results[0].province, "Madrid");
        assert_eq!(results[0].city, "Getafe");
    }

    #[tokio::test]
    async fn search_drops_non_matching_books_of_matching_owners() {
        let store = MemoryStore::new();
        store.add_owner(sample_owner(
            "ana@x.com",
            vec![
                sample_book("Dune", BookStatus::Available),
                sample_book("Hyperion", BookStatus::Available),
            ],
        ));

        let results = service(&store).search_books("dune").await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Dune");
    }

    #[tokio::test]
    async fn search_matches_author_case_insensitively() {
        let store = MemoryStore::new();
        let mut book = sample_book("Solaris", BookStatus::Available);
        book.author = "Stanislaw Lem".to_string();
        store.add_owner(sample_owner("ana@x.com", vec![book]));

        let results = service(&store).search_books("LEM").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Solaris");
    }
}
