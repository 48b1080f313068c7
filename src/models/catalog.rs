//! Catalog filter dimensions and store query selection
//!
//! A filter request carries up to five optional dimensions. Exactly one store
//! query is selected per request; whatever the chosen query cannot express is
//! re-checked in a post-filter pass over the returned candidate set.

use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Literal accepted as "no filtering" for a dimension
fn is_wildcard(value: &str) -> bool {
    value.eq_ignore_ascii_case("todos") || value.eq_ignore_ascii_case("all")
}

/// Normalized filter dimensions. A dimension is `None` when the caller
/// omitted it or passed the wildcard literal.
#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    pub topic: Option<Uuid>,
    pub status: Option<String>,
    pub country: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
}

impl BookFilter {
    pub fn new(
        topic: Option<String>,
        status: Option<String>,
        country: Option<String>,
        province: Option<String>,
        city: Option<String>,
    ) -> AppResult<Self> {
        let topic = match normalize(topic) {
            Some(raw) => Some(
                raw.parse::<Uuid>()
                    .map_err(|_| AppError::InvalidInput(format!("Invalid topic id '{}'", raw)))?,
            ),
            None => None,
        };

        Ok(Self {
            topic,
            status: normalize(status).map(|s| s.to_lowercase()),
            country: normalize(country),
            province: normalize(province),
            city: normalize(city),
        })
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty() && !is_wildcard(v))
}

/// The closed set of owner-document queries the store can execute.
///
/// Book-level predicates (`topic`, `status`) apply at the document level: an
/// owner matches when *any* of its books satisfies each predicate, not
/// necessarily the same book. The post-filter pass re-checks per book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogQuery {
    /// Every owner
    All,
    /// Owners with at least one book referencing the topic
    Topic(Uuid),
    /// Owners with at least one book in the status
    Status(String),
    /// Owners matching both book-level predicates (document level)
    TopicStatus { topic: Uuid, status: String },
    Country(String),
    Province(String),
    City(String),
    CountryTopic { country: String, topic: Uuid },
    ProvinceTopic { province: String, topic: Uuid },
    CityTopic { city: String, topic: Uuid },
    /// Most specific region scope available, plus book status
    RegionStatus {
        country: String,
        province: Option<String>,
        city: Option<String>,
        status: String,
    },
    /// Most specific region scope available, plus topic and status
    RegionTopicStatus {
        country: String,
        province: Option<String>,
        city: Option<String>,
        topic: Uuid,
        status: String,
    },
}

impl CatalogQuery {
    /// Select the single store query for the given dimensions.
    ///
    /// Decision table, most specific first. Country pins the region branch;
    /// province and city only narrow it further (a city without its province
    /// does not). Without a country, narrower region dimensions pair only
    /// with a topic; combined with a bare status they are left to the
    /// post-filter.
    pub fn plan(filter: &BookFilter) -> CatalogQuery {
        let province = filter.province.as_ref();
        let city = filter.city.as_ref();

        match (filter.topic, filter.status.as_ref(), filter.country.as_ref()) {
            (Some(topic), Some(status), Some(country)) => CatalogQuery::RegionTopicStatus {
                country: country.clone(),
                province: province.cloned(),
                city: province.and(city).cloned(),
                topic,
                status: status.clone(),
            },
            (None, Some(status), Some(country)) => CatalogQuery::RegionStatus {
                country: country.clone(),
                province: province.cloned(),
                city: province.and(city).cloned(),
                status: status.clone(),
            },
            (Some(topic), None, Some(country)) => CatalogQuery::CountryTopic {
                country: country.clone(),
                topic,
            },
            (None, None, Some(country)) => CatalogQuery::Country(country.clone()),

            (Some(topic), Some(status), None) => CatalogQuery::TopicStatus {
                topic,
                status: status.clone(),
            },
            (Some(topic), None, None) => match (province, city) {
                (Some(province), _) => CatalogQuery::ProvinceTopic {
                    province: province.clone(),
                    topic,
                },
                (None, Some(city)) => CatalogQuery::CityTopic {
                    city: city.clone(),
                    topic,
                },
                (None, None) => CatalogQuery::Topic(topic),
            },
            (None, Some(status), None) => CatalogQuery::Status(status.clone()),
            (None, None, None) => match (province, city) {
                (Some(province), _) => CatalogQuery::Province(province.clone()),
                (None, Some(city)) => CatalogQuery::City(city.clone()),
                (None, None) => CatalogQuery::All,
            },
        }
    }
}
