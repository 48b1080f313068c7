//! Owner document store backed by Postgres
//!
//! One row per owner; the book list and region are `jsonb` columns, so the
//! whole document is read and written as a unit. Predicate queries run
//! against the embedded documents with `jsonb_array_elements`.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, types::Json, Pool, Postgres, Row};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book::Book,
        catalog::CatalogQuery,
        owner::{Owner, OwnerRegion},
    },
};

use super::OwnerStore;

#[derive(Clone)]
pub struct PgOwnerStore {
    pool: Pool<Postgres>,
}

impl PgOwnerStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn owner_from_row(row: &PgRow) -> AppResult<Owner> {
    let Json(region): Json<OwnerRegion> = row.try_get("region")?;
    let Json(books): Json<Vec<Book>> = row.try_get("books")?;

    Ok(Owner {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        image: row.try_get("image")?,
        postal_code: row.try_get("postal_code")?,
        phone: row.try_get("phone")?,
        biography: row.try_get("biography")?,
        interests: row.try_get("interests")?,
        region,
        is_verified: row.try_get("is_verified")?,
        verification_token: row.try_get("verification_token")?,
        token_generated_at: row.try_get("token_generated_at")?,
        token_verified_at: row.try_get("token_verified_at")?,
        books,
    })
}

/// Accumulates WHERE conditions and their text binds with stable positions
struct PredicateBuilder {
    conditions: Vec<String>,
    binds: Vec<String>,
}

impl PredicateBuilder {
    fn new() -> Self {
        Self {
            conditions: Vec::new(),
            binds: Vec::new(),
        }
    }

    fn placeholder(&mut self, value: &str) -> String {
        self.binds.push(value.to_string());
        format!("${}", self.binds.len())
    }

    fn country(&mut self, value: &str) {
        let p = self.placeholder(value);
        self.conditions.push(format!("o.region->>'country' = {}", p));
    }

    fn province(&mut self, value: &str) {
        let p = self.placeholder(value);
        self.conditions.push(format!("o.region->>'province' = {}", p));
    }

    fn city(&mut self, value: &str) {
        let p = self.placeholder(value);
        self.conditions.push(format!("o.region->>'city' = {}", p));
    }

    /// Any book of the owner is in the given status
    fn status(&mut self, value: &str) {
        let p = self.placeholder(value);
        self.conditions.push(format!(
            "EXISTS (SELECT 1 FROM jsonb_array_elements(o.books) AS b WHERE b->>'status' = {})",
            p
        ));
    }

    /// Any book of the owner references the given topic
    fn topic(&mut self, value: &Uuid) {
        let p = self.placeholder(&value.to_string());
        self.conditions.push(format!(
            "EXISTS (SELECT 1 FROM jsonb_array_elements(o.books) AS b \
             WHERE b->'topics' @> jsonb_build_array({}::text))",
            p
        ));
    }
}

fn build_predicates(query: &CatalogQuery) -> PredicateBuilder {
    let mut pb = PredicateBuilder::new();
    match query {
        CatalogQuery::All => {}
        CatalogQuery::Topic(topic) => pb.topic(topic),
        CatalogQuery::Status(status) => pb.status(status),
        CatalogQuery::TopicStatus { topic, status } => {
            pb.topic(topic);
            pb.status(status);
        }
        CatalogQuery::Country(country) => pb.country(country),
        CatalogQuery::Province(province) => pb.province(province),
        CatalogQuery::City(city) => pb.city(city),
        CatalogQuery::CountryTopic { country, topic } => {
            pb.country(country);
            pb.topic(topic);
        }
        CatalogQuery::ProvinceTopic { province, topic } => {
            pb.province(province);
            pb.topic(topic);
        }
        CatalogQuery::CityTopic { city, topic } => {
            pb.city(city);
            pb.topic(topic);
        }
        CatalogQuery::RegionStatus {
            country,
            province,
            city,
            status,
        } => {
            pb.country(country);
            if let Some(province) = province {
                pb.province(province);
            }
            if let Some(city) = city {
                pb.city(city);
            }
            pb.status(status);
        }
        CatalogQuery::RegionTopicStatus {
            country,
            province,
            city,
            topic,
            status,
        } => {
            pb.country(country);
            if let Some(province) = province {
                pb.province(province);
            }
            if let Some(city) = city {
                pb.city(city);
            }
            pb.topic(topic);
            pb.status(status);
        }
    }
    pb
}

#[async_trait]
impl OwnerStore for PgOwnerStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Owner>> {
        let row = sqlx::query("SELECT o.* FROM owners o WHERE o.id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(owner_from_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Owner>> {
        let row = sqlx::query("SELECT o.* FROM owners o WHERE LOWER(o.email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(owner_from_row).transpose()
    }

    async fn exists_by_email(&self, email: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM owners WHERE LOWER(email) = LOWER($1))")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn find_by_verification_token(&self, token: &str) -> AppResult<Option<Owner>> {
        let row = sqlx::query("SELECT o.* FROM owners o WHERE o.verification_token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(owner_from_row).transpose()
    }

    async fn find_all(&self) -> AppResult<Vec<Owner>> {
        let rows = sqlx::query("SELECT o.* FROM owners o ORDER BY o.email")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(owner_from_row).collect()
    }

    async fn find_matching(&self, query: &CatalogQuery) -> AppResult<Vec<Owner>> {
        let pb = build_predicates(query);

        let mut sql = String::from("SELECT o.* FROM owners o");
        if !pb.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&pb.conditions.join(" AND "));
        }

        let mut q = sqlx::query(&sql);
        for bind in &pb.binds {
            q = q.bind(bind.as_str());
        }

        let rows = q.fetch_all(&self.pool).await?;
        rows.iter().map(owner_from_row).collect()
    }

    async fn search_title_author(&self, term: &str) -> AppResult<Vec<Owner>> {
        let rows = sqlx::query(
            r#"
            SELECT o.* FROM owners o
            WHERE EXISTS (
                SELECT 1 FROM jsonb_array_elements(o.books) AS b
                WHERE b->>'title' ILIKE '%' || $1 || '%'
                   OR b->>'author' ILIKE '%' || $1 || '%'
            )
            "#,
        )
        .bind(term)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(owner_from_row).collect()
    }

    async fn save(&self, owner: &Owner) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO owners (
                id, name, email, password_hash, image, postal_code, phone,
                biography, interests, region, is_verified, verification_token,
                token_generated_at, token_verified_at, books
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                password_hash = EXCLUDED.password_hash,
                image = EXCLUDED.image,
                postal_code = EXCLUDED.postal_code,
                phone = EXCLUDED.phone,
                biography = EXCLUDED.biography,
                interests = EXCLUDED.interests,
                region = EXCLUDED.region,
                is_verified = EXCLUDED.is_verified,
                verification_token = EXCLUDED.verification_token,
                token_generated_at = EXCLUDED.token_generated_at,
                token_verified_at = EXCLUDED.token_verified_at,
                books = EXCLUDED.books
            "#,
        )
        .bind(owner.id)
        .bind(&owner.name)
        .bind(&owner.email)
        .bind(&owner.password_hash)
        .bind(&owner.image)
        .bind(&owner.postal_code)
        .bind(&owner.phone)
        .bind(&owner.biography)
        .bind(&owner.interests)
        .bind(Json(&owner.region))
        .bind(owner.is_verified)
        .bind(&owner.verification_token)
        .bind(owner.token_generated_at)
        .bind(owner.token_verified_at)
        .bind(Json(&owner.books))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
