//! PostgreSQL repository store

use crate::domain::entities::{Repository, RepositoryField, RepositoryId};
use crate::repository::{unique_fields, RepositoryStore};
use archivist_common::{Error, Result};
use sqlx::PgPool;

const REPOSITORY_COLUMNS: &str = "id, endpoints, is_fork, created_at, updated_at";

#[derive(Clone)]
pub struct PgRepositoryStore {
    pool: PgPool,
}

impl PgRepositoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find repository by ID
    pub async fn find(&self, id: RepositoryId) -> Result<Option<Repository>> {
        let query = format!("SELECT {REPOSITORY_COLUMNS} FROM repositories WHERE id = $1");
        let row = sqlx::query_as::<_, Repository>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Get a reference to the underlying database pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl RepositoryStore for PgRepositoryStore {
    async fn find_by_endpoint_overlap(&self, endpoints: &[String]) -> Result<Vec<Repository>> {
        // `&&` is served by the GIN index on endpoints
        let query = format!(
            "SELECT {REPOSITORY_COLUMNS} FROM repositories \
             WHERE endpoints && $1 \
             ORDER BY id ASC"
        );
        let rows = sqlx::query_as::<_, Repository>(&query)
            .bind(endpoints)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn insert(&self, repository: &Repository) -> Result<()> {
        let query = format!(
            "INSERT INTO repositories ({REPOSITORY_COLUMNS}) VALUES ($1, $2, $3, $4, $5)"
        );
        sqlx::query(&query)
            .bind(repository.id)
            .bind(&repository.endpoints)
            .bind(repository.is_fork)
            .bind(repository.created_at)
            .bind(repository.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_fields(
        &self,
        repository: &Repository,
        fields: &[RepositoryField],
        expected: &Repository,
    ) -> Result<bool> {
        let fields = unique_fields(fields);
        if fields.is_empty() {
            return Ok(true);
        }

        let query = update_statement(&fields);
        let mut update = sqlx::query(&query).bind(repository.id);
        for field in &fields {
            update = bind_field(update, repository, *field);
        }
        for field in &fields {
            update = bind_field(update, expected, *field);
        }

        let result = update.execute(&self.pool).await?;
        if result.rows_affected() > 0 {
            return Ok(true);
        }

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM repositories WHERE id = $1)")
                .bind(repository.id)
                .fetch_one(&self.pool)
                .await?;
        if !exists {
            return Err(Error::NotFound(format!("repository {}", repository.id)));
        }

        tracing::debug!(
            repository_id = %repository.id,
            "Repository changed since it was read, update skipped"
        );
        Ok(false)
    }
}

type PgQuery<'q> = sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>;

fn bind_field<'q>(
    query: PgQuery<'q>,
    repository: &'q Repository,
    field: RepositoryField,
) -> PgQuery<'q> {
    match field {
        RepositoryField::Endpoints => query.bind(&repository.endpoints),
        RepositoryField::IsFork => query.bind(repository.is_fork),
    }
}

/// Build a guarded UPDATE assigning `fields` in order from parameter `$2`,
/// followed by one parameter per field holding the value it must still have
fn update_statement(fields: &[RepositoryField]) -> String {
    let assignments = fields
        .iter()
        .enumerate()
        .map(|(i, field)| format!("{} = ${}", field.column(), i + 2))
        .collect::<Vec<_>>()
        .join(", ");
    let guards = fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            format!(
                " AND {} IS NOT DISTINCT FROM ${}",
                field.column(),
                i + 2 + fields.len()
            )
        })
        .collect::<String>();
    format!("UPDATE repositories SET {assignments}, updated_at = NOW() WHERE id = $1{guards}")
}
