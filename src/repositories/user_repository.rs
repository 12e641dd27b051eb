use crate::models::user::{normalize_email, CompanyCount, NewUser, User, UserPatch};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("User already exists")]
    AlreadyExists,
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Storage contract for leads. Absence is never an error: lookups return
/// `None` and deletes return `false`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: &NewUser) -> RepositoryResult<User>;
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
    async fn list_users(
        &self,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> RepositoryResult<Vec<User>>;
    async fn update_user(&self, id: i64, patch: &UserPatch) -> RepositoryResult<Option<User>>;
    async fn delete_user(&self, id: i64) -> RepositoryResult<bool>;
    async fn count_users(&self) -> RepositoryResult<i64>;
    async fn search_users(&self, term: &str) -> RepositoryResult<Vec<User>>;
    async fn list_by_company(&self, company: &str) -> RepositoryResult<Vec<User>>;
    async fn list_recent(&self, days: u32) -> RepositoryResult<Vec<User>>;
    async fn count_recent(&self, days: u32) -> RepositoryResult<i64>;
    async fn company_counts(&self) -> RepositoryResult<Vec<CompanyCount>>;
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_write_error(e: sqlx::Error) -> RepositoryError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::AlreadyExists,
        _ => RepositoryError::Database(e),
    }
}

/// `%term%` with LIKE metacharacters escaped, so the term matches literally.
pub(crate) fn search_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// `UPDATE ... RETURNING *` over the supplied fields only, or `None` when the
/// patch writes nothing.
pub(crate) fn build_update_query(
    id: i64,
    patch: &UserPatch,
) -> Option<QueryBuilder<'static, Postgres>> {
    let assignments = patch.assignments();
    if assignments.is_empty() {
        return None;
    }

    let mut builder = QueryBuilder::new("UPDATE users SET ");
    {
        let mut set = builder.separated(", ");
        for (column, value) in assignments {
            set.push(format!("{column} = "));
            set.push_bind_unseparated(value);
        }
        set.push("updated_at = NOW()");
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING *");

    Some(builder)
}

pub(crate) fn build_list_query(
    limit: Option<u32>,
    offset: Option<u32>,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT * FROM users ORDER BY created_at DESC, id DESC");
    if let Some(limit) = limit {
        builder.push(" LIMIT ");
        builder.push_bind(i64::from(limit));
    }
    if let Some(offset) = offset {
        builder.push(" OFFSET ");
        builder.push_bind(i64::from(offset));
    }
    builder
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, user: &NewUser) -> RepositoryResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (first_name, last_name, email, company, phone, message)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(normalize_email(&user.email))
        .bind(&user.company)
        .bind(&user.phone)
        .bind(&user.message)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn list_users(
        &self,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> RepositoryResult<Vec<User>> {
        let users = build_list_query(limit, offset)
            .build_query_as::<User>()
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn update_user(&self, id: i64, patch: &UserPatch) -> RepositoryResult<Option<User>> {
        let Some(mut builder) = build_update_query(id, patch) else {
            return self.find_by_id(id).await;
        };

        builder
            .build_query_as::<User>()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn delete_user(&self, id: i64) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_users(&self) -> RepositoryResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn search_users(&self, term: &str) -> RepositoryResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE first_name ILIKE $1
               OR last_name ILIKE $1
               OR email ILIKE $1
               OR company ILIKE $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(search_pattern(term))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn list_by_company(&self, company: &str) -> RepositoryResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE company = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(company)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn list_recent(&self, days: u32) -> RepositoryResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE created_at >= NOW() - ($1::BIGINT * INTERVAL '1 day')
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(i64::from(days))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn count_recent(&self, days: u32) -> RepositoryResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE created_at >= NOW() - ($1::BIGINT * INTERVAL '1 day')",
        )
        .bind(i64::from(days))
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn company_counts(&self) -> RepositoryResult<Vec<CompanyCount>> {
        let counts = sqlx::query_as::<_, CompanyCount>(
            r#"
            SELECT company AS name, COUNT(*) AS count
            FROM users
            GROUP BY company
            ORDER BY MAX(created_at) DESC, company
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }
}
