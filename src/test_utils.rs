pub mod test_helpers {
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

    use async_trait::async_trait;
    use axum::Router;
    use chrono::{DateTime, Duration, Utc};
    use sqlx::{postgres::PgPoolOptions, PgPool};

    use crate::{
        db,
        logging::LogBuffer,
        models::user::{normalize_email, CompanyCount, NewUser, User, UserPatch},
        repositories::user_repository::{RepositoryError, RepositoryResult, UserRepository},
        routes::{build_router, RouterOptions},
        AppState,
    };

    /// Connection string for the Postgres-backed (ignored by default) tests.
    pub const TEST_DATABASE_URL_VAR: &str = "TEST_DATABASE_URL";

    #[derive(Default)]
    struct Store {
        users: Vec<User>,
        next_id: i64,
    }

    /// `UserRepository` held in memory, with the same ordering, uniqueness and
    /// matching rules as the Postgres implementation.
    #[derive(Default)]
    pub struct InMemoryUserRepository {
        store: Mutex<Store>,
        failing: Mutex<bool>,
    }

    impl InMemoryUserRepository {
        pub fn new() -> Self {
            Self::default()
        }

        fn lock(&self) -> MutexGuard<'_, Store> {
            self.store.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Makes every following call fail as if the database were down.
        pub fn set_failing(&self, failing: bool) {
            *self.failing.lock().unwrap_or_else(PoisonError::into_inner) = failing;
        }

        fn check_available(&self) -> RepositoryResult<()> {
            if *self.failing.lock().unwrap_or_else(PoisonError::into_inner) {
                return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
            }
            Ok(())
        }

        /// Inserts a row with an explicit creation time, bypassing validation.
        pub fn insert_at(&self, user: NewUser, created_at: DateTime<Utc>) -> User {
            Self::insert_into(&mut self.lock(), user, created_at)
        }

        fn insert_into(store: &mut Store, user: NewUser, created_at: DateTime<Utc>) -> User {
            store.next_id += 1;
            let row = User {
                id: store.next_id,
                first_name: user.first_name,
                last_name: user.last_name,
                email: normalize_email(&user.email),
                company: user.company,
                phone: user.phone,
                message: user.message,
                email_sent: false,
                email_sent_at: None,
                email_message_id: None,
                admin_notification_sent: false,
                admin_notification_sent_at: None,
                admin_notification_message_id: None,
                created_at,
                updated_at: created_at,
            };
            store.users.push(row.clone());
            row
        }

        pub fn insert_days_ago(&self, user: NewUser, days: i64) -> User {
            self.insert_at(user, Utc::now() - Duration::days(days))
        }

        pub fn len(&self) -> usize {
            self.lock().users.len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        fn newest_first(mut users: Vec<User>) -> Vec<User> {
            users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            users
        }

        fn select(&self, predicate: impl Fn(&User) -> bool) -> Vec<User> {
            let matching = self
                .lock()
                .users
                .iter()
                .filter(|u| predicate(u))
                .cloned()
                .collect();
            Self::newest_first(matching)
        }
    }

    #[async_trait]
    impl UserRepository for InMemoryUserRepository {
        async fn create_user(&self, user: &NewUser) -> RepositoryResult<User> {
            self.check_available()?;
            let email = normalize_email(&user.email);
            let mut store = self.lock();
            if store.users.iter().any(|u| u.email == email) {
                return Err(RepositoryError::AlreadyExists);
            }
            Ok(Self::insert_into(&mut store, user.clone(), Utc::now()))
        }

        async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
            self.check_available()?;
            Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
        }

        async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
            self.check_available()?;
            let email = normalize_email(email);
            Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
        }

        async fn list_users(
            &self,
            limit: Option<u32>,
            offset: Option<u32>,
        ) -> RepositoryResult<Vec<User>> {
            self.check_available()?;
            let users = self.select(|_| true).into_iter().skip(offset.unwrap_or(0) as usize);
            Ok(match limit {
                Some(limit) => users.take(limit as usize).collect(),
                None => users.collect(),
            })
        }

        async fn update_user(&self, id: i64, patch: &UserPatch) -> RepositoryResult<Option<User>> {
            self.check_available()?;
            let assignments = patch.assignments();
            let mut store = self.lock();

            // A missing row wins over an email collision, as with `UPDATE ... WHERE id`.
            if !store.users.iter().any(|u| u.id == id) {
                return Ok(None);
            }
            if let Some((_, email)) = assignments.iter().find(|(column, _)| *column == "email") {
                if store.users.iter().any(|u| u.id != id && &u.email == email) {
                    return Err(RepositoryError::AlreadyExists);
                }
            }

            let Some(user) = store.users.iter_mut().find(|u| u.id == id) else {
                return Ok(None);
            };
            if assignments.is_empty() {
                return Ok(Some(user.clone()));
            }

            for (column, value) in assignments {
                match column {
                    "first_name" => user.first_name = value,
                    "last_name" => user.last_name = value,
                    "email" => user.email = value,
                    "company" => user.company = value,
                    "phone" => user.phone = value,
                    "message" => user.message = value,
                    _ => {}
                }
            }
            user.updated_at = Utc::now();

            Ok(Some(user.clone()))
        }

        async fn delete_user(&self, id: i64) -> RepositoryResult<bool> {
            self.check_available()?;
            let mut store = self.lock();
            let before = store.users.len();
            store.users.retain(|u| u.id != id);
            Ok(store.users.len() < before)
        }

        async fn count_users(&self) -> RepositoryResult<i64> {
            self.check_available()?;
            Ok(self.lock().users.len() as i64)
        }

        async fn search_users(&self, term: &str) -> RepositoryResult<Vec<User>> {
            self.check_available()?;
            let needle = term.to_lowercase();
            Ok(self.select(|u| {
                [&u.first_name, &u.last_name, &u.email, &u.company]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            }))
        }

        async fn list_by_company(&self, company: &str) -> RepositoryResult<Vec<User>> {
            self.check_available()?;
            Ok(self.select(|u| u.company == company))
        }

        async fn list_recent(&self, days: u32) -> RepositoryResult<Vec<User>> {
            self.check_available()?;
            let since = Utc::now() - Duration::days(i64::from(days));
            Ok(self.select(|u| u.created_at >= since))
        }

        async fn count_recent(&self, days: u32) -> RepositoryResult<i64> {
            Ok(self.list_recent(days).await?.len() as i64)
        }

        async fn company_counts(&self) -> RepositoryResult<Vec<CompanyCount>> {
            self.check_available()?;
            let mut groups: Vec<(String, i64, DateTime<Utc>)> = Vec::new();
            for user in &self.lock().users {
                match groups.iter_mut().find(|(name, _, _)| *name == user.company) {
                    Some((_, count, latest)) => {
                        *count += 1;
                        *latest = (*latest).max(user.created_at);
                    }
                    None => groups.push((user.company.clone(), 1, user.created_at)),
                }
            }
            groups.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));

            Ok(groups
                .into_iter()
                .map(|(name, count, _)| CompanyCount { name, count })
                .collect())
        }
    }

    /// A valid lead whose email is derived from `tag`.
    pub fn new_user(tag: &str, company: &str) -> NewUser {
        NewUser {
            first_name: "Test".to_string(),
            last_name: format!("User{tag}"),
            email: format!("{tag}@example.com"),
            company: company.to_string(),
            phone: "+1 555 0100".to_string(),
            message: String::new(),
        }
    }

    pub fn test_router_options() -> RouterOptions {
        RouterOptions {
            static_dir: None,
            debug_endpoints: true,
            production: false,
        }
    }

    pub fn test_state(repository: Arc<dyn UserRepository>) -> AppState {
        AppState::new(repository, LogBuffer::default())
    }

    /// Router over a fresh in-memory store, with the store handed back for
    /// seeding and inspection.
    pub fn test_app() -> (Router, Arc<InMemoryUserRepository>) {
        let repository = Arc::new(InMemoryUserRepository::new());
        let app = test_app_with_state(test_state(repository.clone()));
        (app, repository)
    }

    pub fn test_app_with_state(state: AppState) -> Router {
        build_router(state, &test_router_options())
    }

    /// Connects to `TEST_DATABASE_URL`, creates the schema and empties the
    /// table. `None` when the variable is unset.
    pub async fn create_test_db() -> Result<Option<PgPool>, sqlx::Error> {
        let Ok(url) = std::env::var(TEST_DATABASE_URL_VAR) else {
            return Ok(None);
        };

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        db::ensure_schema(&pool).await?;
        reset_users(&pool).await?;

        Ok(Some(pool))
    }

    pub async fn reset_users(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::query("TRUNCATE users RESTART IDENTITY")
            .execute(pool)
            .await?;
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn update_of_missing_row_is_none_even_with_taken_email() {
            let repository = InMemoryUserRepository::new();
            repository.insert_days_ago(new_user("taken", "Acme"), 1);

            let patch = UserPatch {
                email: Some("taken@example.com".to_string()),
                ..Default::default()
            };

            assert!(repository.update_user(999, &patch).await.unwrap().is_none());
        }

        #[tokio::test]
        async fn update_to_another_rows_email_is_rejected() {
            let repository = InMemoryUserRepository::new();
            repository.insert_days_ago(new_user("taken", "Acme"), 2);
            let other = repository.insert_days_ago(new_user("other", "Acme"), 1);

            let patch = UserPatch {
                email: Some("TAKEN@example.com".to_string()),
                ..Default::default()
            };

            assert!(matches!(
                repository.update_user(other.id, &patch).await,
                Err(RepositoryError::AlreadyExists)
            ));
        }
    }
}
