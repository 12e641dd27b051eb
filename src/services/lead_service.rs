use crate::models::user::{normalize_email, CompanyCount, NewUser, User, UserPatch};
use crate::repositories::user_repository::{RepositoryError, UserRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Window used by the admin statistics.
pub const STATS_WINDOW_DAYS: u32 = 30;
pub const DEFAULT_RECENT_DAYS: i64 = 30;
pub const MAX_RECENT_DAYS: i64 = 3650;

/// Column widths of the `users` table, in characters.
pub const MAX_TEXT_LEN: usize = 255;
pub const MAX_PHONE_LEN: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum LeadServiceError {
    #[error("All required fields must be provided")]
    MissingFields,
    #[error("{0}")]
    InvalidArgument(String),
    #[error("An account with this email already exists")]
    EmailTaken,
    #[error("User not found")]
    UserNotFound,
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

/// Registration form as posted by the website.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
}

impl RegistrationRequest {
    /// Trims every field and lower-cases the email. Absent, empty and
    /// whitespace-only values count as missing.
    pub fn into_new_user(self) -> Result<NewUser, LeadServiceError> {
        let (Some(first_name), Some(last_name), Some(email), Some(company), Some(phone)) = (
            required(self.first_name),
            required(self.last_name),
            required(self.email),
            required(self.company),
            required(self.phone),
        ) else {
            return Err(LeadServiceError::MissingFields);
        };

        let new_user = NewUser {
            first_name,
            last_name,
            email: normalize_email(&email),
            company,
            phone,
            message: self
                .message
                .map(|m| m.trim().to_string())
                .unwrap_or_default(),
        };

        check_lengths([
            ("firstName", new_user.first_name.as_str()),
            ("lastName", new_user.last_name.as_str()),
            ("email", new_user.email.as_str()),
            ("company", new_user.company.as_str()),
            ("phone", new_user.phone.as_str()),
        ])?;

        Ok(new_user)
    }
}

fn column_limit(field: &str) -> usize {
    if field == "phone" {
        MAX_PHONE_LEN
    } else {
        MAX_TEXT_LEN
    }
}

/// Rejects values the `users` columns cannot hold, before they reach the store.
fn check_lengths<'a>(
    fields: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<(), LeadServiceError> {
    for (field, value) in fields {
        let limit = column_limit(field);
        if value.chars().count() > limit {
            return Err(LeadServiceError::InvalidArgument(format!(
                "{field} must be at most {limit} characters"
            )));
        }
    }
    Ok(())
}

fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub search: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Error,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthStatus,
    pub message: String,
    pub user_count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeadStats {
    pub total: i64,
    pub last_30_days: i64,
    pub average_per_day: f64,
}

pub struct LeadService {
    repository: Arc<dyn UserRepository>,
}

impl LeadService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    pub async fn register(&self, request: RegistrationRequest) -> Result<User, LeadServiceError> {
        let new_user = request.into_new_user()?;

        if self
            .repository
            .find_by_email(&new_user.email)
            .await?
            .is_some()
        {
            return Err(LeadServiceError::EmailTaken);
        }

        // The pre-check can race with a concurrent registration; the unique
        // constraint decides the winner.
        match self.repository.create_user(&new_user).await {
            Ok(user) => Ok(user),
            Err(RepositoryError::AlreadyExists) => Err(LeadServiceError::EmailTaken),
            Err(e) => Err(LeadServiceError::RepositoryError(e)),
        }
    }

    pub async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, LeadServiceError> {
        Ok(self.repository.find_by_id(id).await?)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, LeadServiceError> {
        Ok(self.repository.find_by_email(email).await?)
    }

    /// `search` wins over `company`; blank filters are ignored.
    pub async fn list(&self, query: ListQuery) -> Result<UserPage, LeadServiceError> {
        // Blank terms are ignored; non-blank ones are matched exactly as given.
        let search = query.search.as_deref().filter(|s| !s.trim().is_empty());
        let company = query.company.as_deref().filter(|c| !c.trim().is_empty());

        let users = if let Some(term) = search {
            self.repository.search_users(term).await?
        } else if let Some(company) = company {
            self.repository.list_by_company(company).await?
        } else {
            self.repository.list_users(query.limit, query.offset).await?
        };

        let total = self.repository.count_users().await?;

        Ok(UserPage { users, total })
    }

    pub async fn update(&self, id: i64, patch: UserPatch) -> Result<User, LeadServiceError> {
        let assignments = patch.assignments();
        check_lengths(assignments.iter().filter_map(|(column, value)| {
            let field = match *column {
                "first_name" => "firstName",
                "last_name" => "lastName",
                "email" => "email",
                "company" => "company",
                "phone" => "phone",
                _ => return None,
            };
            Some((field, value.as_str()))
        }))?;

        match self.repository.update_user(id, &patch).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(LeadServiceError::UserNotFound),
            Err(RepositoryError::AlreadyExists) => Err(LeadServiceError::EmailTaken),
            Err(e) => Err(LeadServiceError::RepositoryError(e)),
        }
    }

    pub async fn delete(&self, id: i64) -> Result<(), LeadServiceError> {
        if self.repository.delete_user(id).await? {
            Ok(())
        } else {
            Err(LeadServiceError::UserNotFound)
        }
    }

    pub async fn count(&self) -> Result<i64, LeadServiceError> {
        Ok(self.repository.count_users().await?)
    }

    /// Never fails: an unreachable store is reported, not raised.
    pub async fn health(&self) -> HealthReport {
        match self.repository.count_users().await {
            Ok(count) => HealthReport {
                status: HealthStatus::Healthy,
                message: "Database connection successful".to_string(),
                user_count: count,
            },
            Err(e) => {
                tracing::error!(error = %e, "Database health check failed");
                HealthReport {
                    status: HealthStatus::Error,
                    message: "Database connection failed".to_string(),
                    user_count: 0,
                }
            }
        }
    }

    pub async fn stats(&self) -> Result<LeadStats, LeadServiceError> {
        let total = self.repository.count_users().await?;
        let last_30_days = self.repository.count_recent(STATS_WINDOW_DAYS).await?;
        let average_per_day =
            (last_30_days as f64 / f64::from(STATS_WINDOW_DAYS) * 100.0).round() / 100.0;

        Ok(LeadStats {
            total,
            last_30_days,
            average_per_day,
        })
    }

    /// Leads created in the trailing window; `days` defaults to 30, and so does 0.
    pub async fn recent(&self, days: Option<i64>) -> Result<(u32, Vec<User>), LeadServiceError> {
        let days = recent_window(days)?;
        let users = self.repository.list_recent(days).await?;
        Ok((days, users))
    }

    pub async fn search(&self, term: &str) -> Result<Vec<User>, LeadServiceError> {
        if term.trim().is_empty() {
            return Err(LeadServiceError::InvalidArgument(
                "Search term is required".to_string(),
            ));
        }
        Ok(self.repository.search_users(term).await?)
    }

    pub async fn companies(&self) -> Result<Vec<CompanyCount>, LeadServiceError> {
        Ok(self.repository.company_counts().await?)
    }
}

pub fn recent_window(days: Option<i64>) -> Result<u32, LeadServiceError> {
    let days = match days {
        None | Some(0) => DEFAULT_RECENT_DAYS,
        Some(days) => days,
    };
    if !(1..=MAX_RECENT_DAYS).contains(&days) {
        return Err(LeadServiceError::InvalidArgument(format!(
            "days must be between 1 and {MAX_RECENT_DAYS}"
        )));
    }
    u32::try_from(days).map_err(|_| {
        LeadServiceError::InvalidArgument(format!("days must be between 1 and {MAX_RECENT_DAYS}"))
    })
}
