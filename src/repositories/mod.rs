pub mod user_repository;

pub use user_repository::{PgUserRepository, RepositoryError, RepositoryResult, UserRepository};
