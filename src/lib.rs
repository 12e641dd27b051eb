pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use std::sync::Arc;

use logging::LogBuffer;
use repositories::UserRepository;
use services::{ContactService, LeadService};

#[derive(Clone)]
pub struct AppState {
    pub lead_service: Arc<LeadService>,
    pub contact_service: Arc<ContactService>,
    pub log_buffer: LogBuffer,
}

impl AppState {
    pub fn new(user_repository: Arc<dyn UserRepository>, log_buffer: LogBuffer) -> Self {
        Self {
            lead_service: Arc::new(LeadService::new(user_repository)),
            contact_service: Arc::new(ContactService::new()),
            log_buffer,
        }
    }
}
