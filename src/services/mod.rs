pub mod contact_service;
pub mod lead_service;

pub use contact_service::{ContactError, ContactRequest, ContactService, ContactSubmission};
pub use lead_service::{
    HealthReport, HealthStatus, LeadService, LeadServiceError, LeadStats, ListQuery,
    RegistrationRequest, UserPage,
};
