pub mod admin_handlers;
pub mod contact_handlers;
pub mod debug_handlers;
pub mod register_handlers;

pub use admin_handlers::{database_action, database_health};
pub use contact_handlers::submit_contact_form;
pub use debug_handlers::{clear_server_logs, get_server_logs};
pub use register_handlers::{delete_registration, list_registrations, register_user};
