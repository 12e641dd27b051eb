pub mod user;

pub use user::{
    normalize_email, CompanyCount, NewUser, User, UserListing, UserPatch, UserSummary,
};
