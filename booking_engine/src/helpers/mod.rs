mod dates;
mod passwords;

pub use dates::parse_schedule_date;
pub use passwords::{hash_password, verify_password, PasswordError};
