pub mod password;
pub mod session_token;

pub use password::{hash_password, verify_password};
pub use session_token::generate_session_token;
