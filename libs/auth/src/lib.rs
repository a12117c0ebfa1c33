//! Session handling and form validation for the PickMe client

pub mod error;
pub mod session;
pub mod validation;

pub use error::{AuthError, AuthResult};
pub use session::SessionManager;
