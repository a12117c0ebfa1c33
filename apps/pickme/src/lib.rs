//! PickMe client: session-aware pages over the REST API
//!
//! [`AppState`] ties the API client to the session, the router and the
//! notice area; the modules under [`views`] hold one page each.

pub mod error;
pub mod notify;
pub mod router;
pub mod state;
pub mod views;

pub use error::{AppError, AppResult};
pub use notify::{Level, Notice, Notifications};
pub use router::{Navigator, Route, SessionSignal};
pub use state::AppState;
