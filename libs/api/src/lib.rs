//! REST client for the PickMe API
//!
//! The crate is layered:
//! - [`client`]: the authenticated request pipeline (bearer header,
//!   one refresh-and-replay on 401),
//! - [`services`]: one service per resource, mapping user actions to calls,
//! - [`pagination`]: fetch-more loading over paged list endpoints,
//! - [`models`]: wire payloads.

pub mod client;
pub mod error;
pub mod models;
pub mod pagination;
pub mod request;
pub mod services;

pub use client::{ApiClient, ApiClientBuilder, SessionExpiredHook};
pub use error::{ApiError, ApiResult, ErrorKind};
pub use pagination::Paginator;
pub use request::{ApiRequest, FormField, Upload};
pub use reqwest::StatusCode;
pub use services::{AuthService, GroupService, PostService, Services, UserService};
