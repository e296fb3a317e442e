//! HTTP API for Space Nomad.
//!
//! ## Endpoints
//!
//! - `GET /` - Welcome message
//! - `GET /index` - Home page with mission counts and a fun fact
//! - `GET /news/` - News page shell
//! - `POST /update-missions/` - Start a background SpaceX sync
//! - `GET /missions/` - List missions (paginated, filterable, sortable)
//! - `POST /missions/` - Create a mission (400 if the name exists)
//! - `GET /spacex-launches/` - Cached SpaceX launch payload (404 if none)

mod error;
mod extract;
pub mod mission_store;
mod missions;
mod pages;
mod routes;
pub mod types;

pub use error::ApiError;
pub use routes::{router, serve, AppState};
