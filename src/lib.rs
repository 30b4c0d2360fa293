//! O2D dashboard: the "O2D Client for Osaa Retail" Google Sheet served as a
//! date-filtered sales dashboard.
//!
//! Startup authenticates against Google, fetches the sheet once and
//! normalizes it into an immutable [`table::SalesTable`]; the axum server then
//! answers every date-range change from that snapshot.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod google_api;
pub mod server;
pub mod startup;
pub mod table;
