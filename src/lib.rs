// lib.rs
// Library surface shared by the server binary and the integration tests.

pub mod clock;
pub mod drafts;
pub mod models;
pub mod overdue;
pub mod reconcile;
pub mod routes;
pub mod state;
