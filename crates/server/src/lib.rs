pub mod error;
pub mod poster;
pub mod routes;
pub mod state;
