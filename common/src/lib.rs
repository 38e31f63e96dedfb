//! Wire models shared between the sheet ingestion backend and its clients.

pub mod model;
pub mod requests;
pub mod responses;
