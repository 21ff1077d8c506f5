//! HTTP surface for the Notekeep Note Store.

pub mod api;

pub use api::{router, AppState, SaveConfirmation, SaveFailure, ERROR_DETAIL_HEADER};
