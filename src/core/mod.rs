//! Business logic: draft lifecycle, batch reconciliation, conversation
//! orchestration, and the analysis worker.

pub mod batch;
pub mod classification;
pub mod dialog;
pub mod draft;
pub mod postback;
pub mod receipt;
pub mod session;
pub mod ttl;
pub mod user;
pub mod worker;
