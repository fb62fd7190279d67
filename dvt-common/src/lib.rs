//! # Drop Visuals Test Common Library
//!
//! Shared code for the survey and admin services including:
//! - Record types written to and read from the backend
//! - Session identifiers
//! - Configuration loading
//! - The persistence client (`SurveyStore`)
//! - Delimited-text export

pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod session_id;
pub mod store;

pub use error::{Error, Result};
pub use models::{Drop, Participant, Record, SurveyResponse};
pub use session_id::SessionId;
