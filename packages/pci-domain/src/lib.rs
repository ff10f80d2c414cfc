pub mod analysis;
pub mod dashboard;
pub mod date_serde;
pub mod entity;
pub mod note;
pub mod patient;
pub mod similarity;
pub mod text;

mod error;

pub use error::{Error, Result};
