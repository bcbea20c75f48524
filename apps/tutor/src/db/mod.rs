//! Local SQLite storage.

pub mod date_utils;
pub mod error;
pub mod repository;
pub mod schema;

pub use error::DbError;
pub use repository::{
    NewTerm, ProfileRepository, ProgressRepository, SqliteRepository, TermRepository,
    Transactional,
};
