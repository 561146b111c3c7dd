//! SQLite backend for the payment gateway engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
