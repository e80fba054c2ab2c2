//! Test support for the geography crates.
//!
//! `TestDatabase` (feature `postgres`) starts a migrated PostgreSQL container.
//! `TestDataBuilder` hands out locality ids and place names that are stable
//! for a given test name and distinct between tests sharing one store.

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::TestDatabase;

use std::cell::Cell;
use std::hash::{DefaultHasher, Hash, Hasher};

pub struct TestDataBuilder {
    tag: u16,
    issued: Cell<u16>,
}

impl TestDataBuilder {
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let data = TestDataBuilder::from_test_name("test_create_locality");
    /// assert_ne!(data.locality_id(), data.locality_id());
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self {
            tag: (hasher.finish() % 10_000) as u16,
            issued: Cell::new(0),
        }
    }

    /// Postal-code style id, eight digits, new on every call
    pub fn locality_id(&self) -> String {
        let n = self.issued.get();
        self.issued.set(n.wrapping_add(1));
        format!("{:04}{:04}", self.tag, n % 10_000)
    }

    pub fn country(&self) -> String {
        format!("Country {}", self.tag)
    }

    pub fn province(&self) -> String {
        format!("Province {}", self.tag)
    }
}
