//! ID generation utilities.

use ulid::Ulid;
use uuid::Uuid;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs are lexicographically sortable and monotonically increasing
    /// within the same millisecond, which keeps primary-key indexes dense.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate an opaque bearer token.
    #[must_use]
    pub fn generate_token(&self) -> String {
        // UUID v4 for tokens (no time component)
        Uuid::new_v4().simple().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique_and_sortable() {
        let id_gen = IdGenerator::new();
        let id1 = id_gen.generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = id_gen.generate();

        assert_ne!(id1, id2);
        assert!(id1 < id2);
        assert_eq!(id1.len(), 26);
    }

    #[test]
    fn tokens_have_no_dashes() {
        let token = IdGenerator::new().generate_token();
        assert_eq!(token.len(), 32);
        assert!(!token.contains('-'));
    }
}
