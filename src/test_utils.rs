//! Test utilities for property-based testing
//!
//! This module provides generators and helpers for proptest.

#[cfg(test)]
pub mod generators {
    use proptest::collection::btree_set;
    use proptest::prelude::*;

    use crate::core::classify::PathSet;

    /// Generate a single path component (file or directory name)
    pub fn component() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z]{1,6}",
            "lib[a-z]{1,5}\\.so(\\.[0-9])?",
            "[a-z]{1,5}\\.(a|la|o)",
        ]
    }

    /// Generate a relative path of one to three components
    pub fn relative_path() -> impl Strategy<Value = String> {
        proptest::collection::vec(component(), 1..=3).prop_map(|parts| parts.join("/"))
    }

    /// Generate a small set of relative paths
    pub fn path_set() -> impl Strategy<Value = PathSet> {
        btree_set(relative_path(), 0..8)
    }

    /// Generate an absolute prefix
    pub fn prefix() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("/".to_string()),
            Just("/usr".to_string()),
            Just("/usr/local".to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(
            crate::config::defaults::MIN_PROPTEST_ITERATIONS
        ))]

        #[test]
        fn test_relative_path_generator(path in relative_path()) {
            prop_assert!(!path.is_empty());
            prop_assert!(!path.starts_with('/'));
            prop_assert!(path.split('/').all(|part| !part.is_empty()));
        }
    }
}
