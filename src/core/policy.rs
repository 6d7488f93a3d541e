//! Orphan placement policy
//!
//! Entries found in `lib64` that no package owns have no recorded role. This
//! heuristic decides where they go: names that look like libraries, objects
//! or archives stay in `lib64`, everything else moves to the new `lib`.
//! It is a policy decision, not something derived from the package database.

use std::path::Path;

/// Extensions of files that belong to the primary architecture
const ARCHLIB_EXTENSIONS: &[&str] = &["a", "chk", "la", "so"];

/// Directory names that always stay in `lib64`
const ARCHLIB_NAMES: &[&str] = &["locale", "perl5"];

/// Check whether an unowned top-level name should stay in `lib64`
pub fn is_archlib_name(name: &str) -> bool {
    let has_archlib_extension = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ARCHLIB_EXTENSIONS.contains(&ext));

    has_archlib_extension || name.contains(".so.") || ARCHLIB_NAMES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_library_names_stay() {
        assert!(is_archlib_name("libfoo.so"));
        assert!(is_archlib_name("libfoo.so.1"));
        assert!(is_archlib_name("libfoo.so.1.2.3"));
        assert!(is_archlib_name("libfoo.a"));
        assert!(is_archlib_name("libfoo.la"));
        assert!(is_archlib_name("libfoo.chk"));
    }

    #[test]
    fn test_allow_listed_directories_stay() {
        assert!(is_archlib_name("locale"));
        assert!(is_archlib_name("perl5"));
    }

    #[test]
    fn test_other_names_move() {
        assert!(!is_archlib_name("cache"));
        assert!(!is_archlib_name(".keep"));
        assert!(!is_archlib_name("python3.12"));
        assert!(!is_archlib_name("perl"));
        assert!(!is_archlib_name("libfoo.sol"));
        assert!(!is_archlib_name("so"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(
            crate::config::defaults::MIN_PROPTEST_ITERATIONS
        ))]

        #[test]
        fn test_versioned_shared_objects_stay(stem in "[a-z][a-z0-9_-]{0,12}", major in 0u32..100) {
            let name = format!("lib{stem}.so.{major}");
            prop_assert!(is_archlib_name(&name));
        }

        #[test]
        fn test_plain_words_move(word in "[a-z]{1,12}") {
            prop_assume!(!ARCHLIB_NAMES.contains(&word.as_str()));
            prop_assert!(!is_archlib_name(&word));
        }
    }
}
