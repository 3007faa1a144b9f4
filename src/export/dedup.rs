//! Root name collision check.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::util::{strip_path_namespaces, DagPath, Error, Result, PATH_SEPARATOR};

/// Fail if two roots would land on the same archive path.
///
/// Names are compared without the leading separator and, when
/// `strip_depth > 0`, with that many namespace qualifiers removed from every
/// component.
pub fn check_no_duplicates(paths: &[DagPath], strip_depth: u32) -> Result<()> {
    let mut roots: HashMap<String, &DagPath> = HashMap::new();
    for path in paths {
        let full = path.full_path_name();
        let trimmed = full.strip_prefix(PATH_SEPARATOR).unwrap_or(&full);
        let key = strip_path_namespaces(trimmed, strip_depth);

        match roots.entry(key) {
            Entry::Occupied(seen) => {
                return Err(Error::DuplicateRoot {
                    path_a: full.clone(),
                    path_b: seen.get().full_path_name(),
                    stripped: *seen.get() != path,
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(path);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(p: &[&str]) -> Vec<DagPath> {
        p.iter().map(|s| DagPath::parse(s)).collect()
    }

    #[test]
    fn test_distinct_roots() {
        assert!(check_no_duplicates(&paths(&["|a", "|b", "|a|c"]), 0).is_ok());
        assert!(check_no_duplicates(&paths(&["|ns1:a", "|ns2:a"]), 0).is_ok());
        assert!(check_no_duplicates(&[], 3).is_ok());
    }

    #[test]
    fn test_plain_duplicate() {
        let err = check_no_duplicates(&paths(&["|a", "|b", "|a"]), 0).unwrap_err();
        match err {
            Error::DuplicateRoot { path_a, path_b, stripped } => {
                assert_eq!(path_a, "|a");
                assert_eq!(path_b, "|a");
                assert!(!stripped);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_duplicate_after_stripping() {
        let err = check_no_duplicates(&paths(&["|ns1:grp|ns1:obj", "|ns2:grp|ns2:obj"]), 1).unwrap_err();
        assert!(matches!(err, Error::DuplicateRoot { stripped: true, .. }));
        assert!(err.to_string().contains("|ns2:grp|ns2:obj"));
        assert!(err.to_string().contains("namespace stripping"));
    }
}
