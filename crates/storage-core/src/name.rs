//! Entry name validation and `/`-separated path helpers

use crate::{Error, Result};

/// Check that `name` can be used as a single path segment.
///
/// Rejects empty names, `.` and `..`, and anything containing a path
/// separator or a NUL byte.
pub fn validate_entry_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);

    if invalid {
        return Err(Error::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Split a `/`-separated path into segments, dropping empty components.
///
/// Backslashes are treated as separators too, so `"src\\top.v"` and
/// `"/src/top.v"` both yield `["src", "top.v"]`.
pub fn split_path(path: &str) -> Vec<String> {
    path.split(['/', '\\'])
        .filter(|segment| !segment.is_empty())
        .map(String::from)
        .collect()
}

/// Render segments as a `/`-joined string for messages.
pub fn join_path<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("/")
}

/// Extension as consumers dispatch on it: everything after the first `.`,
/// or the whole name when there is no `.`.
pub fn extension_of(name: &str) -> &str {
    match name.find('.') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("design.v")]
    #[case(".gitignore")]
    #[case("README")]
    #[case("with space")]
    fn accepts_plain_names(#[case] name: &str) {
        assert!(validate_entry_name(name).is_ok());
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("..")]
    #[case("a/b")]
    #[case("a\\b")]
    #[case("nul\0byte")]
    fn rejects_path_like_names(#[case] name: &str) {
        let err = validate_entry_name(name).unwrap_err();
        assert!(matches!(err, Error::InvalidName { .. }));
    }

    #[test]
    fn split_path_drops_empty_segments() {
        assert_eq!(split_path("/src//top.v/"), vec!["src", "top.v"]);
        assert_eq!(split_path("src\\top.v"), vec!["src", "top.v"]);
        assert!(split_path("/").is_empty());
    }

    #[test]
    fn join_path_uses_forward_slashes() {
        assert_eq!(join_path(&["a", "b", "c"]), "a/b/c");
        assert_eq!(join_path::<&str>(&[]), "");
    }

    #[rstest]
    #[case("a.b.c", "b.c")]
    #[case("README", "README")]
    #[case("top.v", "v")]
    #[case(".gitignore", "gitignore")]
    #[case("trailing.", "")]
    fn extension_after_first_dot(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(extension_of(name), expected);
    }
}
