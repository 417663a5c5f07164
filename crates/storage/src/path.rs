//! Library-relative path handling.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Resolve a library-relative path to its normal form.
///
/// `.` and empty segments vanish and `..` is resolved lexically, as long as
/// it never climbs above the library root. Absolute paths, drive prefixes,
/// NUL bytes and paths that resolve to the root itself are rejected with
/// [`InvalidPath`](crate::error::ErrorKind::InvalidPath).
///
/// ```
/// use std::path::Path;
/// use shuffler_storage::validate_path;
/// assert_eq!(
///     validate_path("shown/../upcoming/./4-cats//tabby.jpg").unwrap(),
///     Path::new("upcoming/4-cats/tabby.jpg")
/// );
/// assert!(validate_path("upcoming/../../outside.jpg").is_err());
/// assert!(validate_path("/upcoming/4-cats").is_err());
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let invalid = || ErrorKind::InvalidPath(path.to_path_buf());
    let mut resolved = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(segment) if segment.as_encoded_bytes().contains(&0) => exn::bail!(invalid()),
            Component::Normal(segment) => resolved.push(segment),
            Component::CurDir => {},
            Component::ParentDir if resolved.pop() => {},
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => exn::bail!(invalid()),
        }
    }
    if resolved.as_os_str().is_empty() {
        exn::bail!(invalid());
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::image("upcoming/4-cats/tabby.jpg", "upcoming/4-cats/tabby.jpg")]
    #[case::pool("shown/", "shown")]
    #[case::nested("upcoming/1/holiday/beach.png", "upcoming/1/holiday/beach.png")]
    #[case::dots_and_doubles("./upcoming//not-shown/./a.gif", "upcoming/not-shown/a.gif")]
    #[case::sibling_pool("upcoming/../shown/2-dogs", "shown/2-dogs")]
    #[case::hidden(".trash-notes", ".trash-notes")]
    fn test_resolves(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(validate(input).unwrap(), Path::new(expected));
    }

    #[rstest]
    #[case::escapes_root("../shown/1/a.jpg")]
    #[case::escapes_after_descent("upcoming/../../a.jpg")]
    #[case::absolute("/mock/upcoming/1/a.jpg")]
    #[case::nul("upcoming/1/a\0.jpg")]
    #[case::empty("")]
    #[case::root_itself("upcoming/..")]
    #[case::only_dots("./.")]
    fn test_rejects(#[case] input: &str) {
        let err = validate(input).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }
}
