// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Identity of archive member paths.

Member paths are logical identifiers, not filesystem paths. The only
normalization performed is stripping a single leading `./`. In particular
`/a` and `./a` are different members.
*/

/// Normalize a member path into the form stored in an archive.
pub fn normalize(path: &str) -> &str {
    path.strip_prefix("./").unwrap_or(path)
}

/// Whether two member paths denote the same archive member.
pub fn same_paths(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Whether `path` is `prefix` or lives underneath it.
pub fn has_prefix(path: &str, prefix: &str) -> bool {
    let path = normalize(path);
    let prefix = normalize(prefix).trim_end_matches('/');

    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// The final component of a member path.
pub fn basename(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((_, name)) => name,
        None => path,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn same() {
        assert!(same_paths("a", "a"));
        assert!(same_paths("a", "./a"));
        assert!(same_paths("/a", "/a"));
        assert!(!same_paths("/a", "./a"));
        assert!(!same_paths("a", "b"));
    }

    #[test]
    fn single_dot_slash_only() {
        assert!(same_paths("foo/bar.py", "./foo/bar.py"));
        assert!(!same_paths("foo", "././foo"));
        assert!(!same_paths("Foo", "foo"));
    }

    #[test]
    fn absolute_never_matches_relative() {
        for p in ["a", "dir/file.py", ".bootstrap/plz.py"] {
            assert!(same_paths(p, &format!("./{}", p)));
            assert!(!same_paths(&format!("/{}", p), &format!("./{}", p)));
        }
    }

    #[test]
    fn prefix() {
        assert!(has_prefix(".bootstrap/portalocker", ".bootstrap/portalocker"));
        assert!(has_prefix(
            ".bootstrap/portalocker/__init__.py",
            ".bootstrap/portalocker"
        ));
        assert!(has_prefix("./.bootstrap/six.py", ".bootstrap/six.py"));
        assert!(has_prefix(".bootstrap/pytest/x.py", ".bootstrap/pytest/"));
        assert!(!has_prefix(".bootstrap/pytest_cov/x.py", ".bootstrap/pytest"));
        assert!(!has_prefix(".bootstrap", ".bootstrap/portalocker"));
    }

    #[test]
    fn basenames() {
        assert_eq!(basename("reference.conf"), "reference.conf");
        assert_eq!(basename("a/b/reference.conf"), "reference.conf");
        assert_eq!(basename("a/"), "");
    }
}
