// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! How conflicting member paths are merged. */

use crate::path::basename;

/// What to do when a member path is written more than once.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MergePolicy {
    /// The first writer wins. Later content is dropped.
    ReplaceOnce,
    /// Every occurrence is appended, in the order encountered.
    Concatenate,
}

/// Basenames of files that multiple libraries contribute fragments to.
///
/// Akka-style `reference.conf` files are merged by the runtime from every
/// fragment on the classpath, so all of them must survive.
static SPECIAL_FILES: &[(&str, MergePolicy)] = &[("reference.conf", MergePolicy::Concatenate)];

impl MergePolicy {
    /// Resolve the policy for a member path.
    pub fn for_path(path: &str) -> Self {
        let name = basename(path);

        SPECIAL_FILES
            .iter()
            .find(|(special, _)| *special == name)
            .map(|(_, policy)| *policy)
            .unwrap_or(Self::ReplaceOnce)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_to_replace_once() {
        assert_eq!(MergePolicy::for_path("file1"), MergePolicy::ReplaceOnce);
        assert_eq!(
            MergePolicy::for_path(".bootstrap/six.py"),
            MergePolicy::ReplaceOnce
        );
        assert_eq!(
            MergePolicy::for_path("reference.conf.bak"),
            MergePolicy::ReplaceOnce
        );
    }

    #[test]
    fn reference_conf() {
        assert_eq!(
            MergePolicy::for_path("reference.conf"),
            MergePolicy::Concatenate
        );
        assert_eq!(
            MergePolicy::for_path("./lib/akka/reference.conf"),
            MergePolicy::Concatenate
        );
    }
}
