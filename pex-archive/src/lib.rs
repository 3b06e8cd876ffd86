// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Assemble self-executable zip archives.

This crate writes zip archives that may be prefixed by arbitrary bytes
(a shebang line or a native launcher) and that are built up by merging
the members of other, already-built zip archives. Path conflicts between
merged archives are resolved by a fixed per-file policy: most files are
kept from whichever archive contributed them first, while a handful of
configuration fragments are concatenated.

Everything written is reproducible: members are emitted in insertion
order and all carry the same fixed modification time.
*/

mod archive;
pub mod bytecode;
mod error;
pub mod path;
pub mod policy;
mod source;

pub use {
    archive::{Archive, CompressionMethod, MODIFIED_TIME},
    bytecode::{BytecodeGeneration, BytecodeMagicClassifier},
    error::ArchiveError,
    policy::MergePolicy,
    source::{MergeSource, SourceMember},
};
