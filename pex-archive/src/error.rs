// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {std::path::PathBuf, thiserror::Error};

/// Errors raised while assembling an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("preamble must be written before any member (first member: {0})")]
    PreambleAfterMember(String),

    #[error("preamble has already been written")]
    PreambleAlreadyWritten,

    #[error("unable to read merge source {}: {source}", path.display())]
    MergeSource {
        path: PathBuf,
        #[source]
        source: Box<ArchiveError>,
    },

    #[error("could not convert modified time to a zip timestamp")]
    ModifiedTime,
}
