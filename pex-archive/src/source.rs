// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::{error::ArchiveError, path::normalize},
    std::{
        fs::File,
        io::{Read, Seek},
        path::{Path, PathBuf},
    },
};

/// Permissions given to merged members whose source records none.
const DEFAULT_MODE: u32 = 0o644;

/// A file read out of a [MergeSource].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SourceMember {
    pub path: String,
    pub data: Vec<u8>,
    pub mode: u32,
}

/// An existing zip archive whose members are folded into an [crate::Archive].
///
/// The archive may be preceded by arbitrary bytes, so an executable that
/// carries a zip payload at its end is a valid source.
pub struct MergeSource<R: Read + Seek> {
    path: PathBuf,
    archive: zip::ZipArchive<R>,
}

impl MergeSource<File> {
    /// Open a zip archive on the filesystem.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        let fh = File::open(path).map_err(|e| wrap(path, e.into()))?;

        Self::from_reader(path, fh)
    }
}

impl<R: Read + Seek> MergeSource<R> {
    /// Construct an instance from a reader.
    ///
    /// `path` is only used to describe the source in errors and log messages.
    pub fn from_reader(path: impl AsRef<Path>, reader: R) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        let archive = zip::ZipArchive::new(reader).map_err(|e| wrap(path, e.into()))?;

        Ok(Self {
            path: path.to_path_buf(),
            archive,
        })
    }

    /// The path this source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries in the source, including directories.
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// Read every file entry accepted by `filter`, in archive order.
    ///
    /// Directory entries are skipped. Nothing is returned unless every
    /// accepted entry could be read.
    pub fn read_members(
        &mut self,
        filter: impl Fn(&str) -> bool,
    ) -> Result<Vec<SourceMember>, ArchiveError> {
        let mut members = Vec::new();

        for i in 0..self.archive.len() {
            let mut zf = self
                .archive
                .by_index(i)
                .map_err(|e| wrap(&self.path, e.into()))?;

            if zf.is_dir() {
                continue;
            }

            let path = normalize(zf.name()).to_string();
            if !filter(&path) {
                continue;
            }

            let mut data = Vec::new();
            zf.read_to_end(&mut data)
                .map_err(|e| wrap(&self.path, e.into()))?;

            let mode = zf
                .unix_mode()
                .map(|mode| mode & 0o777)
                .filter(|mode| *mode != 0)
                .unwrap_or(DEFAULT_MODE);

            members.push(SourceMember { path, data, mode });
        }

        Ok(members)
    }
}

fn wrap(path: &Path, source: ArchiveError) -> ArchiveError {
    ArchiveError::MergeSource {
        path: path.to_path_buf(),
        source: Box::new(source),
    }
}
