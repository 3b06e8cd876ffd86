// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::{
        bytecode::{BytecodeGeneration, BytecodeMagicClassifier},
        error::ArchiveError,
        path::{has_prefix, normalize},
        policy::MergePolicy,
        source::MergeSource,
    },
    linked_hash_map::LinkedHashMap,
    log::{debug, warn},
    simple_file_manifest::set_executable,
    std::{
        fs::File,
        io::{Read, Seek, Write},
        path::{Path, PathBuf},
    },
};

pub use zip::CompressionMethod;

/// Modified time written for every member: 2001-01-01 00:00:00.
///
/// Using a constant keeps archives byte-identical across builds.
pub const MODIFIED_TIME: (u16, u8, u8, u8, u8, u8) = (2001, 1, 1, 0, 0, 0);

#[derive(Clone, Debug)]
struct Member {
    data: Vec<u8>,
    mode: u32,
}

/// A zip archive under construction.
///
/// Members are held in memory in insertion order and written out by
/// [Archive::finish]. Raw preamble bytes can be written to the output file
/// ahead of the zip structure; zip readers locate the central directory by
/// scanning backwards from the end of the file, so the result is both a
/// valid zip file and whatever the preamble makes it (a shebang script or
/// a native executable).
///
/// If an instance is dropped without being finished, the partially written
/// output file is removed.
pub struct Archive {
    path: PathBuf,
    file: File,
    executable: bool,
    finished: bool,
    preamble_written: bool,
    members: LinkedHashMap<String, Member>,
    include: Vec<String>,
    exclude: Vec<String>,
    alignment: u16,
    compression_method: CompressionMethod,
    classifier: BytecodeMagicClassifier,
    bytecode_guard: Option<BytecodeGeneration>,
}

impl Archive {
    /// Create a new archive at the given path.
    ///
    /// The parent directory is created if necessary. If `executable` is set,
    /// the finished file is marked executable.
    pub fn create(path: impl AsRef<Path>, executable: bool) -> Result<Self, ArchiveError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            executable,
            finished: false,
            preamble_written: false,
            members: LinkedHashMap::new(),
            include: vec![],
            exclude: vec![],
            alignment: 0,
            compression_method: CompressionMethod::Stored,
            classifier: BytecodeMagicClassifier::default(),
            bytecode_guard: None,
        })
    }

    /// Path of the file being written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Restrict merged members to those at or under one of these paths.
    ///
    /// An empty list accepts everything. Members added directly via
    /// [Archive::write_member] are not filtered.
    pub fn set_include(&mut self, prefixes: Vec<String>) {
        self.include = prefixes;
    }

    /// Drop merged members at or under one of these paths.
    ///
    /// Exclusion takes precedence over inclusion.
    pub fn set_exclude(&mut self, prefixes: Vec<String>) {
        self.exclude = prefixes;
    }

    /// Align the data of stored members to a multiple of this many bytes.
    ///
    /// 0 disables alignment. Has no effect on compressed members.
    pub fn set_alignment(&mut self, alignment: u16) {
        self.alignment = alignment;
    }

    pub fn set_compression_method(&mut self, method: CompressionMethod) {
        self.compression_method = method;
    }

    /// Set the classifier used for the bytecode compatibility guard.
    pub fn set_bytecode_classifier(&mut self, classifier: BytecodeMagicClassifier) {
        self.classifier = classifier;
    }

    /// Only accept merged `.pyc` members of the given generation.
    pub fn set_bytecode_guard(&mut self, generation: Option<BytecodeGeneration>) {
        self.bytecode_guard = generation;
    }

    /// Write raw bytes ahead of the zip structure.
    ///
    /// Can be called at most once, and only before any member is written.
    pub fn write_preamble(&mut self, data: &[u8]) -> Result<(), ArchiveError> {
        self.check_preamble_allowed()?;

        self.file.write_all(data)?;
        self.preamble_written = true;

        Ok(())
    }

    /// Write the preamble by copying the content of a reader.
    pub fn write_preamble_from_reader(
        &mut self,
        reader: &mut impl Read,
    ) -> Result<u64, ArchiveError> {
        self.check_preamble_allowed()?;

        let size = std::io::copy(reader, &mut self.file)?;
        self.preamble_written = true;

        Ok(size)
    }

    fn check_preamble_allowed(&self) -> Result<(), ArchiveError> {
        if self.preamble_written {
            return Err(ArchiveError::PreambleAlreadyWritten);
        }
        if let Some(first) = self.members.keys().next() {
            return Err(ArchiveError::PreambleAfterMember(first.clone()));
        }

        Ok(())
    }

    /// Add a member to the archive.
    ///
    /// If a member with the same path already exists, the merge policy for
    /// the path decides the outcome: the new content is either dropped or
    /// appended to the existing member. Returns whether the content was kept.
    pub fn write_member(&mut self, path: &str, data: Vec<u8>, mode: u32) -> bool {
        let path = normalize(path);

        match self.members.get_mut(path) {
            None => {
                self.members.insert(path.to_string(), Member { data, mode });
                true
            }
            Some(existing) => match MergePolicy::for_path(path) {
                MergePolicy::ReplaceOnce => {
                    debug!("ignoring duplicate member {}", path);
                    false
                }
                MergePolicy::Concatenate => {
                    debug!("concatenating duplicate member {}", path);
                    existing.data.extend(data);
                    true
                }
            },
        }
    }

    /// Whether a member with this path has been written.
    pub fn contains(&self, path: &str) -> bool {
        self.members.contains_key(normalize(path))
    }

    /// Obtain the content of a member.
    pub fn member_data(&self, path: &str) -> Option<&[u8]> {
        self.members.get(normalize(path)).map(|m| m.data.as_slice())
    }

    /// Paths of all members, in the order they will be written.
    pub fn member_paths(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn accepts_merged(&self, path: &str) -> bool {
        if self.exclude.iter().any(|prefix| has_prefix(path, prefix)) {
            return false;
        }

        self.include.is_empty() || self.include.iter().any(|prefix| has_prefix(path, prefix))
    }

    fn bytecode_compatible(&self, path: &str, data: &[u8]) -> bool {
        match self.bytecode_guard {
            Some(target) if path.ends_with(".pyc") => {
                let generation = self.classifier.classify(data);
                if generation != target {
                    warn!(
                        "dropping {}: bytecode is {:?}, expected {:?}",
                        path, generation, target
                    );
                }
                generation == target
            }
            _ => true,
        }
    }

    /// Fold every file of another archive into this one.
    ///
    /// Members are processed in the source's order, subject to the include
    /// and exclude filters and the bytecode guard. The source is read in
    /// full before anything is added, so a read failure leaves this archive
    /// unchanged.
    pub fn merge_archive<R: Read + Seek>(
        &mut self,
        source: &mut MergeSource<R>,
    ) -> Result<usize, ArchiveError> {
        let members = source.read_members(|path| self.accepts_merged(path))?;
        let total = members.len();

        let mut kept = 0;
        for member in members {
            if !self.bytecode_compatible(&member.path, &member.data) {
                continue;
            }
            if self.write_member(&member.path, member.data, member.mode) {
                kept += 1;
            }
        }

        debug!(
            "merged {} of {} members from {}",
            kept,
            total,
            source.path().display()
        );

        Ok(kept)
    }

    /// Open a zip archive on the filesystem and merge it.
    pub fn merge_path(&mut self, path: impl AsRef<Path>) -> Result<usize, ArchiveError> {
        let mut source = MergeSource::open(path)?;

        self.merge_archive(&mut source)
    }

    /// Write the central directory and close the file.
    pub fn finish(mut self) -> Result<PathBuf, ArchiveError> {
        self.write_zip_data()?;

        if self.executable {
            set_executable(&mut self.file)?;
        }

        self.finished = true;

        Ok(self.path.clone())
    }

    /// Abandon the archive, removing the partially written file.
    pub fn discard(self) {}

    fn write_zip_data(&mut self) -> Result<(), ArchiveError> {
        let (year, month, day, hour, minute, second) = MODIFIED_TIME;
        let modified_time =
            zip::DateTime::from_date_and_time(year, month, day, hour, minute, second)
                .map_err(|_| ArchiveError::ModifiedTime)?;

        {
            let mut zf = zip::ZipWriter::new(&mut self.file);

            for (path, member) in self.members.iter() {
                let options = zip::write::FileOptions::default()
                    .compression_method(self.compression_method)
                    .unix_permissions(member.mode)
                    .last_modified_time(modified_time);

                if self.alignment > 1 && self.compression_method == CompressionMethod::Stored {
                    zf.start_file_aligned(path, options, self.alignment)?;
                } else {
                    zf.start_file(path, options)?;
                }
                zf.write_all(&member.data)?;
            }

            zf.finish()?;
        }

        self.file.flush()?;

        Ok(())
    }
}

impl Drop for Archive {
    fn drop(&mut self) {
        if !self.finished {
            debug!("removing unfinished archive {}", self.path.display());
            let _ = std::fs::remove_file(&self.path);
        }
    }
}
