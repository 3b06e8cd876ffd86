// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Where support libraries are merged from.

The tool is distributed with its own runtime-support payload (test
runners, file locking, debuggers) appended to its executable as a zip
archive. Building a `.pex` merges the needed subset of that payload.

A freshly compiled `please_pex` carries no payload. It is attached when
the tool is packaged, by concatenating the binary and a zip of the
`.bootstrap/` tree:

```text
cat target/release/please_pex bootstrap.zip > please_pex
chmod +x please_pex
```

Zip readers locate the central directory from the end of the file, so
the result is both a working executable and a readable zip. Builds from
an unpackaged binary must pass `--support_archive` (or `--zip_safe` with
no test runner or debugger libraries) instead.
*/

use {
    anyhow::{Context, Result},
    pex_archive::MergeSource,
    std::{fs::File, path::PathBuf},
};

/// Provides the archive that support libraries are merged from.
pub trait SupportArchiveProvider {
    /// Path to the archive.
    fn archive_path(&self) -> Result<PathBuf>;

    /// Open the archive as a merge source.
    fn open(&self) -> Result<MergeSource<File>> {
        let path = self.archive_path()?;

        MergeSource::open(&path)
            .with_context(|| format!("opening support archive {}", path.display()))
    }
}

/// The executable of the running process.
#[derive(Clone, Copy, Debug, Default)]
pub struct CurrentExecutable;

impl SupportArchiveProvider for CurrentExecutable {
    fn archive_path(&self) -> Result<PathBuf> {
        std::env::current_exe().context("resolving path of current executable")
    }
}

/// An explicitly specified archive.
#[derive(Clone, Debug)]
pub struct SupportArchive(pub PathBuf);

impl SupportArchiveProvider for SupportArchive {
    fn archive_path(&self) -> Result<PathBuf> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod test {
    use {super::*, std::io::Write, tempfile::TempDir};

    #[test]
    fn explicit_archive() -> Result<()> {
        let td = TempDir::new()?;
        let path = td.path().join("support.zip");

        let mut zf = zip::ZipWriter::new(File::create(&path)?);
        zf.start_file(".bootstrap/six.py", zip::write::FileOptions::default())?;
        zf.write_all(b"six")?;
        zf.finish()?;

        let mut source = SupportArchive(path.clone()).open()?;
        assert_eq!(source.path(), path.as_path());
        assert_eq!(source.read_members(|_| true)?.len(), 1);

        Ok(())
    }

    #[test]
    fn payload_appended_to_executable() -> Result<()> {
        let td = TempDir::new()?;
        let path = td.path().join("please_pex");

        let mut fh = File::create(&path)?;
        fh.write_all(b"\x7fELF\x02\x01\x01\x00 native code")?;
        {
            let mut zf = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
            zf.start_file(
                ".bootstrap/portalocker/__init__.py",
                zip::write::FileOptions::default(),
            )?;
            zf.write_all(b"lock")?;
            fh.write_all(&zf.finish()?.into_inner())?;
        }
        drop(fh);

        let mut source = SupportArchive(path).open()?;
        let members = source.read_members(|_| true)?;
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].path, ".bootstrap/portalocker/__init__.py");
        assert_eq!(members[0].data, b"lock");

        Ok(())
    }

    #[test]
    fn unpackaged_executable_is_not_an_archive() -> Result<()> {
        let td = TempDir::new()?;
        let path = td.path().join("please_pex");
        std::fs::write(&path, b"\x7fELF\x02\x01\x01\x00 native code")?;

        let err = SupportArchive(path)
            .open()
            .err()
            .map(|e| format!("{:#}", e));
        assert!(matches!(err, Some(msg) if msg.contains("opening support archive")));

        Ok(())
    }

    #[test]
    fn missing_archive() {
        let err = SupportArchive(PathBuf::from("/nonexistent/support.zip"))
            .open()
            .err()
            .map(|e| format!("{:#}", e));

        assert!(matches!(err, Some(msg) if msg.contains("opening support archive")));
    }

    #[test]
    fn current_executable() -> Result<()> {
        assert!(CurrentExecutable.archive_path()?.exists());

        Ok(())
    }
}
