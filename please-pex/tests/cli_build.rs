// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    anyhow::Result,
    assert_cmd::Command,
    assert_fs::{prelude::*, TempDir},
    libtest_mimic::{Arguments, Trial},
    predicates::prelude::*,
    std::{fs::File, io::Write, path::Path},
};

fn please_pex() -> Result<Command> {
    let mut cmd = Command::cargo_bin("please_pex")?;
    for var in ["OUT", "SRC", "SRCS", "TOOLS_INTERPRETER", "RUST_LOG"] {
        cmd.env_remove(var);
    }

    Ok(cmd)
}

fn member_names(path: &Path) -> Result<Vec<String>> {
    let mut za = zip::ZipArchive::new(File::open(path)?)?;

    let mut names = vec![];
    for i in 0..za.len() {
        names.push(za.by_index(i)?.name().to_string());
    }

    Ok(names)
}

fn unqualified_runner() -> Result<()> {
    let td = TempDir::new()?;
    let out = td.child("test.pex");

    please_pex()?
        .arg("--out")
        .arg(out.path())
        .arg("--entry_point")
        .arg("app/main.py")
        .arg("--test")
        .arg("--test_runner")
        .arg("nose")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "custom test runner 'nose' is invalid; must contain at least one dot",
        ));

    out.assert(predicate::path::missing());

    Ok(())
}

fn zip_safe_shebang() -> Result<()> {
    let td = TempDir::new()?;
    let out = td.child("out/app.pex");

    please_pex()?
        .env("OUT", out.path())
        .env("SRC", "app/main.py")
        .env("TOOLS_INTERPRETER", "python3")
        .arg("--zip_safe")
        .arg("--site")
        .arg("--interpreter_options")
        .arg("-u")
        .arg("-vv")
        .assert()
        .success();

    out.assert(predicate::path::is_file());

    let data = std::fs::read(out.path())?;
    assert!(data.starts_with(b"#!/usr/bin/env python3 -u\n"));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(out.path())?.permissions().mode();
        assert_ne!(mode & 0o100, 0, "pex is executable");
    }

    assert_eq!(
        member_names(out.path())?,
        vec![
            ".bootstrap/PLZ_PREAMBLE_CONFIG",
            ".bootstrap/plz.py",
            "__main__.py"
        ]
    );

    Ok(())
}

fn zip_unsafe_support_archive() -> Result<()> {
    let td = TempDir::new()?;
    let support = td.child("support.zip");
    {
        let mut zf = zip::ZipWriter::new(File::create(support.path())?);
        for (name, data) in [
            (".bootstrap/portalocker/__init__.py", "from .portalocker import lock\n"),
            (".bootstrap/portalocker/portalocker.py", "def lock(f): pass\n"),
            (".bootstrap/pytest/__init__.py", "\n"),
        ] {
            zf.start_file(name, zip::write::FileOptions::default())?;
            zf.write_all(data.as_bytes())?;
        }
        zf.finish()?;
    }
    let out = td.child("app.pex");

    please_pex()?
        .arg("-o")
        .arg(out.path())
        .arg("-e")
        .arg("app/main.py")
        .arg("--support_archive")
        .arg(support.path())
        .assert()
        .success();

    let names = member_names(out.path())?;
    assert!(names.contains(&".bootstrap/portalocker/__init__.py".to_string()));
    assert!(names.contains(&".bootstrap/portalocker/portalocker.py".to_string()));
    assert!(!names.contains(&".bootstrap/pytest/__init__.py".to_string()));

    Ok(())
}

fn missing_support_archive() -> Result<()> {
    let td = TempDir::new()?;
    let out = td.child("app.pex");

    please_pex()?
        .arg("-o")
        .arg(out.path())
        .arg("-e")
        .arg("app/main.py")
        .arg("--support_archive")
        .arg(td.child("missing.zip").path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("opening support archive"));

    out.assert(predicate::path::missing());

    Ok(())
}

fn main() {
    let args = Arguments::from_args();

    let tests = vec![
        Trial::test("unqualified_runner", move || {
            unqualified_runner().map_err(Into::into)
        }),
        Trial::test("zip_safe_shebang", move || {
            zip_safe_shebang().map_err(Into::into)
        }),
        Trial::test("zip_unsafe_support_archive", move || {
            zip_unsafe_support_archive().map_err(Into::into)
        }),
        Trial::test("missing_support_archive", move || {
            missing_support_archive().map_err(Into::into)
        }),
    ];

    libtest_mimic::run(&args, tests).exit();
}
