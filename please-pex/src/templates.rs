// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Python scripts written into every `.pex`.

The scripts are plain text containing literal placeholder tokens such as
`__ENTRY_POINT__`, which are replaced verbatim before being written.
*/

use {
    anyhow::{anyhow, Context, Result},
    once_cell::sync::Lazy,
    std::{collections::BTreeMap, path::Path},
};

/// Import hooks, stored as `.bootstrap/plz.py`.
pub const BOOTSTRAP: &str = "plz.py";
/// Start of the generated `__main__.py`.
pub const MAIN: &str = "pex_main.py";
/// Appended to `__main__.py` for test archives.
pub const TEST_MAIN: &str = "pex_test_main.py";
/// The `if __name__ == '__main__'` trailer of `__main__.py`.
pub const RUN: &str = "pex_run.py";

static EMBEDDED: &[(&str, &str)] = &[
    (BOOTSTRAP, include_str!("templates/plz.py")),
    (MAIN, include_str!("templates/pex_main.py")),
    (TEST_MAIN, include_str!("templates/pex_test_main.py")),
    (RUN, include_str!("templates/pex_run.py")),
    (
        "test_runners/behave.py",
        include_str!("templates/test_runners/behave.py"),
    ),
    (
        "test_runners/custom.py",
        include_str!("templates/test_runners/custom.py"),
    ),
    (
        "test_runners/pytest.py",
        include_str!("templates/test_runners/pytest.py"),
    ),
    (
        "test_runners/unittest.py",
        include_str!("templates/test_runners/unittest.py"),
    ),
    (
        "debuggers/debugpy.py",
        include_str!("templates/debuggers/debugpy.py"),
    ),
    ("debuggers/pdb.py", include_str!("templates/debuggers/pdb.py")),
];

static EMBEDDED_TEMPLATES: Lazy<TemplateSet> = Lazy::new(|| TemplateSet {
    files: EMBEDDED
        .iter()
        .map(|(name, content)| (name.to_string(), content.to_string()))
        .collect(),
});

/// A read-only collection of named script templates.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TemplateSet {
    files: BTreeMap<String, String>,
}

impl TemplateSet {
    /// The templates compiled into this binary.
    pub fn embedded() -> &'static TemplateSet {
        &EMBEDDED_TEMPLATES
    }

    /// Names of every template.
    pub fn names() -> impl Iterator<Item = &'static str> {
        EMBEDDED.iter().map(|(name, _)| *name)
    }

    /// Load a template set from a directory with the same layout as the embedded one.
    ///
    /// Every template must be present.
    pub fn load_dir(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let files = Self::names()
            .map(|name| -> Result<(String, String)> {
                let file_path = path.join(name);
                let content = std::fs::read_to_string(&file_path)
                    .with_context(|| format!("reading template {}", file_path.display()))?;

                Ok((name.to_string(), content))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(Self { files })
    }

    /// Obtain the content of a template.
    pub fn get(&self, name: &str) -> Result<&str> {
        self.files
            .get(name)
            .map(|s| s.as_str())
            .ok_or_else(|| anyhow!("template {} not available", name))
    }
}

/// Replace the first occurrence of each placeholder with its value.
pub fn substitute(template: &str, replacements: &[(&str, &str)]) -> String {
    replacements
        .iter()
        .fold(template.to_string(), |acc, (placeholder, value)| {
            acc.replacen(placeholder, value, 1)
        })
}
