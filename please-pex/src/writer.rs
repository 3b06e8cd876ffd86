// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Assemble `.pex` files. */

use {
    crate::{
        preamble::{Preamble, PreambleConfig, Verbosity, CONFIG_PATH},
        runner::{Debugger, TestRunner},
        support::{CurrentExecutable, SupportArchiveProvider},
        templates::{substitute, TemplateSet, BOOTSTRAP, MAIN, RUN, TEST_MAIN},
    },
    anyhow::{Context, Result},
    log::{debug, info},
    pex_archive::{Archive, BytecodeGeneration, BytecodeMagicClassifier, CompressionMethod},
    std::path::{Path, PathBuf},
};

/// Stamp used for archives built with a debugger.
pub const DEBUG_STAMP: &str = "debug";

/// File locking library needed to extract archives that aren't zip-safe.
pub const LOCKING_LIBRARY: &str = ".bootstrap/portalocker";

/// Entry point module of test archives.
const TEST_ENTRY_POINT: &str = "pex_test_main";

/// Permissions of generated members.
const MEMBER_MODE: u32 = 0o644;

/// Convert a source file path into the import path of its module.
pub fn to_python_path(path: &str) -> String {
    let stem = match path.rfind('.') {
        Some(dot) if !path[dot..].contains('/') => &path[..dot],
        _ => path,
    };

    stem.replace('/', ".")
}

/// Spelling of a boolean in Python source.
pub fn python_bool(v: bool) -> &'static str {
    if v {
        "True"
    } else {
        "False"
    }
}

#[derive(Clone, Debug)]
struct TestConfig {
    sources: Vec<String>,
    runner: TestRunner,
}

/// Writes a `.pex` file in several steps.
///
/// The instance is configured first; [PexWriter::write] then emits the
/// preamble, the preamble configuration, merged support libraries, the
/// bootstrap module and a generated `__main__.py`.
pub struct PexWriter<'a> {
    preamble: Preamble,
    preamble_config: PreambleConfig,
    zip_safe: bool,
    entry_point: String,
    stamp: String,
    test: Option<TestConfig>,
    debugger: Option<Debugger>,
    include_libs: Vec<String>,
    templates: &'a TemplateSet,
    support: Box<dyn SupportArchiveProvider + 'a>,
    compression_method: CompressionMethod,
    bytecode_classifier: BytecodeMagicClassifier,
    bytecode_target: Option<BytecodeGeneration>,
}

impl<'a> PexWriter<'a> {
    /// Construct a new instance.
    ///
    /// `entry_point` is the path of the source file to run. If `allow_site`
    /// is false, interpreters are passed `-S` so `site` isn't imported.
    pub fn new(
        entry_point: &str,
        interpreters: Vec<String>,
        mut interpreter_args: Vec<String>,
        stamp: &str,
        zip_safe: bool,
        allow_site: bool,
    ) -> Self {
        let preamble = Preamble::shebang(
            interpreters.first().map(|s| s.as_str()).unwrap_or("python3"),
            &interpreter_args,
            allow_site,
        );

        if !allow_site {
            interpreter_args.push("-S".to_string());
        }

        Self {
            preamble,
            preamble_config: PreambleConfig {
                verbosity: None,
                interpreters,
                interpreter_args,
            },
            zip_safe,
            entry_point: to_python_path(entry_point),
            stamp: stamp.to_string(),
            test: None,
            debugger: None,
            include_libs: vec![],
            templates: TemplateSet::embedded(),
            support: Box::new(CurrentExecutable),
            compression_method: CompressionMethod::Stored,
            bytecode_classifier: BytecodeMagicClassifier::default(),
            bytecode_target: None,
        }
    }

    /// The import path of the module run by the archive.
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// The stamp embedded into `__main__.py`.
    pub fn stamp(&self) -> &str {
        &self.stamp
    }

    pub fn preamble_config(&self) -> &PreambleConfig {
        &self.preamble_config
    }

    /// Support libraries that will be merged into the archive.
    pub fn include_libs(&self) -> &[String] {
        &self.include_libs
    }

    pub fn set_preamble(&mut self, preamble: Preamble) {
        self.preamble = preamble;
    }

    /// Set the native launcher's default minimum logging level.
    pub fn set_preamble_verbosity(&mut self, verbosity: Verbosity) {
        self.preamble_config.verbosity = Some(verbosity);
    }

    pub fn set_templates(&mut self, templates: &'a TemplateSet) {
        self.templates = templates;
    }

    /// Set where support libraries are merged from.
    pub fn set_support_archive(&mut self, provider: impl SupportArchiveProvider + 'a) {
        self.support = Box::new(provider);
    }

    pub fn set_compression_method(&mut self, method: CompressionMethod) {
        self.compression_method = method;
    }

    /// Drop merged bytecode that doesn't belong to this generation.
    pub fn set_bytecode_target(
        &mut self,
        target: Option<BytecodeGeneration>,
        classifier: BytecodeMagicClassifier,
    ) {
        self.bytecode_target = target;
        self.bytecode_classifier = classifier;
    }

    fn add_include_lib(&mut self, lib: &str) {
        if !self.include_libs.iter().any(|l| l == lib) {
            self.include_libs.push(lib.to_string());
        }
    }

    /// Build a test archive running the given test sources.
    ///
    /// This overrides the entry point given earlier.
    pub fn set_test(&mut self, sources: Vec<String>, runner: TestRunner, add_runner_deps: bool) {
        self.entry_point = TEST_ENTRY_POINT.to_string();

        if add_runner_deps {
            for lib in runner.support_libraries() {
                self.add_include_lib(lib);
            }
        }

        self.test = Some(TestConfig { sources, runner });
    }

    /// Build an archive that starts a debugger.
    ///
    /// The stamp is replaced so debug builds never share an extraction
    /// cache with regular builds.
    pub fn set_debugger(&mut self, debugger: Debugger) {
        self.stamp = DEBUG_STAMP.to_string();

        for lib in debugger.support_libraries() {
            self.add_include_lib(lib);
        }

        self.debugger = Some(debugger);
    }

    /// Render the content of `__main__.py`.
    pub fn main_script(&self, module_dir: &str) -> Result<String> {
        let module_dir = module_dir.replace('.', "/");

        let mut script = substitute(
            self.templates.get(MAIN)?,
            &[
                ("__MODULE_DIR__", &module_dir),
                ("__ENTRY_POINT__", &self.entry_point),
                ("__ZIP_SAFE__", python_bool(self.zip_safe)),
                ("__PEX_STAMP__", &self.stamp),
            ],
        );

        if let Some(test) = self.test.as_ref().filter(|t| !t.sources.is_empty()) {
            script.push_str(&substitute(
                self.templates.get(TEST_MAIN)?,
                &[("__TEST_NAMES__", &test.sources.join(","))],
            ));
            script.push_str(&substitute(
                self.templates.get(test.runner.adapter())?,
                &[("__TEST_RUNNER__", test.runner.custom_name())],
            ));
        }

        if let Some(debugger) = &self.debugger {
            script.push_str(self.templates.get(debugger.adapter())?);
        }

        script.push_str(self.templates.get(RUN)?);

        Ok(script)
    }

    /// Write the `.pex` to the given path.
    ///
    /// On failure the partially written output is removed.
    pub fn write(&self, out: impl AsRef<Path>, module_dir: &str) -> Result<PathBuf> {
        let out = out.as_ref();

        let main_script = self.main_script(module_dir)?;
        let bootstrap = self.templates.get(BOOTSTRAP)?;
        let preamble_config = self
            .preamble_config
            .to_json()
            .context("serializing preamble configuration")?;

        let mut archive = Archive::create(out, true)
            .with_context(|| format!("creating {}", out.display()))?;
        archive.set_compression_method(self.compression_method);
        archive.set_bytecode_classifier(self.bytecode_classifier);
        archive.set_bytecode_guard(self.bytecode_target);

        match &self.preamble {
            Preamble::Launcher(path) => {
                let mut fh = std::fs::File::open(path)
                    .with_context(|| format!("opening preamble {}", path.display()))?;
                archive
                    .write_preamble_from_reader(&mut fh)
                    .context("writing preamble")?;
            }
            Preamble::Shebang(shebang) => {
                archive
                    .write_preamble(shebang.as_bytes())
                    .context("writing preamble")?;
            }
        }

        archive.write_member(CONFIG_PATH, preamble_config, MEMBER_MODE);

        let mut include_libs = self.include_libs.clone();
        if !self.zip_safe && !include_libs.iter().any(|l| l == LOCKING_LIBRARY) {
            include_libs.push(LOCKING_LIBRARY.to_string());
        }

        if !include_libs.is_empty() {
            debug!("merging support libraries: {}", include_libs.join(", "));
            let mut source = self.support.open()?;
            archive.set_include(include_libs);
            archive
                .merge_archive(&mut source)
                .with_context(|| format!("merging {}", source.path().display()))?;
        }

        archive.write_member(
            ".bootstrap/plz.py",
            bootstrap.as_bytes().to_vec(),
            MEMBER_MODE,
        );
        archive.write_member("__main__.py", main_script.into_bytes(), MEMBER_MODE);

        let members = archive.len();
        let path = archive
            .finish()
            .with_context(|| format!("finishing {}", out.display()))?;

        info!("wrote {} ({} members)", path.display(), members);

        Ok(path)
    }
}
