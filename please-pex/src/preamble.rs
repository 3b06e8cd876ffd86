// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! The preamble that makes a `.pex` directly executable.

Either a shebang line or a native launcher binary is written ahead of the
zip structure. The native launcher reads a JSON configuration member,
stored at [CONFIG_PATH], to find an interpreter to run the archive with.
*/

use {
    crate::error::PexConfigError,
    serde::{Deserialize, Serialize},
    std::{fmt, path::PathBuf, str::FromStr},
};

/// Archive member holding the launcher configuration.
///
/// It is written immediately after the preamble so the launcher finds it
/// without reading the whole central directory.
pub const CONFIG_PATH: &str = ".bootstrap/PLZ_PREAMBLE_CONFIG";

/// Minimum log level of the native launcher.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl FromStr for Verbosity {
    type Err = PexConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "fatal" => Ok(Self::Fatal),
            _ => Err(PexConfigError::InvalidVerbosity(s.to_string())),
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        })
    }
}

/// Configuration consumed by the native launcher.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct PreambleConfig {
    /// Default minimum log level. `PLZ_PEX_PREAMBLE_VERBOSITY` overrides it at run time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<Verbosity>,

    /// Interpreters to attempt, in order. Names without a `/` are searched
    /// for on `PATH`.
    pub interpreters: Vec<String>,

    /// Arguments passed to the interpreter.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interpreter_args: Vec<String>,
}

impl PreambleConfig {
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Bytes that make the archive executable.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Preamble {
    /// A native launcher binary read from the filesystem.
    Launcher(PathBuf),
    /// A complete shebang line (or script header), including the trailing newline.
    Shebang(String),
}

impl Preamble {
    /// Construct a shebang preamble running `interpreter` with `options`.
    ///
    /// Relative interpreters are resolved through `/usr/bin/env`; an
    /// interpreter already starting with `#!` is used as is. When site
    /// imports are disabled, `-S` must reach the interpreter; since many
    /// platforms only pass a single argument on a shebang line, commands
    /// that already carry an argument are wrapped in a `/bin/sh` script.
    pub fn shebang(interpreter: &str, options: &[String], allow_site: bool) -> Self {
        let mut shebang = format!("{} {}", interpreter, options.join(" "))
            .trim()
            .to_string();

        if !shebang.starts_with('/') && !shebang.starts_with('#') {
            shebang = format!("/usr/bin/env {}", shebang);
        }

        if !allow_site {
            if shebang.contains(' ') {
                shebang = format!("#!/bin/sh\nexec {} -S $0 \"$@\"", shebang);
            } else {
                shebang.push_str(" -S");
            }
        }

        if !shebang.starts_with('#') {
            shebang = format!("#!{}", shebang);
        }

        Self::Shebang(format!("{}\n", shebang))
    }
}
