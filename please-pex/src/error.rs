// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Invalid build configuration.
///
/// These are detected before any output is written.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum PexConfigError {
    #[error("unknown debugger: {0}")]
    UnknownDebugger(String),

    #[error("custom test runner '{0}' is invalid; must contain at least one dot")]
    UnqualifiedTestRunner(String),

    #[error("invalid preamble logging level '{0}'")]
    InvalidVerbosity(String),

    #[error("unknown bytecode target '{0}'")]
    InvalidBytecodeTarget(String),
}
