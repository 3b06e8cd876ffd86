// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Build self-executable Python zip archives.

A built `.pex` is a zip file prefixed by a preamble (a shebang line or a
native launcher) that makes it directly executable. Inside are the
launcher configuration, support libraries merged from the running tool's
own payload, an import-hook bootstrap module and a generated `__main__.py`.
*/

pub mod cli;
pub mod error;
pub mod logging;
pub mod preamble;
pub mod runner;
pub mod support;
pub mod templates;
pub mod writer;
