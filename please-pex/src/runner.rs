// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Test runners and debuggers a `.pex` can be built with.

Each variant maps to an adapter script appended to the generated
`__main__.py` and to the support libraries that must be merged into the
archive for the adapter to work.
*/

use {
    crate::error::PexConfigError,
    std::{fmt, str::FromStr},
};

/// Support libraries needed by every test runner.
///
/// These are the outputs of `//third_party/python:test_bootstrap` and its
/// transitive dependencies.
const TEST_BOOTSTRAP_LIBS: &[&str] = &[
    ".bootstrap/__init__.py",
    ".bootstrap/coverage",
    ".bootstrap/portalocker",
];

const PYTEST_LIBS: &[&str] = &[
    ".bootstrap/_pytest",
    ".bootstrap/exceptiongroup",
    ".bootstrap/iniconfig",
    ".bootstrap/packaging",
    ".bootstrap/pluggy",
    ".bootstrap/py",
    ".bootstrap/pygments",
    ".bootstrap/pytest",
    ".bootstrap/tomli",
    ".bootstrap/typing_extensions.py",
];

const BEHAVE_LIBS: &[&str] = &[
    ".bootstrap/behave",
    ".bootstrap/colorama",
    ".bootstrap/enum",
    ".bootstrap/parse.py",
    ".bootstrap/parse_type",
    ".bootstrap/six.py",
    ".bootstrap/traceback2",
    ".bootstrap/win_unicode_console",
];

const UNITTEST_LIBS: &[&str] = &[".bootstrap/xmlrunner"];

/// The framework used to run tests in a test `.pex`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TestRunner {
    Unittest,
    Pytest,
    Behave,
    /// A fully qualified name of an importable custom runner.
    Custom(String),
}

impl FromStr for TestRunner {
    type Err = PexConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unittest" => Ok(Self::Unittest),
            "pytest" => Ok(Self::Pytest),
            "behave" => Ok(Self::Behave),
            custom if custom.contains('.') => Ok(Self::Custom(custom.to_string())),
            unqualified => Err(PexConfigError::UnqualifiedTestRunner(
                unqualified.to_string(),
            )),
        }
    }
}

impl fmt::Display for TestRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unittest => f.write_str("unittest"),
            Self::Pytest => f.write_str("pytest"),
            Self::Behave => f.write_str("behave"),
            Self::Custom(name) => f.write_str(name),
        }
    }
}

impl TestRunner {
    /// Template name of the adapter script.
    pub fn adapter(&self) -> &'static str {
        match self {
            Self::Unittest => "test_runners/unittest.py",
            Self::Pytest => "test_runners/pytest.py",
            Self::Behave => "test_runners/behave.py",
            Self::Custom(_) => "test_runners/custom.py",
        }
    }

    /// Name substituted for `__TEST_RUNNER__` in the adapter script.
    pub fn custom_name(&self) -> &str {
        match self {
            Self::Custom(name) => name,
            _ => "",
        }
    }

    /// Support libraries to merge into the archive for this runner.
    pub fn support_libraries(&self) -> Vec<&'static str> {
        let extra: &[&str] = match self {
            Self::Unittest => UNITTEST_LIBS,
            Self::Pytest => PYTEST_LIBS,
            Self::Behave => BEHAVE_LIBS,
            Self::Custom(_) => &[],
        };

        TEST_BOOTSTRAP_LIBS
            .iter()
            .chain(extra.iter())
            .copied()
            .collect()
    }
}

/// A debugger a `.pex` can be built to start.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Debugger {
    Pdb,
    Debugpy,
}

impl FromStr for Debugger {
    type Err = PexConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pdb" => Ok(Self::Pdb),
            "debugpy" => Ok(Self::Debugpy),
            _ => Err(PexConfigError::UnknownDebugger(s.to_string())),
        }
    }
}

impl Debugger {
    /// Template name of the adapter script.
    pub fn adapter(&self) -> &'static str {
        match self {
            Self::Pdb => "debuggers/pdb.py",
            Self::Debugpy => "debuggers/debugpy.py",
        }
    }

    /// Support libraries to merge into the archive for this debugger.
    pub fn support_libraries(&self) -> &'static [&'static str] {
        match self {
            Self::Pdb => &[],
            Self::Debugpy => &[".bootstrap/debugpy"],
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_runners() {
        assert_eq!("pytest".parse::<TestRunner>(), Ok(TestRunner::Pytest));
        assert_eq!("behave".parse::<TestRunner>(), Ok(TestRunner::Behave));
        assert_eq!("unittest".parse::<TestRunner>(), Ok(TestRunner::Unittest));
        assert_eq!(
            "my.custom.Runner".parse::<TestRunner>(),
            Ok(TestRunner::Custom("my.custom.Runner".to_string()))
        );
        assert_eq!(
            "nose".parse::<TestRunner>(),
            Err(PexConfigError::UnqualifiedTestRunner("nose".to_string()))
        );
    }

    #[test]
    fn runner_adapters() {
        assert_eq!(TestRunner::Pytest.adapter(), "test_runners/pytest.py");
        assert_eq!(TestRunner::Pytest.custom_name(), "");

        let custom = TestRunner::Custom("a.b".to_string());
        assert_eq!(custom.adapter(), "test_runners/custom.py");
        assert_eq!(custom.custom_name(), "a.b");
        assert_eq!(custom.to_string(), "a.b");
    }

    #[test]
    fn runner_libraries() {
        assert_eq!(
            TestRunner::Unittest.support_libraries(),
            vec![
                ".bootstrap/__init__.py",
                ".bootstrap/coverage",
                ".bootstrap/portalocker",
                ".bootstrap/xmlrunner",
            ]
        );
        assert!(TestRunner::Pytest
            .support_libraries()
            .contains(&".bootstrap/_pytest"));
        assert!(TestRunner::Behave
            .support_libraries()
            .contains(&".bootstrap/parse.py"));
        assert_eq!(
            TestRunner::Custom("x.y".to_string()).support_libraries(),
            TEST_BOOTSTRAP_LIBS.to_vec()
        );
    }

    #[test]
    fn debuggers() {
        assert_eq!("pdb".parse::<Debugger>(), Ok(Debugger::Pdb));
        assert_eq!("debugpy".parse::<Debugger>(), Ok(Debugger::Debugpy));
        assert_eq!(
            "gdb".parse::<Debugger>(),
            Err(PexConfigError::UnknownDebugger("gdb".to_string()))
        );
        assert!(Debugger::Pdb.support_libraries().is_empty());
        assert_eq!(
            Debugger::Debugpy.support_libraries(),
            &[".bootstrap/debugpy"]
        );
        assert_eq!(Debugger::Debugpy.adapter(), "debuggers/debugpy.py");
    }
}
