// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::{
        error::PexConfigError,
        logging::init_logging,
        preamble::{Preamble, Verbosity},
        runner::{Debugger, TestRunner},
        support::SupportArchive,
        templates::TemplateSet,
        writer::PexWriter,
    },
    anyhow::{anyhow, Result},
    clap::{value_parser, Arg, ArgAction, ArgMatches, Command},
    pex_archive::{BytecodeGeneration, BytecodeMagicClassifier, CompressionMethod},
    std::path::PathBuf,
};

const ABOUT: &str = "\
please_pex is a tool to create .pex files for Python.

These are not really pex files any more, they are just zip files (which Python
supports out of the box). They still have essentially the same approach of
containing all the dependent code as a self-contained self-executable
environment.
";

/// Interpreter used when none is given.
const DEFAULT_INTERPRETER: &str = "python3";

/// Parse the value of `--bytecode_target`.
pub fn parse_bytecode_target(s: &str) -> Result<Option<BytecodeGeneration>, PexConfigError> {
    match s {
        "any" => Ok(None),
        "legacy" => Ok(Some(BytecodeGeneration::Legacy)),
        "modern" => Ok(Some(BytecodeGeneration::Modern)),
        _ => Err(PexConfigError::InvalidBytecodeTarget(s.to_string())),
    }
}

pub fn command() -> Command {
    Command::new("please_pex")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Build self-executable Python zip archives")
        .long_about(ABOUT)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::Count)
                .global(true)
                .help("Increase logging verbosity. Can be specified multiple times."),
        )
        .arg(
            Arg::new("out")
                .long("out")
                .short('o')
                .env("OUT")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Output file"),
        )
        .arg(
            Arg::new("entry_point")
                .long("entry_point")
                .short('e')
                .env("SRC")
                .required(true)
                .help("Entry point to pex file"),
        )
        .arg(
            Arg::new("module_dir")
                .long("module_dir")
                .short('m')
                .default_value("")
                .help("Python module dir to implicitly load modules from"),
        )
        .arg(
            Arg::new("test_srcs")
                .long("test_srcs")
                .env("SRCS")
                .action(ArgAction::Append)
                .value_delimiter(' ')
                .help("Test source files"),
        )
        .arg(
            Arg::new("interpreter")
                .long("interpreter")
                .short('i')
                .env("TOOLS_INTERPRETER")
                .action(ArgAction::Append)
                .help("Python interpreter to use. Can be specified multiple times."),
        )
        .arg(
            Arg::new("test_runner")
                .long("test_runner")
                .short('r')
                .default_value("unittest")
                .help("Test runner to use: unittest, pytest, behave or a qualified function name"),
        )
        .arg(
            Arg::new("shebang")
                .long("shebang")
                .short('s')
                .help("Explicitly set shebang to this"),
        )
        .arg(
            Arg::new("preamble")
                .long("preamble")
                .conflicts_with("shebang")
                .value_parser(value_parser!(PathBuf))
                .help("Native launcher binary to use as the preamble"),
        )
        .arg(
            Arg::new("preamble_verbosity")
                .long("preamble_verbosity")
                .help("Default minimum log level of the native launcher"),
        )
        .arg(
            Arg::new("stamp")
                .long("stamp")
                .default_value("")
                .help("Unique value used to derive cache directory for pex"),
        )
        .arg(
            Arg::new("interpreter_options")
                .long("interpreter_options")
                .allow_hyphen_values(true)
                .default_value("")
                .help("Options-string to pass to the python interpreter"),
        )
        .arg(
            Arg::new("test")
                .long("test")
                .short('t')
                .action(ArgAction::SetTrue)
                .help("True if we're to build a test"),
        )
        .arg(
            Arg::new("add_test_runner_deps")
                .long("add_test_runner_deps")
                .action(ArgAction::SetTrue)
                .help("Merge the test runner's support libraries into the pex"),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .short('d')
                .num_args(0..=1)
                .default_missing_value("pdb")
                .help("Debugger to generate a debugging pex: pdb or debugpy"),
        )
        .arg(
            Arg::new("site")
                .long("site")
                .short('S')
                .action(ArgAction::SetTrue)
                .help("Allow the pex to import site at startup"),
        )
        .arg(
            Arg::new("zip_safe")
                .long("zip_safe")
                .action(ArgAction::SetTrue)
                .help("Marks this pex as zip-safe"),
        )
        .arg(
            Arg::new("support_archive")
                .long("support_archive")
                .value_parser(value_parser!(PathBuf))
                .help("Archive to merge support libraries from (default: this executable)"),
        )
        .arg(
            Arg::new("template_dir")
                .long("template_dir")
                .value_parser(value_parser!(PathBuf))
                .help("Directory to load bootstrap templates from"),
        )
        .arg(
            Arg::new("compress")
                .long("compress")
                .action(ArgAction::SetTrue)
                .help("Compress members instead of storing them"),
        )
        .arg(
            Arg::new("bytecode_target")
                .long("bytecode_target")
                .default_value("any")
                .help("Drop merged bytecode not matching this generation: any, legacy or modern"),
        )
        .arg(
            Arg::new("bytecode_threshold")
                .long("bytecode_threshold")
                .value_parser(value_parser!(u16))
                .help("Bytecode magic number at which modern bytecode begins"),
        )
}

/// Build a `.pex` as described by parsed arguments.
pub fn build(args: &ArgMatches) -> Result<PathBuf> {
    // Validate everything before anything is written.
    let runner = args
        .get_one::<String>("test_runner")
        .map(|s| s.parse::<TestRunner>())
        .transpose()?
        .unwrap_or(TestRunner::Unittest);
    let debugger = args
        .get_one::<String>("debug")
        .map(|s| s.parse::<Debugger>())
        .transpose()?;
    let verbosity = args
        .get_one::<String>("preamble_verbosity")
        .map(|s| s.parse::<Verbosity>())
        .transpose()?;
    let bytecode_target = args
        .get_one::<String>("bytecode_target")
        .map(|s| parse_bytecode_target(s))
        .transpose()?
        .flatten();

    let options = args
        .get_one::<String>("interpreter_options")
        .map(|s| s.as_str())
        .unwrap_or_default();
    let interpreter_args = shlex::split(options)
        .ok_or_else(|| anyhow!("unable to parse interpreter options: {}", options))?;

    let mut interpreters = args
        .get_many::<String>("interpreter")
        .map(|values| values.cloned().collect::<Vec<_>>())
        .unwrap_or_default();
    if interpreters.is_empty() {
        interpreters.push(DEFAULT_INTERPRETER.to_string());
    }

    let templates = args
        .get_one::<PathBuf>("template_dir")
        .map(TemplateSet::load_dir)
        .transpose()?;

    let out = args
        .get_one::<PathBuf>("out")
        .ok_or_else(|| anyhow!("--out is required"))?;
    let entry_point = args
        .get_one::<String>("entry_point")
        .ok_or_else(|| anyhow!("--entry_point is required"))?;
    let module_dir = args
        .get_one::<String>("module_dir")
        .map(|s| s.as_str())
        .unwrap_or_default();
    let stamp = args
        .get_one::<String>("stamp")
        .map(|s| s.as_str())
        .unwrap_or_default();
    let allow_site = args.get_flag("site");

    let mut writer = PexWriter::new(
        entry_point,
        interpreters,
        interpreter_args.clone(),
        stamp,
        args.get_flag("zip_safe"),
        allow_site,
    );

    if let Some(shebang) = args.get_one::<String>("shebang").filter(|s| !s.is_empty()) {
        writer.set_preamble(Preamble::shebang(shebang, &interpreter_args, allow_site));
    }
    if let Some(path) = args.get_one::<PathBuf>("preamble") {
        writer.set_preamble(Preamble::Launcher(path.clone()));
    }
    if let Some(verbosity) = verbosity {
        writer.set_preamble_verbosity(verbosity);
    }
    if let Some(templates) = &templates {
        writer.set_templates(templates);
    }
    if let Some(path) = args.get_one::<PathBuf>("support_archive") {
        writer.set_support_archive(SupportArchive(path.clone()));
    }
    if args.get_flag("compress") {
        writer.set_compression_method(CompressionMethod::Deflated);
    }

    let classifier = args
        .get_one::<u16>("bytecode_threshold")
        .map(|t| BytecodeMagicClassifier::with_threshold(*t))
        .unwrap_or_default();
    writer.set_bytecode_target(bytecode_target, classifier);

    if args.get_flag("test") {
        let sources = args
            .get_many::<String>("test_srcs")
            .map(|values| values.filter(|s| !s.is_empty()).cloned().collect())
            .unwrap_or_default();
        writer.set_test(sources, runner, args.get_flag("add_test_runner_deps"));
    }
    if let Some(debugger) = debugger {
        writer.set_debugger(debugger);
    }

    writer.write(out, module_dir)
}

pub fn run() -> Result<()> {
    let matches = command().get_matches();

    init_logging(matches.get_count("verbose"));

    build(&matches)?;

    Ok(())
}
