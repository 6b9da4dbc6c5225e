use clap::Parser;
use miette::{bail, IntoDiagnostic};
use std::path::{Path, PathBuf};
use tessera_build::{parse_args, skip_flag_args, BuildConfig, Clang, Driver, ManifestLoader, Mode, CONFIG_FILE};

#[derive(Parser, Debug)]
#[command(name = "tessera")]
#[command(about = "Lowers type-checked packages to LLVM IR and links them", long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Lower packages; a single package is also linked
    Build {
        /// Output file for the linked program
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Build flags followed by package patterns
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
        args: Vec<String>,
    },

    /// Lower packages and link every main package into the bin directory
    Install {
        /// Build flags followed by package patterns
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
        args: Vec<String>,
    },

    /// Build and run a main package
    Run {
        /// Build flags, the package, then arguments for the program
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
        args: Vec<String>,
    },
}

fn init_logging(build_args: &[String]) {
    // `-v` among the build flags also turns on debug logging.
    let verbose = parse_args(build_args).map(|parsed| parsed.verbose).unwrap_or(false);
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn main() -> miette::Result<()> {
    let args = Args::parse();
    let (mode, build_args, run_args, output) = match args.command {
        Command::Build { output, args } => (Mode::Build, args, Vec::new(), output),
        Command::Install { args } => (Mode::Install, args, Vec::new(), None),
        Command::Run { mut args } => {
            let Some(package) = skip_flag_args(&args)? else {
                bail!("missing package to run");
            };
            let run_args = args.split_off(package + 1);
            (Mode::Run, args, run_args, None)
        }
    };
    init_logging(&build_args);

    let mut config = BuildConfig::new(mode)?.load(Path::new(CONFIG_FILE))?;
    config.run_args = run_args;
    config.out_file = output;
    let root = std::env::current_dir().into_diagnostic()?;
    let mut driver = Driver::new(ManifestLoader::new(root), Clang::new(), config);
    let report = driver.build(&build_args)?;

    for (app, code) in report.runs {
        match code {
            Some(0) => {}
            Some(code) => std::process::exit(code),
            None => bail!("{} was terminated by a signal", app.display()),
        }
    }
    Ok(())
}
