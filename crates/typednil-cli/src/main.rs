use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use typednil_core::config::{self, Config, OutputFormat};
use typednil_core::driver::{CheckError, Checker};
use typednil_diagnostics::diagnostic::Diagnostic;
use typednil_diagnostics::plain::PathStyle;

const EXIT_OK: u8 = 0;
const EXIT_FOUND: u8 = 1;
const EXIT_FATAL: u8 = 2;

/// Build a long version string: "0.1.0 (abc12345)"
fn long_version() -> &'static str {
    let s = format!("{} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_HASH"));
    Box::leak(s.into_boxed_str())
}

#[derive(Parser)]
#[command(name = "typednilcheck")]
#[command(about = "Find Go functions that may return a typed nil through an interface")]
#[command(version, long_version = long_version())]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    /// Packages to check: directories, or `dir/...` for a tree (default: .)
    patterns: Vec<String>,
    /// Print absolute file paths
    #[arg(long)]
    abspath: bool,
    /// Skip _test.go files
    #[arg(long, conflicts_with = "tests")]
    without_tests: bool,
    /// Check _test.go files even if the config turns them off
    #[arg(long)]
    tests: bool,
    /// Skip files marked `// Code generated ... DO NOT EDIT.`
    #[arg(long)]
    skip_generated: bool,
    /// Output format (default: from typednil.toml, else plain)
    #[arg(long, value_enum)]
    format: Option<FormatArg>,
    /// Disable colored output for the human format
    #[arg(long)]
    no_color: bool,
    /// Log progress to stderr
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default typednil.toml in the current directory
    Init,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Plain,
    Human,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Plain => OutputFormat::Plain,
            FormatArg::Human => OutputFormat::Human,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Init) => run_init(),
        None => run_check(cli),
    }
}

/// Log to stderr so stdout stays clean for report output.
fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_check(cli: Cli) -> ExitCode {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut config = config::load_config(&cwd);
    apply_overrides(&mut config, &cli);

    let checker = Checker::new(config.clone(), &cwd);
    match checker.check_packages(&cli.patterns) {
        Ok(()) => ExitCode::from(EXIT_OK),
        Err(CheckError::PossibleTypedNil(found)) => {
            match report(found.diagnostics(), &config, &cwd, !cli.no_color) {
                Ok(()) => ExitCode::from(EXIT_FOUND),
                Err(e) => {
                    eprintln!("error: {e:#}");
                    ExitCode::from(EXIT_FATAL)
                }
            }
        }
        Err(CheckError::NoGoFiles) => {
            eprintln!("{}", CheckError::NoGoFiles);
            ExitCode::from(EXIT_OK)
        }
        Err(e) => {
            eprintln!("error: failed to check packages: {e}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if cli.abspath {
        config.typednil.abspath = true;
    }
    if cli.without_tests {
        config.typednil.include_tests = false;
    }
    if cli.tests {
        config.typednil.include_tests = true;
    }
    if cli.skip_generated {
        config.typednil.skip_generated = true;
    }
    if let Some(format) = cli.format {
        config.typednil.format = format.into();
    }
}

fn report(diags: &[Diagnostic], config: &Config, cwd: &Path, color: bool) -> anyhow::Result<()> {
    use anyhow::Context;

    let style = if config.typednil.abspath {
        PathStyle::absolute()
    } else {
        PathStyle::relative_to(cwd)
    };
    match config.typednil.format {
        OutputFormat::Plain => {
            print!("{}", typednil_diagnostics::plain::format_plain(diags, &style));
        }
        OutputFormat::Human => {
            let color = color && std::io::stdout().is_terminal();
            print!("{}", typednil_diagnostics::human::format_human(diags, &style, color));
        }
        OutputFormat::Json => {
            let json = typednil_diagnostics::json::format_json(diags, &style)
                .context("failed to serialize diagnostics")?;
            println!("{json}");
        }
    }
    Ok(())
}

fn run_init() -> ExitCode {
    let config_path = config::CONFIG_FILE_NAME;
    if Path::new(config_path).exists() {
        eprintln!("{config_path} already exists");
        return ExitCode::from(EXIT_FATAL);
    }

    match std::fs::write(config_path, config::DEFAULT_CONFIG_TOML) {
        Ok(()) => {
            println!("Created {config_path}");
            ExitCode::from(EXIT_OK)
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}
