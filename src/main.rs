// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use codescribe::app_config::{Config, LogLevel};
use codescribe::app_controller::Controller;
use codescribe::translation::BatchOptions;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

/// Options shared by every run
#[derive(Args, Debug)]
struct CommonArgs {
    /// Backend: a local checkpoint directory or "openai".
    /// Without one, prompts are built (and saved with --save-prompts) only.
    #[arg(short, long)]
    model: Option<String>,

    /// Save the generated prompts
    #[arg(long)]
    save_prompts: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// Source files or directories to translate
    #[arg(value_name = "SOURCE", required = true)]
    sources: Vec<PathBuf>,

    /// Seed prompt template (TOML with [[chat]] entries, or JSON)
    #[arg(short = 'p', long)]
    seed_prompt: PathBuf,

    /// Regenerate files whose translation already exists
    #[arg(short, long)]
    force: bool,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Files or directories to show the model
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// Question to ask about the files
    #[arg(short, long)]
    query: String,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate source files with a seed prompt
    Translate(TranslateArgs),

    /// Ask a question about a set of files
    Inspect(InspectArgs),

    /// Generate shell completions for codescribe
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// codescribe - prompt-driven source-to-source translation
#[derive(Parser, Debug)]
#[command(name = "codescribe")]
#[command(version)]
#[command(about = "LLM-assisted source-to-source code translation")]
#[command(long_about = "codescribe builds prompts from a seed template and your source files, \
sends them to a text-generation backend and splits the answer into output files.

EXAMPLES:
    codescribe translate -p seed.toml src/Grid_init.F90          # Build prompts only (dry run)
    codescribe translate -p seed.toml -m openai src/             # Translate a directory with OpenAI
    codescribe translate -p seed.toml -m ./ckpt --save-prompts a.F90
    codescribe inspect -m openai -q \"List all subroutines\" src/
    codescribe completions bash > codescribe.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. If the config file doesn't
    exist, a default one will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger { level: LevelFilter::Trace }))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Load the config and apply command-line overrides
fn load_config(common: &CommonArgs) -> Result<Config> {
    if let Some(level) = &common.log_level {
        log::set_max_level(LogLevel::from(level.clone()).to_level_filter());
    }

    let mut config = Config::load_or_create(&common.config_path)?;

    if let Some(model) = &common.model {
        config.backend.model = Some(model.clone());
    }

    match &common.log_level {
        Some(level) => config.log_level = level.clone().into(),
        None => log::set_max_level(config.log_level.to_level_filter()),
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info by default; the config or --log-level may change it
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "codescribe", &mut std::io::stdout());
            Ok(())
        }
        Commands::Translate(args) => {
            let controller = Controller::with_config(load_config(&args.common)?)?;
            let options = BatchOptions {
                force: args.force,
                save_prompts: args.common.save_prompts,
            };
            controller.run_translate(&args.sources, &args.seed_prompt, options).await?;
            Ok(())
        }
        Commands::Inspect(args) => {
            if args.query.trim().is_empty() {
                return Err(anyhow!("The inspection query must not be empty"));
            }
            let controller = Controller::with_config(load_config(&args.common)?)?;
            let answer = controller
                .run_inspect(&args.files, &args.query, args.common.save_prompts)
                .await?;
            if let Some(answer) = answer {
                println!("{}", answer);
            }
            Ok(())
        }
    }
}
