use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use emu_core::command_line::{available_switches, CommandLine, ParseContext};
use emu_core::home::discovery::{discover, Discovery};
use emu_core::home::platform::PlatformFolders;
use emu_core::home::select::{rank_candidates, score_folders};
use emu_core::logging::{LogCategory, LogConfig, LogLevel};
use emu_core::{ConfigHome, DataFolder, SwitchRegistry};
use std::env;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hemu-home", about = "Inspect and manage the Hemu home folder")]
struct Args {
    /// Core log level: off, error, warn, info, debug or trace
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also write core logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the resolved home folder
    Resolve {
        /// Print the full resolution report as JSON
        #[arg(long)]
        report: bool,
    },
    /// List scored candidate folders, best first
    Candidates,
    /// Migrate predecessor data into the home folder
    Migrate,
    /// Print every supported launch switch
    Switches,
    /// Parse launch arguments against the saved settings
    Apply {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Replace the saved settings with defaults
    ResetSettings,
}

fn configure_logging(args: &Args) -> Result<()> {
    let config = LogConfig::global();
    if let Some(level) = &args.log_level {
        let level = LogLevel::from_str(level)
            .with_context(|| format!("unknown log level '{}'", level))?;
        config.set_global_level(level);
        // an explicit level applies to every category
        for category in LogCategory::ALL {
            config.set_level(category, LogLevel::Off);
        }
    }
    if let Some(path) = &args.log_file {
        config
            .set_log_file(path.clone())
            .with_context(|| format!("cannot open log file {}", path.display()))?;
    }
    Ok(())
}

fn candidates<P: PlatformFolders>(home: &ConfigHome<P>) -> Result<()> {
    let ranked = match discover(home.platform()) {
        Discovery::Override(folder) => {
            log::info!("HEMU_HOME override in effect: {}", folder.display());
            Vec::new()
        }
        Discovery::Scan(scan) => rank_candidates(score_folders(&scan.candidates)),
    };
    println!("{}", serde_json::to_string_pretty(&ranked)?);
    Ok(())
}

fn migrate<P: PlatformFolders>(home: &ConfigHome<P>) -> Result<()> {
    match home.refresh().migration {
        Some(outcome) => println!("{}", serde_json::to_string_pretty(&outcome)?),
        None => println!("HEMU_HOME override in effect, nothing to migrate"),
    }
    Ok(())
}

fn apply<P: PlatformFolders>(home: &ConfigHome<P>, args: &[String]) -> Result<()> {
    let mut config = home.load_config()?;
    let registry = SwitchRegistry::standard();
    let context = ParseContext {
        original_folder: env::current_dir()?,
        movie_folder: home.data_folder(DataFolder::Movies, &config),
    };

    let parsed = CommandLine::parse(args, &context, &registry, &mut config);
    parsed.apply_debug_automation(&mut config);

    for error in &parsed.errors {
        eprintln!("{}", error);
    }
    for file in &parsed.files_to_load {
        println!("load: {}", file.display());
    }
    for script in &parsed.lua_scripts {
        println!("script: {}", script.display());
    }
    if let Some(movie) = &parsed.movie_to_record {
        println!("record movie: {}", movie.display());
    }
    if parsed.headless {
        println!("headless");
    }

    if parsed.do_not_save_settings {
        home.disable_save_settings();
        log::info!("settings not saved (--doNotSaveSettings)");
        return Ok(());
    }
    home.save_config(&config)?;
    println!("saved {}", home.config_file().display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    configure_logging(&args)?;

    let home = ConfigHome::system();
    match &args.command {
        Command::Resolve { report: false } => println!("{}", home.home_folder().display()),
        Command::Resolve { report: true } => {
            let report = home.resolve_uncached();
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Candidates => candidates(&home)?,
        Command::Migrate => migrate(&home)?,
        Command::Switches => {
            for (section, text) in available_switches(&SwitchRegistry::standard()) {
                println!("{}:\n{}", section, text);
            }
        }
        Command::Apply { args } => apply(&home, args)?,
        Command::ResetSettings => {
            let current = home.load_config()?;
            home.reset_settings(&current)?;
            println!("settings reset in {}", home.config_file().display());
        }
    }

    Ok(())
}
