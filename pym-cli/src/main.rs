// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::Input;

use pym::{Project, Pym, PymError};

mod logging;
mod progress;

#[derive(Parser, Debug)]
#[clap(name = "pym", version, about = "Manage packages for pym projects")]
struct Cli {
    /// Project directory (defaults to the current directory)
    #[clap(global = true, short, long)]
    target: Option<Utf8PathBuf>,

    #[clap(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize a pym project in the target directory
    Init {},
    /// Install the specified packages, or everything from pym.json
    Install {
        /// Package references, e.g. https://host/team/tornado.git#v6.0.0
        /// or tornado@^6.0.0
        packages: Vec<String>,

        /// Record the installed packages in pym.json
        #[clap(long)]
        save: bool,
    },
    /// Uninstall the specified packages
    Uninstall {
        #[clap(required = true)]
        packages: Vec<String>,

        /// Drop the packages from pym.json as well
        #[clap(long)]
        save: bool,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", style("[error]").red().bold(), err);
            if let Some(suggestion) = err
                .downcast_ref::<PymError>()
                .and_then(PymError::suggestion)
            {
                eprintln!("{} {}", style("[hint]").cyan(), suggestion);
            }
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let bars = progress::ActiveBars::new();
    logging::setup(cli.verbose.log_level_filter(), bars.clone());

    let root = match &cli.target {
        Some(target) => canonicalize(target)?,
        None => current_dir()?,
    };

    match cli.command {
        Commands::Init {} => {
            let mut prompt = prompt();
            pym::init(&root, &mut prompt)?;
            success("initialized project");
            Ok(())
        }
        Commands::Install { packages, save } => {
            let mut pkg = engine(&root, &bars)?;
            pkg.install(&packages, save)?;
            success("install complete");
            Ok(())
        }
        Commands::Uninstall { packages, save } => {
            let mut pkg = engine(&root, &bars)?;
            pkg.uninstall(&packages, save)?;
            success("uninstall complete");
            Ok(())
        }
    }
}

/// Load the project and wire the engine's callbacks to this terminal.
fn engine<'p>(root: &Utf8PathBuf, bars: &'p progress::ActiveBars) -> Result<Pym<'p>> {
    let project = Project::load(root.clone())
        .map_err(PymError::from)
        .with_context(|| format!("invalid target directory '{}'", root))?;
    let mut pkg = Pym::new(project)?;

    let start = bars.clone();
    pkg.with_progress_start(move |id, len| start.start(id, len));
    let update = bars.clone();
    pkg.with_progress_update(move |id, delta| update.update(id, delta));
    let finish = bars.clone();
    pkg.with_progress_finish(move |id| finish.finish(id));

    let ask = bars.clone();
    pkg.with_prompt(move |question, suggestion| {
        let mut answer = String::new();
        ask.suspended(|| answer = ask_field(question, suggestion));
        answer
    });

    Ok(pkg)
}

fn prompt() -> pym::Prompt<'static> {
    Box::new(|question, suggestion| ask_field(question, suggestion))
}

fn ask_field(question: &str, suggestion: Option<&str>) -> String {
    let mut input = Input::<String>::new();
    input.with_prompt(question).allow_empty(true);
    if let Some(suggestion) = suggestion {
        input.default(suggestion.to_string());
    }
    input.interact_text().unwrap_or_default()
}

fn success(message: &str) {
    println!("{} {}", style("[success]").green().bold(), message);
}

fn canonicalize<P: AsRef<Path>>(path: P) -> Result<Utf8PathBuf> {
    Ok(Utf8PathBuf::try_from(dunce::canonicalize(path)?)?)
}

fn current_dir() -> Result<Utf8PathBuf> {
    canonicalize(std::env::current_dir()?)
}
