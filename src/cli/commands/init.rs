//! `cleaver init` - create a project in the current directory

use console::style;
use miette::{miette, Result};

use crate::core::project::Project;
use crate::store::Store;

#[derive(clap::Args, Debug)]
pub struct InitArgs {}

pub fn run(_args: InitArgs) -> Result<()> {
    let cwd = std::env::current_dir().map_err(|e| miette!("{}", e))?;
    let project = Project::init(&cwd).map_err(|e| miette!("{}", e))?;

    // Create the database up front so the first command does not race it.
    Store::open(&project.db_path()).map_err(|e| miette!("{}", e))?;

    println!(
        "{} {}",
        style("Initialized cleaver project in").green(),
        style(project.root().display()).bold()
    );
    println!(
        "Edit {} to set who is acting here.",
        style(project.identity_path().display()).cyan()
    );
    Ok(())
}
