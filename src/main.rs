use clap::Parser;
use cleaver::cli::{Cli, Commands};
use miette::Result;

fn main() -> Result<()> {
    // Install miette's fancy error handler for readable diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Init(args) => cleaver::cli::commands::init::run(args),
        Commands::Config(cmd) => cleaver::cli::commands::config::run(cmd),
        Commands::Sheet(cmd) => cleaver::cli::commands::sheet::run(cmd),
        Commands::Pkg(cmd) => cleaver::cli::commands::pkg::run(cmd),
    }
}
