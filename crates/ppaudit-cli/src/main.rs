//! ppaudit CLI: the `ppaudit` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    support::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Verify {
            archive,
            tooling,
            launcher,
            fix,
            json,
        } => commands::verify::run(commands::verify::Args {
            archive,
            tooling,
            launcher,
            fix,
            json,
        }),

        Commands::Dirs { archive, json } => commands::dirs::run(archive, json),

        Commands::Series {
            dir,
            start_year,
            end_year,
            extension,
            json,
        } => commands::series::run(dir, start_year, end_year, extension, json),

        Commands::Metadata {
            pp_root,
            tooling,
            json,
        } => commands::metadata::run(pp_root, tooling, json),

        Commands::Fix {
            component,
            year,
            pp_root,
            tooling,
            launcher,
            dry_run,
            json,
        } => commands::fix::run(commands::fix::Args {
            component,
            year,
            pp_root,
            tooling,
            launcher,
            dry_run,
            json,
        }),
    }
}
