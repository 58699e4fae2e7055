mod cli;
mod commands;
mod config;
mod lock;
mod model;
mod session;
mod storage;
mod ui;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    env_logger::init();
    let args = cli::Cli::parse();
    let command = args.command.unwrap_or(cli::Command::Tui);
    match command {
        cli::Command::List => commands::list(),
        cli::Command::Show { id } => commands::show(id),
        cli::Command::Add { id, text } => commands::add(id, text),
        cli::Command::Delete { id } => commands::delete(id),
        cli::Command::Rename { id, new_id } => commands::rename(id, new_id),
        cli::Command::Dir { path } => commands::dir(path),
        cli::Command::Tui => commands::tui(),
    }
}
