use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cloudnotes", version, about = "Folder-of-text-files note taking")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List notes in the notes folder
    List,
    /// Print a note to stdout
    Show {
        /// Note name (defaults to the last open note)
        id: Option<String>,
    },
    /// Create or overwrite a note
    Add {
        /// Note name (defaults to a generated one)
        id: Option<String>,
        /// Note text (read from stdin when omitted)
        #[arg(long)]
        text: Option<String>,
    },
    /// Move a note to the trash
    Delete {
        /// Note name to delete
        id: String,
    },
    /// Rename a note
    Rename {
        /// Current note name
        id: String,
        /// New note name
        new_id: String,
    },
    /// Show or change the notes folder
    Dir {
        /// New notes folder
        path: Option<PathBuf>,
    },
    /// Launch the interactive TUI
    Tui,
}
