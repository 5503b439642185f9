use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "notebook")]
#[command(version, about = "Notebooks of ordered pages with auto-save")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding notebook records (defaults to the nearest .notebooks/)
    #[arg(long, global = true, env = "NOTEBOOK_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show a notebook and its current page
    Show {
        /// Notebook ID
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the pages of a notebook
    Toc {
        /// Notebook ID
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rename a page
    Title {
        /// Notebook ID
        id: String,

        /// New page title
        title: String,

        /// Page number (1-based); defaults to the current page
        #[arg(long, short = 'p')]
        page: Option<usize>,
    },

    /// Replace the content of a page
    Write {
        /// Notebook ID
        id: String,

        /// New content (omit with --stdin)
        text: Option<String>,

        /// Page number (1-based); defaults to the current page
        #[arg(long, short = 'p')]
        page: Option<usize>,

        /// Also set the page title
        #[arg(long, short = 't')]
        title: Option<String>,

        /// Read content from stdin
        #[arg(long, conflicts_with = "text")]
        stdin: bool,
    },

    /// Append a new page and make it current
    AddPage {
        /// Notebook ID
        id: String,

        /// Title for the new page
        #[arg(long, short = 't')]
        title: Option<String>,
    },

    /// Edit a notebook interactively with auto-save
    Edit {
        /// Notebook ID
        id: String,
    },

    /// List stored notebooks
    List {
        /// Only notebooks whose title contains this text
        query: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a notebook or a category
    Create(CreateCommand),
}

#[derive(Args, Debug)]
pub struct CreateCommand {
    #[command(subcommand)]
    pub entity: CreateEntity,
}

#[derive(Subcommand, Debug)]
pub enum CreateEntity {
    /// Create a new notebook
    Notebook {
        /// Notebook name
        name: String,

        /// Category (personal, work, studies, other)
        #[arg(long, short = 'c', default_value = "personal")]
        category: String,

        /// Description
        #[arg(long, short = 'd')]
        description: Option<String>,

        /// Colour as a hex string
        #[arg(long)]
        color: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a new category
    Category {
        /// Category name
        name: String,

        /// Description
        #[arg(long, short = 'd')]
        description: Option<String>,

        /// Colour as a hex string
        #[arg(long)]
        color: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
