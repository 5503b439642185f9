use clap::Parser;
use notebook_store::cli::{
    handle_add_page, handle_create_category, handle_create_notebook, handle_edit, handle_list,
    handle_show, handle_title, handle_toc, handle_write, Cli, Commands, CreateEntity,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_env("NOTEBOOK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let data_dir = cli.data_dir.as_deref();

    let result = match cli.command {
        Commands::Show { id, json } => handle_show(data_dir, id, json),
        Commands::Toc { id, json } => handle_toc(data_dir, id, json),
        Commands::Title { id, title, page } => handle_title(data_dir, id, title, page),
        Commands::Write {
            id,
            text,
            page,
            title,
            stdin,
        } => handle_write(data_dir, id, text, page, title, stdin),
        Commands::AddPage { id, title } => handle_add_page(data_dir, id, title),
        Commands::Edit { id } => handle_edit(data_dir, id),
        Commands::List { query, json } => handle_list(data_dir, query, json),
        Commands::Create(create) => match create.entity {
            CreateEntity::Notebook {
                name,
                category,
                description,
                color,
                json,
            } => handle_create_notebook(data_dir, name, category, description, color, json),
            CreateEntity::Category {
                name,
                description,
                color,
                json,
            } => handle_create_category(data_dir, name, description, color, json),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
