use std::env;
use std::io::{self, BufRead, Read};
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;

use crate::catalog::{Catalog, Category, CreateRequest, Created};
use crate::config::{StoreConfig, DEFAULT_DATA_DIR};
use crate::editor::{BufferEditor, EditorSurface};
use crate::error::{NotebookError, Result};
use crate::notification::{format_notification, Notification};
use crate::session;
use crate::storage::Storage;
use crate::store::NotebookStore;

type CliStore = NotebookStore<Box<dyn Storage>, BufferEditor>;

/// Find the data directory by looking for .notebooks/ in the current
/// directory and its parents. Falls back to ./.notebooks.
fn find_data_dir() -> PathBuf {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut current = cwd.as_path();
    loop {
        let candidate = current.join(DEFAULT_DATA_DIR);
        if candidate.is_dir() {
            return candidate;
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return cwd.join(DEFAULT_DATA_DIR),
        }
    }
}

fn load_config(data_dir: Option<&Path>) -> Result<StoreConfig> {
    let dir = match data_dir {
        Some(dir) => dir.to_path_buf(),
        None => find_data_dir(),
    };
    StoreConfig::load(&dir)
}

fn open_store(data_dir: Option<&Path>, id: &str) -> Result<CliStore> {
    let config = load_config(data_dir)?;
    let storage = config.open_storage()?;
    Ok(NotebookStore::load(id, storage, BufferEditor::new(), &config))
}

/// Print queued notifications. A failed write is turned into an error so
/// the process exits non-zero.
fn report(store: &mut CliStore) -> Result<()> {
    let mut failure = None;
    for notification in store.take_notifications() {
        if notification.is_error() {
            eprintln!("Warning: {}", format_notification(&notification));
        }
        if let Notification::PersistFailed { reason } = notification {
            failure = Some(reason);
        }
    }
    match failure {
        Some(reason) => Err(NotebookError::Persistence(reason)),
        None => Ok(()),
    }
}

/// Turn a 1-based page number from the command line into an index.
fn page_index(store: &CliStore, page: usize) -> Result<usize> {
    let len = store.notebook().pages.len();
    if page == 0 || page > len {
        return Err(NotebookError::InvalidArgument(format!(
            "no page {} in notebook {} (has {} pages)",
            page,
            store.notebook().id,
            len
        )));
    }
    Ok(page - 1)
}

pub fn handle_show(data_dir: Option<&Path>, id: String, json: bool) -> Result<()> {
    let mut store = open_store(data_dir, &id)?;
    report(&mut store)?;

    if json {
        println!("{}", serde_json::to_string_pretty(store.notebook())?);
        return Ok(());
    }

    let notebook = store.notebook();
    let page = notebook.current();
    println!("{} ({})", notebook.title, notebook.id);
    println!(
        "Page {} of {} - {}",
        notebook.current_page + 1,
        notebook.pages.len(),
        page.display_title(notebook.current_page)
    );
    println!();
    println!("{}", store.editor().get_content().unwrap_or_default());
    Ok(())
}

pub fn handle_toc(data_dir: Option<&Path>, id: String, json: bool) -> Result<()> {
    let mut store = open_store(data_dir, &id)?;
    report(&mut store)?;

    if json {
        let entries: Vec<_> = store
            .table_of_contents()
            .into_iter()
            .map(|e| {
                serde_json::json!({
                    "page": e.index + 1,
                    "id": e.page_id,
                    "title": e.title,
                    "current": e.current,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for entry in store.table_of_contents() {
        let marker = if entry.current { '*' } else { ' ' };
        println!("{} {:>3}  {}", marker, entry.index + 1, entry.title);
    }
    Ok(())
}

pub fn handle_title(
    data_dir: Option<&Path>,
    id: String,
    title: String,
    page: Option<usize>,
) -> Result<()> {
    let mut store = open_store(data_dir, &id)?;
    if let Some(page) = page {
        let index = page_index(&store, page)?;
        store.go_to_page(index)?;
    }

    store.set_page_title(&title);
    store.save_current_page();
    report(&mut store)?;

    println!(
        "Renamed page {} of notebook {} to \"{}\"",
        store.current_page_index() + 1,
        id,
        title
    );
    Ok(())
}

pub fn handle_write(
    data_dir: Option<&Path>,
    id: String,
    text: Option<String>,
    page: Option<usize>,
    title: Option<String>,
    stdin: bool,
) -> Result<()> {
    let content = if stdin {
        let mut content = String::new();
        io::stdin().read_to_string(&mut content)?;
        content
    } else {
        text.ok_or_else(|| {
            NotebookError::InvalidArgument("provide content or --stdin".to_string())
        })?
    };

    let mut store = open_store(data_dir, &id)?;
    if let Some(page) = page {
        let index = page_index(&store, page)?;
        store.go_to_page(index)?;
    }

    store.editor_mut().replace(&content);
    if let Some(title) = title {
        store.set_page_title(&title);
    }
    store.save_current_page();
    report(&mut store)?;

    println!(
        "Saved page {} of notebook {} ({} bytes)",
        store.current_page_index() + 1,
        id,
        content.len()
    );
    Ok(())
}

pub fn handle_add_page(data_dir: Option<&Path>, id: String, title: Option<String>) -> Result<()> {
    let mut store = open_store(data_dir, &id)?;
    let index = store.add_page();
    if let Some(title) = title {
        store.set_page_title(&title);
        store.save_current_page();
    }
    report(&mut store)?;

    println!(
        "Added page {} to notebook {}",
        index + 1,
        store.notebook().id
    );
    Ok(())
}

pub fn handle_edit(data_dir: Option<&Path>, id: String) -> Result<()> {
    let mut store = open_store(data_dir, &id)?;
    report(&mut store)?;

    if atty::is(atty::Stream::Stdin) {
        eprintln!("Type to edit; auto-saves after a pause. :help for commands, :q to quit.");
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    // Blocking stdin reads stay on their own thread so they cannot hold up
    // runtime shutdown.
    let (tx, rx) = mpsc::channel(64);
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    runtime.block_on(async {
        let mut stdout = tokio::io::stdout();
        session::run(&mut store, rx, &mut stdout).await
    })?;

    report(&mut store)
}

pub fn handle_list(data_dir: Option<&Path>, query: Option<String>, json: bool) -> Result<()> {
    let config = load_config(data_dir)?;
    let storage = config.open_storage()?;
    let catalog = Catalog::load(&*storage)?;
    let summaries = catalog.search(&*storage, query.as_deref())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else if summaries.is_empty() {
        println!("No notebooks found.");
    } else {
        for summary in summaries {
            let category = summary
                .category
                .map(|c| format!(" [{}]", c))
                .unwrap_or_default();
            println!(
                "{:>4}  {}{} ({} pages)",
                summary.id, summary.title, category, summary.pages
            );
        }
    }
    Ok(())
}

pub fn handle_create_notebook(
    data_dir: Option<&Path>,
    name: String,
    category: String,
    description: Option<String>,
    color: Option<String>,
    json: bool,
) -> Result<()> {
    let category: Category = category.parse().map_err(NotebookError::InvalidArgument)?;
    let request = CreateRequest::Notebook {
        name,
        category,
        description,
        color,
    };
    create(data_dir, request, json)
}

pub fn handle_create_category(
    data_dir: Option<&Path>,
    name: String,
    description: Option<String>,
    color: Option<String>,
    json: bool,
) -> Result<()> {
    let request = CreateRequest::Category {
        name,
        description,
        color,
    };
    create(data_dir, request, json)
}

fn create(data_dir: Option<&Path>, request: CreateRequest, json: bool) -> Result<()> {
    let config = load_config(data_dir)?;
    let mut storage = config.open_storage()?;
    let mut catalog = Catalog::load(&*storage)?;

    match catalog.apply(request, &mut *storage)? {
        Created::Notebook(entry) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&entry)?);
            } else {
                println!(
                    "Created notebook {} - {} [{}]",
                    entry.notebook_id(),
                    entry.base.name,
                    entry.category
                );
            }
        }
        Created::Category(entry) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&entry)?);
            } else {
                println!("Created category {}", entry.base.name);
            }
        }
    }
    Ok(())
}
