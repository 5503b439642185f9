//! Interactive line-based editing session.
//!
//! Plain lines are appended to the current page as edits and go through
//! the store's debounced auto-save. Lines starting with `:` are commands.
//! Everything runs on one task: the loop waits for either the next input
//! line or the pending auto-save deadline, whichever comes first.

use chrono::Utc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

use crate::editor::{BufferEditor, EditorSurface};
use crate::error::{NotebookError, Result};
use crate::notification::{format_notification, Notification};
use crate::storage::Storage;
use crate::store::NotebookStore;

pub const HELP: &str = "\
:title <text>  rename the current page
:new           add a page
:go <n>        go to page n
:toc           list pages
:save          save now
:status        show when the notebook was last saved
:q             save and quit
";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Text(String),
    Title(String),
    NewPage,
    Go(usize),
    Toc,
    Save,
    Status,
    Help,
    Quit,
    Unknown(String),
}

pub fn parse_line(line: &str) -> Command {
    let Some(rest) = line.strip_prefix(':') else {
        return Command::Text(line.to_string());
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest.trim(), ""),
    };

    match name {
        "title" => Command::Title(arg.to_string()),
        "new" => Command::NewPage,
        "go" => match arg.parse::<usize>() {
            Ok(n) => Command::Go(n),
            Err(_) => Command::Unknown(line.to_string()),
        },
        "toc" => Command::Toc,
        "save" | "w" => Command::Save,
        "status" => Command::Status,
        "help" | "h" => Command::Help,
        "q" | "quit" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

/// Run the session until `:q` or the input closes, then save.
pub async fn run<S, W>(
    store: &mut NotebookStore<S, BufferEditor>,
    mut input: mpsc::Receiver<String>,
    out: &mut W,
) -> Result<()>
where
    S: Storage,
    W: AsyncWrite + Unpin,
{
    let header = format!(
        "{} - page {} of {}\n",
        store.notebook().title,
        store.current_page_index() + 1,
        store.notebook().pages.len()
    );
    out.write_all(header.as_bytes()).await?;

    loop {
        let deadline = store.autosave_deadline();
        tokio::select! {
            line = input.recv() => {
                let Some(line) = line else { break };
                if !handle(store, parse_line(&line), out).await? {
                    break;
                }
            }
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if store.tick(Instant::now()) {
                    out.write_all(b"(auto-saved)\n").await?;
                }
            }
        }
        report_notifications(store, out).await?;
    }

    store.unmount();
    let saved = store.save_current_page();
    let failure = report_notifications(store, out).await?;
    out.write_all(format!("{}\n", store.last_saved_text(Utc::now())).as_bytes())
        .await?;
    out.flush().await?;

    if saved {
        return Ok(());
    }
    Err(NotebookError::Persistence(
        failure.unwrap_or_else(|| "final save did not reach storage".to_string()),
    ))
}

async fn handle<S, W>(
    store: &mut NotebookStore<S, BufferEditor>,
    command: Command,
    out: &mut W,
) -> Result<bool>
where
    S: Storage,
    W: AsyncWrite + Unpin,
{
    match command {
        Command::Text(line) => {
            let content = store.editor_mut().append_line(&line);
            store.editor_changed(content, Instant::now());
        }
        Command::Title(title) => store.set_page_title(&title),
        Command::NewPage => {
            let index = store.add_page();
            out.write_all(format!("page {}\n", index + 1).as_bytes())
                .await?;
        }
        Command::Go(n) => {
            let len = store.notebook().pages.len();
            if n == 0 || n > len {
                out.write_all(format!("no page {} (1-{})\n", n, len).as_bytes())
                    .await?;
            } else {
                store.go_to_page(n - 1)?;
                let body = store.editor().get_content().unwrap_or_default();
                out.write_all(format!("page {}: {}\n{}\n", n, store.title_field(), body).as_bytes())
                    .await?;
            }
        }
        Command::Toc => {
            for entry in store.table_of_contents() {
                let marker = if entry.current { '*' } else { ' ' };
                out.write_all(
                    format!("{} {:>3}  {}\n", marker, entry.index + 1, entry.title).as_bytes(),
                )
                .await?;
            }
        }
        Command::Save => {
            store.save_current_page();
        }
        Command::Status => {
            out.write_all(format!("{}\n", store.last_saved_text(Utc::now())).as_bytes())
                .await?;
        }
        Command::Help => out.write_all(HELP.as_bytes()).await?,
        Command::Quit => return Ok(false),
        Command::Unknown(line) => {
            out.write_all(format!("unknown command '{}' (:help)\n", line).as_bytes())
                .await?;
        }
    }
    Ok(true)
}

/// Print queued notifications. Returns the reason of the last failed write,
/// if any.
async fn report_notifications<S, W>(
    store: &mut NotebookStore<S, BufferEditor>,
    out: &mut W,
) -> Result<Option<String>>
where
    S: Storage,
    W: AsyncWrite + Unpin,
{
    let mut failure = None;
    for notification in store.take_notifications() {
        let prefix = if notification.is_error() { "warning: " } else { "" };
        out.write_all(format!("{}{}\n", prefix, format_notification(&notification)).as_bytes())
            .await?;
        if let Notification::PersistFailed { reason } = notification {
            failure = Some(reason);
        }
    }
    Ok(failure)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::StoreConfig;
    use crate::entity::{notebook_key, Notebook};
    use crate::storage::MemoryStorage;
    use tokio::time::sleep;

    fn open() -> NotebookStore<MemoryStorage, BufferEditor> {
        NotebookStore::load(
            "s",
            MemoryStorage::new(),
            BufferEditor::new(),
            &StoreConfig::default(),
        )
    }

    fn stored(store: &NotebookStore<MemoryStorage, BufferEditor>) -> Notebook {
        let text = store.storage().get(&notebook_key("s")).unwrap().unwrap();
        Notebook::decode(&text).unwrap()
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("hello"), Command::Text("hello".to_string()));
        assert_eq!(parse_line(":title  My page "), Command::Title("My page".to_string()));
        assert_eq!(parse_line(":go 3"), Command::Go(3));
        assert_eq!(parse_line(":new"), Command::NewPage);
        assert_eq!(parse_line(":q"), Command::Quit);
        assert!(matches!(parse_line(":go x"), Command::Unknown(_)));
        assert!(matches!(parse_line(":bogus"), Command::Unknown(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_edits_auto_saves_once() {
        let mut store = open();
        let (tx, rx) = mpsc::channel(8);
        let mut out = Vec::new();

        let driver = async move {
            tx.send("a".to_string()).await.unwrap();
            sleep(Duration::from_millis(200)).await;
            tx.send("b".to_string()).await.unwrap();
            sleep(Duration::from_millis(200)).await;
            tx.send("c".to_string()).await.unwrap();
            sleep(Duration::from_millis(3000)).await;
        };

        let (result, ()) = tokio::join!(run(&mut store, rx, &mut out), driver);
        result.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("(auto-saved)").count(), 1);
        // One auto-save plus the final save on exit.
        assert_eq!(store.storage().write_count(), 2);
        assert_eq!(stored(&store).pages[0].content, "a\nb\nc");
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_auto_save_before_quiet_window() {
        let mut store = open();
        let (tx, rx) = mpsc::channel(8);
        let mut out = Vec::new();

        let driver = async move {
            for word in ["one", "two", "three", "four"] {
                tx.send(word.to_string()).await.unwrap();
                sleep(Duration::from_millis(900)).await;
            }
            tx.send(":q".to_string()).await.unwrap();
        };

        let (result, ()) = tokio::join!(run(&mut store, rx, &mut out), driver);
        result.unwrap();

        assert_eq!(store.storage().write_count(), 1);
        assert!(!String::from_utf8(out).unwrap().contains("(auto-saved)"));
        assert_eq!(stored(&store).pages[0].content, "one\ntwo\nthree\nfour");
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_drive_the_store() {
        let mut store = open();
        let (tx, rx) = mpsc::channel(16);
        let mut out = Vec::new();

        for line in [
            ":title Groceries",
            "milk",
            ":new",
            ":title Errands",
            "post office",
            ":go 1",
            ":go 9",
            ":toc",
            ":q",
        ] {
            tx.send(line.to_string()).await.unwrap();
        }

        run(&mut store, rx, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("page 1: Groceries\nmilk"));
        assert!(text.contains("no page 9 (1-2)"));
        assert!(text.contains("*   1  Groceries"));
        assert!(text.contains("    2  Errands"));

        let notebook = stored(&store);
        assert_eq!(notebook.pages.len(), 2);
        assert_eq!(notebook.pages[0].content, "milk");
        assert_eq!(notebook.pages[1].content, "post office");
        assert_eq!(notebook.current_page, 0);
        assert_eq!(store.editor().get_content().as_deref(), Some("milk"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_final_save_is_reported() {
        let mut store = open();
        store.storage_mut().set_failing(true);
        let (tx, rx) = mpsc::channel(8);
        let mut out = Vec::new();

        tx.send("typed text".to_string()).await.unwrap();
        tx.send(":q".to_string()).await.unwrap();

        let err = run(&mut store, rx, &mut out).await.unwrap_err();
        assert!(err.is_persistence());

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("warning: Could not save notebook"));
        assert!(text.contains("Not saved yet"));
        assert_eq!(store.storage().write_count(), 0);
        assert_eq!(store.notebook().pages[0].content, "typed text");
    }
}
