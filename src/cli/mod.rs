mod commands;
mod handlers;

pub use commands::{Cli, Commands, CreateCommand, CreateEntity};
pub use handlers::{
    handle_add_page, handle_create_category, handle_create_notebook, handle_edit, handle_list,
    handle_show, handle_title, handle_toc, handle_write,
};
