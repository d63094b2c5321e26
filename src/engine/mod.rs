//! Engine module: storage, import consumer, CLI wiring

pub mod arg_parser;
pub mod cli;
pub mod db_ops;
pub mod importer;
pub mod progress;
pub mod tools;

// Re-export commonly used functions
pub use arg_parser::Cli;
pub use cli::handle_run;
pub use db_ops::{
    PersonStore, SqliteStore, count_countries, count_persons, find_person, load_persons, open_db,
    open_db_in_memory,
};
pub use importer::{import_dir_with_progress, import_stream, upload_file};
pub use tools::{InputKind, classify_input, glob_match, resolve_db_path};
