//! Database operations: schema, open/load, and the person store used by the importer.

mod connection;
mod store;

pub use connection::{
    count_countries, count_persons, find_person, load_persons, open_db, open_db_in_memory,
};
pub use store::{PersonStore, SqliteStore};

/// WAL tuning pragmas (synchronous, autocheckpoint, size limit). Apply after journal_mode = WAL.
pub(crate) const WAL_PRAGMAS: &str = r#"
        PRAGMA synchronous = NORMAL;
        PRAGMA wal_autocheckpoint = 10000;
        PRAGMA journal_size_limit = 67108864;
        "#;

/// Insert statement for countries table.
pub(crate) const INSERT_COUNTRY_SQL: &str = "INSERT INTO countries \
    (name, continent, capital, population, area) VALUES (?1, ?2, ?3, ?4, ?5)";

/// Insert statement for persons table.
pub(crate) const INSERT_PERSON_SQL: &str = "INSERT INTO persons \
    (name, birthday, sex, eye_color, hair_color, weight, height, origin, citizenship, meals) \
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)";

/// Schema for countries and persons. Natural keys are UNIQUE: country name,
/// person (name, birthday). Weight and height are optional.
pub(crate) const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS countries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    continent TEXT NOT NULL,
    capital TEXT NOT NULL,
    population INTEGER NOT NULL,
    area REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS persons (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    birthday TEXT NOT NULL,
    sex TEXT NOT NULL,
    eye_color TEXT NOT NULL,
    hair_color TEXT NOT NULL,
    weight REAL,
    height REAL,
    origin INTEGER NOT NULL REFERENCES countries(id),
    citizenship INTEGER NOT NULL REFERENCES countries(id),
    meals TEXT NOT NULL,
    UNIQUE (name, birthday)
);
"#;
