//! Open the database and read persons back.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row};
use std::path::Path;

use crate::record::{Country, Person, from_db_label};

use super::{SCHEMA, WAL_PRAGMAS};

/// Enable WAL and apply schema to an open connection (idempotent).
fn apply_wal_and_schema(conn: &Connection) -> Result<()> {
    conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))
        .context("enable WAL")?;
    conn.execute_batch(WAL_PRAGMAS).context("set WAL pragmas")?;
    conn.execute_batch(SCHEMA).context("create schema")?;
    Ok(())
}

/// Open or create the database and ensure schema + WAL.
pub fn open_db(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("open database {}", path.display()))?;
    apply_wal_and_schema(&conn)?;
    Ok(conn)
}

/// Open an in-memory DB with the same schema (tests, dry runs; no WAL pragmas needed).
pub fn open_db_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("open in-memory database")?;
    conn.execute_batch(SCHEMA).context("create schema")?;
    Ok(conn)
}

fn count(conn: &Connection, table: &str) -> Option<usize> {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get::<_, i64>(0)
    })
    .ok()
    .map(|n| n.max(0) as usize)
}

/// Number of stored persons, or None if the query fails.
pub fn count_persons(conn: &Connection) -> Option<usize> {
    count(conn, "persons")
}

/// Number of stored countries, or None if the query fails.
pub fn count_countries(conn: &Connection) -> Option<usize> {
    count(conn, "countries")
}

const SELECT_PERSON_SQL: &str = "SELECT p.name, p.birthday, p.sex, p.eye_color, p.hair_color, \
    p.weight, p.height, p.meals, \
    o.name, o.continent, o.capital, o.population, o.area, \
    c.name, c.continent, c.capital, c.population, c.area \
    FROM persons p \
    JOIN countries o ON o.id = p.origin \
    JOIN countries c ON c.id = p.citizenship";

fn invalid_column(idx: usize, what: &str, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        format!("invalid {what}: {value}").into(),
    )
}

fn label_at<T>(row: &Row<'_>, idx: usize, what: &str) -> rusqlite::Result<Option<T>>
where
    T: for<'de> serde::Deserialize<'de>,
{
    let s: String = row.get(idx)?;
    from_db_label(&s)
        .map(Some)
        .ok_or_else(|| invalid_column(idx, what, &s))
}

fn country_at(row: &Row<'_>, base: usize) -> rusqlite::Result<Country> {
    Ok(Country {
        name: row.get(base)?,
        continent: label_at(row, base + 1, "continent")?,
        capital: row.get(base + 2)?,
        population: row.get(base + 3)?,
        area: row.get(base + 4)?,
    })
}

/// Weight and height are nullable columns; everything else was validated before insert.
fn person_from_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    let birthday: String = row.get(1)?;
    let birthday = NaiveDate::parse_from_str(&birthday, "%Y-%m-%d")
        .map_err(|_| invalid_column(1, "birthday", &birthday))?;
    Ok(Person {
        name: row.get(0)?,
        birthday: Some(birthday),
        sex: label_at(row, 2, "sex")?,
        eye_color: label_at(row, 3, "eye color")?,
        hair_color: label_at(row, 4, "hair color")?,
        weight: row.get(5)?,
        height: row.get(6)?,
        favorite_meals: row.get(7)?,
        country_of_origin: Some(country_at(row, 8)?),
        citizenship: Some(country_at(row, 13)?),
    })
}

/// Load every stored person, ordered by insertion.
pub fn load_persons(conn: &Connection) -> Result<Vec<Person>> {
    let mut stmt = conn.prepare(&format!("{SELECT_PERSON_SQL} ORDER BY p.id"))?;
    let rows = stmt.query_map([], person_from_row)?;
    let mut persons = Vec::new();
    for row in rows {
        persons.push(row?);
    }
    Ok(persons)
}

/// Look up one person by natural key.
pub fn find_person(
    conn: &Connection,
    name: &str,
    birthday: NaiveDate,
) -> Result<Option<Person>> {
    let sql = format!("{SELECT_PERSON_SQL} WHERE p.name = ?1 AND p.birthday = ?2");
    let key = (name, birthday.format("%Y-%m-%d").to_string());
    conn.query_row(&sql, key, person_from_row)
        .optional()
        .context("find person")
}
