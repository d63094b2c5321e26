//! Person store: validate, resolve countries by name, insert one person per transaction.

use rusqlite::{Connection, ErrorCode, OptionalExtension, Transaction};

use crate::error::PersistError;
use crate::record::{Country, DbLabel, Person};

use super::{INSERT_COUNTRY_SQL, INSERT_PERSON_SQL};

/// Sink for validated person records. One call persists one record (returning its id)
/// or rejects it.
pub trait PersonStore {
    fn persist(&mut self, person: &Person) -> Result<i64, PersistError>;
}

/// SQLite-backed store. Each [`PersonStore::persist`] runs in its own transaction so a
/// rejected record never leaves a half-written country behind.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

fn duplicate_of(person: &Person) -> PersistError {
    PersistError::Duplicate {
        name: person.name.clone(),
        birthday: person.birthday_label(),
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

/// Country id by name, inserting the country on first reference.
fn resolve_country(tx: &Transaction<'_>, country: &Country) -> rusqlite::Result<i64> {
    let existing = tx
        .query_row(
            "SELECT id FROM countries WHERE name = ?1",
            [country.name.as_str()],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }
    tx.execute(
        INSERT_COUNTRY_SQL,
        (
            country.name.as_str(),
            country.continent.map(|c| c.db_label()),
            country.capital.as_str(),
            country.population,
            country.area,
        ),
    )?;
    Ok(tx.last_insert_rowid())
}

fn person_exists(tx: &Transaction<'_>, person: &Person) -> rusqlite::Result<bool> {
    tx.query_row(
        "SELECT 1 FROM persons WHERE name = ?1 AND birthday = ?2",
        (person.name.as_str(), person.birthday_label()),
        |_| Ok(()),
    )
    .optional()
    .map(|hit| hit.is_some())
}

impl PersonStore for SqliteStore {
    fn persist(&mut self, person: &Person) -> Result<i64, PersistError> {
        person.validate().map_err(PersistError::Invalid)?;
        let (Some(origin), Some(citizenship)) = (&person.country_of_origin, &person.citizenship)
        else {
            return Err(PersistError::Invalid(vec![format!(
                "countries missing for {}",
                person.name
            )]));
        };

        let tx = self.conn.transaction()?;
        if person_exists(&tx, person)? {
            return Err(duplicate_of(person));
        }
        let origin = resolve_country(&tx, origin)?;
        let citizenship = resolve_country(&tx, citizenship)?;
        let inserted = tx.execute(
            INSERT_PERSON_SQL,
            (
                person.name.as_str(),
                person.birthday_label(),
                person.sex.map(|s| s.db_label()),
                person.eye_color.map(|c| c.db_label()),
                person.hair_color.map(|c| c.db_label()),
                person.weight,
                person.height,
                origin,
                citizenship,
                person.favorite_meals.as_str(),
            ),
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_constraint_violation(&e) => return Err(duplicate_of(person)),
            Err(e) => return Err(e.into()),
        }
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(id)
    }
}
