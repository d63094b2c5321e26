//! Shared fixtures: person records and batch files in a temp directory.

#![allow(dead_code)]

use chrono::NaiveDate;
use roster::{Color, Continent, Country, Person, Sex};
use std::fs;
use std::path::{Path, PathBuf};

pub fn country(name: &str) -> Country {
    Country {
        name: name.to_string(),
        continent: Some(Continent::Europe),
        capital: format!("{name} City"),
        population: 5_000_000,
        area: 120_000.0,
    }
}

pub fn born(seq: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(1960, 1, 1).unwrap() + chrono::Days::new(seq as u64)
}

/// A valid person; `seq` varies the birthday so names can repeat across fixtures.
pub fn person(name: &str, seq: u32) -> Person {
    Person {
        name: name.to_string(),
        birthday: Some(born(seq)),
        sex: Some(if seq % 2 == 0 { Sex::Male } else { Sex::Female }),
        eye_color: Some(Color::Brown),
        hair_color: Some(Color::Black),
        weight: Some(70.0),
        height: Some(175.0),
        country_of_origin: Some(country("Portugal")),
        citizenship: Some(country("Spain")),
        favorite_meals: "bread,cheese".to_string(),
    }
}

/// `count` valid persons named `<prefix>-<index>`.
pub fn batch(prefix: &str, count: usize) -> Vec<Person> {
    (0..count)
        .map(|i| person(&format!("{prefix}-{i:04}"), i as u32))
        .collect()
}

pub fn write_batch(dir: &Path, file_name: &str, persons: &[Person]) -> PathBuf {
    let path = dir.join(file_name);
    fs::write(&path, serde_json::to_string(persons).unwrap()).unwrap();
    path
}

/// `files` batch files of `per_file` records each: `batch_NN.json` with records `fNN-IIII`.
pub fn write_batches(dir: &Path, files: usize, per_file: usize) {
    for f in 0..files {
        write_batch(
            dir,
            &format!("batch_{f:02}.json"),
            &batch(&format!("f{f:02}"), per_file),
        );
    }
}

/// A file that starts like a valid batch but is cut off mid-record.
pub fn write_truncated(dir: &Path, file_name: &str) -> PathBuf {
    let full = serde_json::to_string(&batch("cut", 2)).unwrap();
    let path = dir.join(file_name);
    fs::write(&path, &full[..full.len() / 2]).unwrap();
    path
}
