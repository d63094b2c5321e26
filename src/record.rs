//! Record types decoded from batch files, plus field validation.
//!
//! Wire format is a JSON array of person objects with camelCase keys and `yyyy-MM-dd` dates.
//! Enumerated attributes are closed: an unknown value makes the whole file malformed.

use chrono::{Local, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Inclusive weight bounds (kg).
pub const WEIGHT_RANGE: (f64, f64) = (50.0, 150.0);
/// Inclusive height bounds (cm).
pub const HEIGHT_RANGE: (f64, f64) = (60.0, 220.0);
/// Minimum length for person/country names and capitals.
pub const MIN_NAME_LEN: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sex {
    Male,
    Female,
}

/// Eye and hair color palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Color {
    Black,
    Blue,
    Brown,
    Gray,
    Green,
    Red,
    Yellow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Continent {
    Africa,
    Asia,
    Europe,
    NorthAmerica,
    SouthAmerica,
    Antarctica,
    Australia,
}

/// Stable column value for enum attributes (same spelling as the wire format).
pub trait DbLabel {
    fn db_label(&self) -> &'static str;
}

impl DbLabel for Sex {
    fn db_label(&self) -> &'static str {
        match self {
            Sex::Male => "MALE",
            Sex::Female => "FEMALE",
        }
    }
}

impl DbLabel for Color {
    fn db_label(&self) -> &'static str {
        match self {
            Color::Black => "BLACK",
            Color::Blue => "BLUE",
            Color::Brown => "BROWN",
            Color::Gray => "GRAY",
            Color::Green => "GREEN",
            Color::Red => "RED",
            Color::Yellow => "YELLOW",
        }
    }
}

impl DbLabel for Continent {
    fn db_label(&self) -> &'static str {
        match self {
            Continent::Africa => "AFRICA",
            Continent::Asia => "ASIA",
            Continent::Europe => "EUROPE",
            Continent::NorthAmerica => "NORTH_AMERICA",
            Continent::SouthAmerica => "SOUTH_AMERICA",
            Continent::Antarctica => "ANTARCTICA",
            Continent::Australia => "AUSTRALIA",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.db_label())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.db_label())
    }
}

impl fmt::Display for Continent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.db_label())
    }
}

/// Parse a stored column value back into an enum (inverse of [`DbLabel`]).
pub fn from_db_label<T: for<'de> Deserialize<'de>>(label: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(label.to_string())).ok()
}

/// A country referenced by a person. Unique by `name`.
///
/// Absent scalar fields decode to their zero value and absent `continent` to `None`, so a
/// sparse country fails validation on persist instead of failing the whole file at decode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Country {
    #[serde(default)]
    pub name: String,
    pub continent: Option<Continent>,
    #[serde(default)]
    pub capital: String,
    #[serde(default)]
    pub population: i64,
    #[serde(default, rename = "square", alias = "area")]
    pub area: f64,
}

/// One parsed person record. Unique by `(name, birthday)`.
///
/// Only the shape is enforced at decode time. Missing required attributes are `None` and
/// reported by [`Person::validate`]; `weight` and `height` are genuinely optional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(default)]
    pub name: String,
    pub birthday: Option<NaiveDate>,
    pub sex: Option<Sex>,
    pub eye_color: Option<Color>,
    pub hair_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    pub country_of_origin: Option<Country>,
    pub citizenship: Option<Country>,
    #[serde(default)]
    pub favorite_meals: String,
}

fn meals_pattern() -> &'static Regex {
    static MEALS: OnceLock<Regex> = OnceLock::new();
    MEALS.get_or_init(|| Regex::new(r"^\w{3,}(,\w{3,})*$").expect("static meals pattern"))
}

/// Push a violation message in the same shape for every field.
fn violation(out: &mut Vec<String>, property: &str, message: &str, value: impl fmt::Display) {
    out.push(format!(
        "Error {message}: property '{property}' has invalid value '{value}'"
    ));
}

fn check_present<T>(out: &mut Vec<String>, property: &str, message: &str, value: &Option<T>) {
    if value.is_none() {
        violation(out, property, message, "null");
    }
}

fn check_name(out: &mut Vec<String>, property: &str, subject: &str, verb: &str, value: &str) {
    if value.trim().is_empty() {
        violation(out, property, &format!("{subject} should not be blank"), value);
    } else if value.chars().count() < MIN_NAME_LEN {
        let message = format!("{subject} {verb} be of length {MIN_NAME_LEN} or greater");
        violation(out, property, &message, value);
    }
}

fn check_range(
    out: &mut Vec<String>,
    property: &str,
    unit: &str,
    value: Option<f64>,
    (lo, hi): (f64, f64),
) {
    let Some(value) = value else {
        return;
    };
    if value.is_nan() || value < lo {
        let message = format!("Person {property} should not be less than {lo} {unit}");
        violation(out, property, &message, value);
    } else if value > hi {
        let message = format!("Person {property} should not be greater than {hi} {unit}");
        violation(out, property, &message, value);
    }
}

impl Country {
    /// Collect constraint violations into `out`, prefixing property paths with `prefix`.
    pub fn collect_violations(&self, prefix: &str, out: &mut Vec<String>) {
        let name = format!("{prefix}.name");
        check_name(out, &name, "Country name", "must", &self.name);
        check_present(
            out,
            &format!("{prefix}.continent"),
            "Country continent should not be null",
            &self.continent,
        );
        let capital = format!("{prefix}.capital");
        check_name(out, &capital, "Country capital", "must", &self.capital);
        if self.population <= 0 {
            violation(
                out,
                &format!("{prefix}.population"),
                "Country population should be positive value",
                self.population,
            );
        }
        if self.area.is_nan() || self.area <= 0.0 {
            violation(
                out,
                &format!("{prefix}.square"),
                "Country square should be positive value",
                self.area,
            );
        }
    }
}

impl Person {
    /// Validate against today's local date.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        self.validate_at(Local::now().date_naive())
    }

    /// Validate all field constraints; `today` bounds the birthday (must be strictly earlier).
    pub fn validate_at(&self, today: NaiveDate) -> Result<(), Vec<String>> {
        let mut out = Vec::new();
        check_name(&mut out, "name", "Person name", "should", &self.name);
        match self.birthday {
            None => violation(&mut out, "birthday", "Person birthday should not be null", "null"),
            Some(b) if b >= today => {
                violation(&mut out, "birthday", "Person birthday should belong to past", b)
            }
            Some(_) => {}
        }
        check_present(&mut out, "sex", "Person sex should not be null", &self.sex);
        check_present(&mut out, "eyeColor", "Person eye color should not be null", &self.eye_color);
        check_present(
            &mut out,
            "hairColor",
            "Person hair color should not be null",
            &self.hair_color,
        );
        check_range(&mut out, "weight", "kg", self.weight, WEIGHT_RANGE);
        check_range(&mut out, "height", "cm", self.height, HEIGHT_RANGE);
        if self.favorite_meals.trim().is_empty() {
            violation(
                &mut out,
                "favoriteMeals",
                "List of favorite meals should not be blank",
                &self.favorite_meals,
            );
        } else if !meals_pattern().is_match(&self.favorite_meals) {
            violation(
                &mut out,
                "favoriteMeals",
                "Meals should be of length 3 or greater and separated by commas",
                &self.favorite_meals,
            );
        }
        match &self.country_of_origin {
            Some(c) => c.collect_violations("countryOfOrigin", &mut out),
            None => violation(
                &mut out,
                "countryOfOrigin",
                "Country of origin should not be null",
                "null",
            ),
        }
        match &self.citizenship {
            Some(c) => c.collect_violations("citizenship", &mut out),
            None => violation(
                &mut out,
                "citizenship",
                "Country of citizenship should not be null",
                "null",
            ),
        }
        if out.is_empty() { Ok(()) } else { Err(out) }
    }

    /// Birthday as stored (`yyyy-MM-dd`), or empty when missing.
    pub fn birthday_label(&self) -> String {
        self.birthday
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Person {
        let uk = Country {
            name: "United Kingdom".into(),
            continent: Some(Continent::Europe),
            capital: "London".into(),
            population: 67_596_281,
            area: 244_376.0,
        };
        Person {
            name: "Charley Thomas".into(),
            birthday: NaiveDate::from_ymd_opt(1970, 12, 10),
            sex: Some(Sex::Male),
            eye_color: Some(Color::Gray),
            hair_color: Some(Color::Yellow),
            weight: Some(67.0),
            height: Some(180.0),
            country_of_origin: Some(uk.clone()),
            citizenship: Some(uk),
            favorite_meals: "apple,watermelon".into(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn valid_person_passes() {
        assert!(sample().validate_at(today()).is_ok());
    }

    #[test]
    fn bounds_are_inclusive() {
        let mut p = sample();
        p.weight = Some(50.0);
        p.height = Some(220.0);
        assert!(p.validate_at(today()).is_ok());
        p.weight = Some(150.0);
        p.height = Some(60.0);
        assert!(p.validate_at(today()).is_ok());
    }

    #[test]
    fn reports_every_violation() {
        let mut p = sample();
        p.name = "Al".into();
        p.weight = Some(151.0);
        p.height = Some(59.5);
        p.birthday = Some(today());
        let errs = p.validate_at(today()).unwrap_err();
        assert_eq!(errs.len(), 4, "{errs:?}");
    }

    #[test]
    fn meals_pattern_rejects_bad_separators() {
        for bad in ["apple,", ",apple", "apple,,pear", "ap,pear", "apple pear"] {
            let mut p = sample();
            p.favorite_meals = bad.into();
            assert!(p.validate_at(today()).is_err(), "{bad} should be rejected");
        }
        let mut p = sample();
        p.favorite_meals = "apple,pear,grape".into();
        assert!(p.validate_at(today()).is_ok());
    }

    #[test]
    fn country_constraints_are_checked() {
        let mut p = sample();
        p.citizenship.as_mut().unwrap().population = 0;
        p.country_of_origin.as_mut().unwrap().area = -1.0;
        let errs = p.validate_at(today()).unwrap_err();
        assert_eq!(errs.len(), 2);
        assert!(errs.iter().any(|e| e.contains("citizenship.population")));
        assert!(errs.iter().any(|e| e.contains("countryOfOrigin.square")));
    }

    #[test]
    fn decodes_wire_format() {
        let json = r#"{"name":"Ann Lee","birthday":"1990-01-01","sex":"FEMALE","eyeColor":"BLUE",
            "hairColor":"BROWN","weight":60.5,"height":170,
            "countryOfOrigin":{"id":1,"name":"USA","continent":"NORTH_AMERICA",
                "capital":"Washington","population":334914895,"square":8080470},
            "citizenship":{"name":"Canada","continent":"NORTH_AMERICA",
                "capital":"Ottawa","population":40769890,"area":9984670},
            "favoriteMeals":"apple,pear"}"#;
        let p: Person = serde_json::from_str(json).unwrap();
        assert_eq!(p.sex, Some(Sex::Female));
        assert_eq!(
            p.country_of_origin.unwrap().continent,
            Some(Continent::NorthAmerica)
        );
        assert_eq!(p.citizenship.unwrap().area, 9_984_670.0);
    }

    #[test]
    fn unknown_enum_value_is_a_decode_error() {
        let json = r#"{"name":"Ann Lee","birthday":"1990-01-01","sex":"OTHER"}"#;
        assert!(serde_json::from_str::<Person>(json).is_err());
    }

    #[test]
    fn weight_and_height_are_optional() {
        let mut p = sample();
        p.weight = None;
        p.height = None;
        assert!(p.validate_at(today()).is_ok());
    }

    #[test]
    fn missing_required_attributes_are_violations() {
        let json = r#"{"name":"Ann Lee","favoriteMeals":"apple,pear",
            "citizenship":{"name":"Canada","capital":"Ottawa",
                "population":40769890,"square":9984670}}"#;
        let p: Person = serde_json::from_str(json).unwrap();
        assert_eq!(p.weight, None);
        let errs = p.validate_at(today()).unwrap_err();
        for expected in [
            "Person birthday should not be null",
            "Person sex should not be null",
            "Person eye color should not be null",
            "Person hair color should not be null",
            "Country of origin should not be null",
            "Country continent should not be null",
        ] {
            assert!(errs.iter().any(|e| e.contains(expected)), "{expected}: {errs:?}");
        }
        assert_eq!(errs.len(), 6, "{errs:?}");
    }

    #[test]
    fn db_labels_round_trip() {
        assert_eq!(from_db_label::<Continent>("SOUTH_AMERICA"), Some(Continent::SouthAmerica));
        assert_eq!(from_db_label::<Color>(Color::Gray.db_label()), Some(Color::Gray));
        assert_eq!(from_db_label::<Sex>("UNKNOWN"), None);
    }
}
