//! Validation and normalization properties over ranges of inputs

use std::collections::HashMap;
use std::sync::Arc;

use mcat_common::query::{Filter, SearchField, TextField};
use mcat_common::time::FixedClock;
use mcat_common::{normalize, CatalogSchema, SongValidator, SortField};
use serde_json::{json, Value};

const YEAR: i32 = 2024;

fn validator() -> SongValidator {
    SongValidator::with_clock(CatalogSchema::default(), Arc::new(FixedClock::in_year(YEAR)))
}

fn candidate(overrides: Value) -> mcat_common::validation::Candidate {
    let mut base = json!({
        "title": "Blue in Green",
        "artist": "Miles Davis",
        "genre": "Jazz"
    });
    if let (Some(base), Some(overrides)) = (base.as_object_mut(), overrides.as_object()) {
        for (k, v) in overrides {
            base.insert(k.clone(), v.clone());
        }
    }
    match base {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

#[test]
fn test_blank_title_or_artist_reports_only_that_field() {
    let v = validator();
    for blank in ["", " ", "\t\n", "   "] {
        let errors = v.validate(&candidate(json!({ "title": blank })));
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["title"], "title {:?}", blank);

        let errors = v.validate(&candidate(json!({ "artist": blank })));
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["artist"], "artist {:?}", blank);
    }
}

#[test]
fn test_year_range() {
    let v = validator();
    for year in 1850..=(YEAR + 5) {
        let errors = v.validate(&candidate(json!({ "year": year })));
        let in_range = (1900..=YEAR).contains(&year);
        assert_eq!(errors.contains("year"), !in_range, "year {}", year);
        assert_eq!(errors.len(), usize::from(!in_range));
    }
}

#[test]
fn test_rating_range() {
    let v = validator();
    for tenth in 0..=50 {
        let rating = f64::from(tenth) / 10.0;
        assert!(v.validate(&candidate(json!({ "rating": rating }))).is_empty(), "rating {}", rating);
    }
    assert!(v.validate(&candidate(json!({ "rating": 5.0001 }))).contains("rating"));
    assert!(v.validate(&candidate(json!({ "rating": -0.0001 }))).contains("rating"));
}

#[test]
fn test_three_required_fields_reported_together() {
    let errors = validator().validate(&candidate(json!({
        "title": "",
        "artist": "",
        "genre": "Unknown"
    })));
    assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["artist", "genre", "title"]);
}

#[test]
fn test_normalize_properties() {
    let schema = CatalogSchema::default();
    let raw = |pairs: &[(&str, &str)]| -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    };

    let q = normalize(&raw(&[("page", "0"), ("limit", "-5")]), &schema);
    assert_eq!((q.page, q.page_limit, q.page_offset), (1, 10, 0));

    let q = normalize(&raw(&[("sortBy", "__proto__"), ("order", "asc")]), &schema);
    assert_eq!(q.sort_key, SortField::Title);

    let q = normalize(&raw(&[("search", "zep"), ("genre", "Rock")]), &schema);
    assert_eq!(
        q.filter,
        Filter::And(vec![
            Filter::Or(vec![
                Filter::contains(SearchField::Title, "zep"),
                Filter::contains(SearchField::Artist, "zep"),
            ]),
            Filter::equals(TextField::Genre, "Rock"),
        ])
    );
}
