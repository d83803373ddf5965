use super::tasks::{format_due, parse_due};
use chrono::{DateTime, Local, Utc};
use tally_core::error::TallyError;

#[test]
fn test_parse_due_rfc3339() {
    let parsed = parse_due("2030-05-01T10:30:00Z").unwrap();
    let expected: DateTime<Utc> = "2030-05-01T10:30:00Z".parse().unwrap();
    assert_eq!(parsed, expected);
}

#[test]
fn test_parse_due_rfc3339_with_offset() {
    let parsed = parse_due("2030-05-01T10:30:00+02:00").unwrap();
    let expected: DateTime<Utc> = "2030-05-01T08:30:00Z".parse().unwrap();
    assert_eq!(parsed, expected);
}

#[test]
fn test_parse_due_local_short_form() {
    let parsed = parse_due("2030-05-01 10:30").unwrap();
    let back = parsed
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string();
    assert_eq!(back, "2030-05-01 10:30");
}

#[test]
fn test_parse_due_rejects_garbage() {
    for input in ["tomorrow", "2030-05-01", "10:30", ""] {
        let err = parse_due(input).unwrap_err();
        assert!(matches!(err, TallyError::InvalidInput(_)), "input: {input}");
    }
}

#[test]
fn test_format_due_shows_year_only_when_not_current() {
    let old: DateTime<Utc> = "1999-06-15T12:00:00Z".parse().unwrap();
    assert!(format_due(old).contains("1999"));

    let this_year = Local::now().with_timezone(&Utc);
    let current = Local::now().format("%Y").to_string();
    assert!(!format_due(this_year).contains(&current));
}
