use campus_planner::model::TaskInput;
use campus_planner::model::validator::{
    Field, FieldValidationError, FormField, validate_all, validate_date, validate_duration,
};

fn input(title: &str, date: &str, duration: &str, tag: &str) -> TaskInput {
    TaskInput {
        title: title.to_string(),
        date: date.to_string(),
        duration: duration.to_string(),
        tag: tag.to_string(),
        notes: None,
    }
}

#[test]
fn test_calendar_dates() {
    let feb30 = Field::Date.validate("2024-02-30");
    assert!(!feb30.valid);
    assert_eq!(feb30.message, "Invalid date (e.g., February 30th)");

    assert!(Field::Date.validate("2024-02-29").valid);
    assert_eq!(
        validate_date("2023-02-29"),
        Err(FieldValidationError::DateNotOnCalendar)
    );
    assert_eq!(
        validate_date("2024-04-31"),
        Err(FieldValidationError::DateNotOnCalendar)
    );
    assert!(Field::Date.validate("2000-02-29").valid);
    assert!(!Field::Date.validate("1900-02-29").valid);
}

#[test]
fn test_date_shape() {
    assert_eq!(Field::Date.validate("").message, "Date is required");
    for bad in ["2024-1-01", "2024-13-01", "2024-00-10", "2024-01-32", "24-01-01", "2024/01/01"] {
        assert_eq!(
            Field::Date.validate(bad).message,
            "Date must be in YYYY-MM-DD format",
            "{}",
            bad
        );
    }
}

#[test]
fn test_title_messages() {
    let r = Field::Title.validate("hi  there");
    assert!(!r.valid);
    assert_eq!(r.message, "Title cannot contain consecutive spaces");

    assert_eq!(Field::Title.validate("").message, "Title is required");
    assert_eq!(
        Field::Title.validate(" padded").message,
        "Title cannot have leading or trailing spaces, and must not be empty"
    );
    assert!(Field::Title.validate("Finish lab").valid);
}

#[test]
fn test_duplicate_words() {
    let r = Field::DuplicateWords.validate("the the cat");
    assert!(!r.valid);
    assert_eq!(r.message, "Duplicate word detected: \"the\"");

    let r = Field::DuplicateWords.validate("Read THE the notes");
    assert_eq!(r.message, "Duplicate word detected: \"THE\"");

    assert!(Field::DuplicateWords.validate("the cat the").valid);
    assert!(Field::DuplicateWords.validate("cat catalog").valid);
}

#[test]
fn test_duration_bounds() {
    assert!(Field::Duration.validate("1440").valid);
    assert!(Field::Duration.validate("0").valid);
    assert!(Field::Duration.validate("12.5").valid);
    assert!(Field::Duration.validate("1440.00").valid);

    let over = Field::Duration.validate("1440.01");
    assert!(!over.valid);
    assert_eq!(over.message, "Duration cannot exceed 1440 minutes (24 hours)");
    assert_eq!(
        validate_duration("1441"),
        Err(FieldValidationError::DurationTooLong)
    );

    for bad in ["-1", "01", "1.234", "1.", ".5", "abc", "1e3"] {
        assert_eq!(
            validate_duration(bad),
            Err(FieldValidationError::DurationFormat),
            "{}",
            bad
        );
    }
    assert_eq!(
        validate_duration("  "),
        Err(FieldValidationError::DurationRequired)
    );
}

#[test]
fn test_tag_rules() {
    assert!(Field::Tag.validate("study group").valid);
    assert!(Field::Tag.validate("self-care").valid);
    assert_eq!(
        Field::Tag.validate("123").message,
        "Tag can only contain letters, spaces, and hyphens"
    );
    assert_eq!(
        Field::Tag.validate("-lead").message,
        "Tag can only contain letters, spaces, and hyphens"
    );
    assert_eq!(
        Field::Tag.validate(&"a".repeat(31)).message,
        "Tag cannot exceed 30 characters"
    );
    assert!(Field::Tag.validate(&"a".repeat(30)).valid);
}

#[test]
fn test_validate_all_collects_every_field() {
    let result = validate_all(&input("A  B", "2024-13-01", "-1", "123"));
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 4);
    assert_eq!(
        result.error(FormField::Title),
        Some("Title cannot contain consecutive spaces")
    );
    assert_eq!(
        result.error(FormField::Date),
        Some("Date must be in YYYY-MM-DD format")
    );
    assert_eq!(
        result.error(FormField::Duration),
        Some("Duration must be a positive number with up to 2 decimal places")
    );
    assert_eq!(
        result.error(FormField::Tag),
        Some("Tag can only contain letters, spaces, and hyphens")
    );
}

#[test]
fn test_validate_all_duplicate_word_reported_under_title() {
    let result = validate_all(&input("review review notes", "2024-05-01", "60", "study"));
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(
        result.error(FormField::Title),
        Some("Duplicate word detected: \"review\"")
    );
}

#[test]
fn test_validate_all_skips_duplicates_when_title_invalid() {
    let result = validate_all(&input(" the the", "2024-05-01", "60", "study"));
    assert_eq!(
        result.error(FormField::Title),
        Some("Title cannot have leading or trailing spaces, and must not be empty")
    );
}

#[test]
fn test_validate_all_accepts_good_input() {
    let result = validate_all(&input("Read chapter 3", "2024-05-01", "45.5", "literature"));
    assert!(result.valid);
    assert!(result.errors.is_empty());
}

#[test]
fn test_form_result_serialises_field_names() {
    let result = validate_all(&input("", "", "", ""));
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["valid"], false);
    assert_eq!(json["errors"]["title"], "Title is required");
    assert_eq!(json["errors"]["date"], "Date is required");
    assert_eq!(json["errors"]["duration"], "Duration is required");
    assert_eq!(json["errors"]["tag"], "Tag is required");
}
