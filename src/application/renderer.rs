//! Markdown rendering of parsed highlights.
//!
//! One note per book: a title/author header, then one `####` section per
//! chapter in the order chapters were first seen, each holding its
//! highlights as block quotes.

use std::collections::HashMap;
use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;

use crate::domain::{AppError, BookReference, NoteRecord, Result};

use super::parser::parse_highlight_date;

/// Section title for records that precede any chapter heading.
pub const DEFAULT_SECTION: &str = "Annotations";

/// Prefix marking a quote that starts mid-sentence.
const CONTINUATION_MARK: &str = "...";

/// Renders a full note for one book.
#[must_use]
pub fn render_note(reference: &BookReference, records: &[NoteRecord], date_format: &str) -> String {
    let mut out = format!("## {}\n### {}\n\n", reference.title, reference.authors);

    for (section, group) in group_by_section(records) {
        let heading = if section.is_empty() {
            DEFAULT_SECTION
        } else {
            section
        };
        let _ = writeln!(out, "#### {heading}");

        for record in group {
            out.push_str(&render_record(record, date_format));
        }
    }

    out
}

/// Groups records by section, keeping first-seen section order and record
/// order inside each section. Records without a section share the `""` key.
#[must_use]
pub fn group_by_section(records: &[NoteRecord]) -> Vec<(&str, Vec<&NoteRecord>)> {
    let mut groups: Vec<(&str, Vec<&NoteRecord>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let key = record.section_name().unwrap_or_default();
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((key, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(record);
    }

    groups
}

fn render_record(record: &NoteRecord, date_format: &str) -> String {
    let quote = format_quote(&record.quote);
    let date = format_highlight_date(&record.highlight_date, date_format);

    format!(
        "{}\n>\n>{}\n>{}\n\n",
        block_quote(&quote),
        date,
        record.highlight_page.trim()
    )
}

/// Trims a quote and marks it as a continuation when it starts lowercase.
#[must_use]
pub fn format_quote(quote: &str) -> String {
    let quote = quote.trim();
    if quote.chars().next().is_some_and(char::is_lowercase) {
        format!("{CONTINUATION_MARK}{quote}")
    } else {
        quote.to_string()
    }
}

/// Reformats an exported timestamp; unparseable values, and values the
/// format cannot render, are kept as-is.
#[must_use]
pub fn format_highlight_date(value: &str, date_format: &str) -> String {
    let Some(dt) = parse_highlight_date(value) else {
        return value.trim().to_string();
    };

    let mut out = String::new();
    if write!(out, "{}", dt.format(date_format)).is_err() {
        return value.trim().to_string();
    }
    out
}

/// Checks that a strftime pattern can render a highlight timestamp.
///
/// # Errors
/// Returns [`AppError::Config`] for unknown specifiers and for specifiers
/// that need data a naive timestamp lacks (such as `%Z`).
pub fn validate_date_format(date_format: &str) -> Result<()> {
    let invalid = || AppError::Config {
        message: format!("invalid export.date_format '{date_format}'"),
    };

    if StrftimeItems::new(date_format).any(|item| matches!(item, Item::Error)) {
        return Err(invalid());
    }

    let sample = NaiveDate::from_ymd_opt(2023, 4, 1)
        .and_then(|date| date.and_hms_opt(10, 0, 0))
        .ok_or_else(invalid)?;
    let mut out = String::new();
    write!(out, "{}", sample.format(date_format)).map_err(|_| invalid())
}

fn block_quote(text: &str) -> String {
    if text.is_empty() {
        return ">".to_string();
    }

    text.lines()
        .map(|line| format!(">{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::parser::{parse_book_reference, parse_records};
    use std::rc::Rc;

    const DATE_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

    fn record(section: Option<&str>, quote: &str) -> NoteRecord {
        NoteRecord {
            section: section.map(Rc::from),
            highlight_date: "2023-04-01 10:00:00".into(),
            highlight_page: "1".into(),
            quote: quote.into(),
        }
    }

    #[test]
    fn test_end_to_end_sample() {
        let body = "v1\nChapter One\n2023-04-01 10:00:00 | 42\nthis continues a thought\n-------------------\n2023-04-02 11:00:00 | 43\nThis Starts Fresh\n";
        let reference = parse_book_reference("My Book - Jane Doe");
        let note = render_note(&reference, &parse_records(body), DATE_FORMAT);

        let expected = "## My Book\n### Jane Doe\n\n\
            #### Chapter One\n\
            >...this continues a thought\n>\n>4/1/2023, 10:00:00 AM\n>42\n\n\
            >This Starts Fresh\n>\n>4/2/2023, 11:00:00 AM\n>43\n\n";

        assert_eq!(note, expected);
    }

    #[test]
    fn test_continuation_heuristic() {
        assert_eq!(format_quote("lowercase start"), "...lowercase start");
        assert_eq!(format_quote("  Uppercase start "), "Uppercase start");
        assert_eq!(format_quote("42 is a number"), "42 is a number");
        assert_eq!(format_quote("\"Quoted\""), "\"Quoted\"");
        assert_eq!(format_quote(""), "");
    }

    #[test]
    fn test_unsectioned_records_go_to_annotations() {
        let records = vec![record(None, "Loose"), record(Some("Ch 1"), "Inside")];
        let note = render_note(&BookReference::default(), &records, DATE_FORMAT);

        let annotations = note.find("#### Annotations").unwrap();
        let chapter = note.find("#### Ch 1").unwrap();
        assert!(annotations < chapter);
    }

    #[test]
    fn test_grouping_keeps_first_seen_order() {
        let records = vec![
            record(Some("B"), "One"),
            record(Some("A"), "Two"),
            record(Some("B"), "Three"),
            record(None, "Four"),
        ];

        let groups = group_by_section(&records);
        let keys: Vec<_> = groups.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["B", "A", ""]);

        let quotes: Vec<_> = groups[0].1.iter().map(|r| r.quote.as_str()).collect();
        assert_eq!(quotes, vec!["One", "Three"]);
    }

    #[test]
    fn test_rendering_is_repeatable() {
        let records = vec![
            record(Some("B"), "One"),
            record(Some("A"), "two"),
            record(Some("B"), "Three"),
        ];
        let reference = parse_book_reference("Title - Author");

        let first = render_note(&reference, &records, DATE_FORMAT);
        let second = render_note(&reference, &records, DATE_FORMAT);
        assert_eq!(first, second);
    }

    #[test]
    fn test_multiline_quote_stays_in_block_quote() {
        let records = vec![record(Some("S"), "First line\nsecond line")];
        let note = render_note(&BookReference::default(), &records, DATE_FORMAT);
        assert!(note.contains(">First line\n>second line\n>\n"));
    }

    #[test]
    fn test_validate_date_format() {
        assert!(validate_date_format(DATE_FORMAT).is_ok());
        assert!(validate_date_format("%Y-%m-%d %H:%M").is_ok());
        assert!(matches!(
            validate_date_format("%Q"),
            Err(AppError::Config { .. })
        ));
        assert!(validate_date_format("%Z").is_err());
        assert!(validate_date_format("%").is_err());
    }

    #[test]
    fn test_bad_date_format_falls_back_to_raw_value() {
        assert_eq!(
            format_highlight_date("2023-04-01 10:00:00", "%Q"),
            "2023-04-01 10:00:00"
        );
        assert_eq!(
            format_highlight_date(" 2023-04-01 10:00:00 ", "%Z"),
            "2023-04-01 10:00:00"
        );
    }

    #[test]
    fn test_unparseable_date_kept_verbatim() {
        assert_eq!(
            format_highlight_date(" yesterday-ish ", DATE_FORMAT),
            "yesterday-ish"
        );
        assert_eq!(
            format_highlight_date("2023-04-01 22:05", "%Y/%m/%d %H:%M"),
            "2023/04/01 22:05"
        );
    }
}
