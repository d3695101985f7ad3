//! Raw export parsing.
//!
//! Decodes the line-oriented export body into [`NoteRecord`]s. A body is a
//! preamble line followed by blocks separated by [`NOTE_SEPARATOR`] lines:
//!
//! ```text
//! v1
//! Chapter One
//! 2023-04-01 10:00:00 | 42
//! this continues a thought
//! -------------------
//! 2023-04-02 11:00:00 | 43
//! This Starts Fresh
//! ```
//!
//! The chapter heading is optional and carries over to later blocks until a
//! new one appears.

use std::path::Path;
use std::rc::Rc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::domain::{BookReference, ExportVersion, NoteRecord};

/// Line separating two blocks of a raw export.
pub const NOTE_SEPARATOR: &str = "-------------------";

/// Separator between title and authors in export file names.
const TITLE_AUTHOR_SEPARATOR: &str = " - ";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Determines the export layout from its body.
///
/// Any non-empty body is treated as `v1`; there is no other layout yet.
#[must_use]
pub fn detect_version(body: &str) -> ExportVersion {
    if body.is_empty() {
        ExportVersion::Unrecognized
    } else {
        ExportVersion::V1
    }
}

/// Parses a highlight timestamp in the shapes e-readers export.
///
/// A bare four-digit string is read as a year, like a lenient date parser
/// would; a heading that is just a year is therefore not a heading.
pub fn parse_highlight_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }

    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
    {
        return Some(dt);
    }

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
    {
        return date.and_hms_opt(0, 0, 0);
    }

    if value.len() == 4 && value.bytes().all(|b| b.is_ascii_digit()) {
        return value
            .parse::<i32>()
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
            .and_then(|date| date.and_hms_opt(0, 0, 0));
    }

    None
}

/// Whether `value` reads as a highlight timestamp.
#[must_use]
pub fn is_valid_date(value: &str) -> bool {
    parse_highlight_date(value).is_some()
}

/// Parses a full export body (version already checked) into records.
#[must_use]
pub fn parse_records(body: &str) -> Vec<NoteRecord> {
    let (records, _) = split_blocks(strip_preamble(body)).iter().fold(
        (Vec::<NoteRecord>::new(), None::<Rc<str>>),
        |(mut records, section), block| {
            let (record, section) = parse_block(block, section);
            records.extend(record);
            (records, section)
        },
    );

    records
}

/// Drops the first line (version marker / preamble).
fn strip_preamble(body: &str) -> &str {
    body.split_once('\n').map_or("", |(_, rest)| rest)
}

/// Splits a body into blocks of lines on separator lines.
fn split_blocks(body: &str) -> Vec<Vec<&str>> {
    let mut blocks = vec![Vec::new()];

    for line in body.lines() {
        if line.trim() == NOTE_SEPARATOR {
            blocks.push(Vec::new());
        } else if let Some(block) = blocks.last_mut() {
            block.push(line);
        }
    }

    blocks
}

/// Parses one block given the section in effect before it.
///
/// Returns the record (if the block has a metadata line) and the section in
/// effect after it.
fn parse_block(
    block: &[&str],
    section: Option<Rc<str>>,
) -> (Option<NoteRecord>, Option<Rc<str>>) {
    let mut lines: Vec<&str> = block
        .iter()
        .copied()
        .filter(|line| !line.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return (None, section);
    }

    if is_leading_noise(&lines) {
        lines.remove(0);
    }

    let section = match lines.first() {
        Some(&first) if !is_valid_date(date_candidate(first)) => {
            let heading = first.trim();
            lines.remove(0);
            Some(Rc::from(heading))
        }
        _ => section,
    };

    let Some((highlight_date, highlight_page)) = lines.first().and_then(|l| split_metadata(l))
    else {
        return (None, section);
    };

    let record = NoteRecord {
        section: section.clone(),
        highlight_date,
        highlight_page,
        quote: lines[1..].join("\n"),
    };

    (Some(record), section)
}

/// A leading line without `|` is formatting noise unless it sits directly
/// above the metadata line, where it is the chapter heading, or it reads as
/// a date, where it is a metadata line missing its page field.
fn is_leading_noise(lines: &[&str]) -> bool {
    let lacks_delimiter = |line: &&str| !line.contains('|');
    lines
        .first()
        .is_some_and(|first| lacks_delimiter(first) && !is_valid_date(date_candidate(first)))
        && lines.get(1).map_or(true, lacks_delimiter)
}

/// The part of a line before its first `|`, trimmed.
fn date_candidate(line: &str) -> &str {
    line.split('|').next().unwrap_or_default().trim()
}

/// Splits `<date> | <page>` into trimmed fields.
fn split_metadata(line: &str) -> Option<(String, String)> {
    let mut fields = line.split('|');
    let date = fields.next()?;
    let page = fields.next()?;
    Some((date.trim().to_string(), page.trim().to_string()))
}

/// Strips leading and trailing runs of non-alphanumeric characters.
#[must_use]
pub fn deep_trim(value: &str) -> &str {
    value.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Extracts title and authors from `"<Title> - <Authors>"`.
#[must_use]
pub fn parse_book_reference(stem: &str) -> BookReference {
    let (title, authors) = stem
        .split_once(TITLE_AUTHOR_SEPARATOR)
        .unwrap_or((stem, ""));

    BookReference {
        title: deep_trim(title).to_string(),
        authors: deep_trim(authors).to_string(),
    }
}

/// Extracts title and authors from an export path (extension ignored).
#[must_use]
pub fn book_reference_from_path(path: &Path) -> BookReference {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    parse_book_reference(&stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "v1\nChapter One\n2023-04-01 10:00:00 | 42\nthis continues a thought\n-------------------\n2023-04-02 11:00:00 | 43\nThis Starts Fresh\n";

    #[test]
    fn test_detect_version() {
        assert_eq!(detect_version(SAMPLE), ExportVersion::V1);
        assert_eq!(detect_version(""), ExportVersion::Unrecognized);
    }

    #[test]
    fn test_is_valid_date() {
        assert!(is_valid_date("2023-04-01 10:00:00"));
        assert!(is_valid_date("2023-04-01 10:00"));
        assert!(is_valid_date("2023-04-01"));
        assert!(is_valid_date("2025-12-01T16:25:48.612Z"));
        assert!(is_valid_date("04/01/2023 10:00"));
        assert!(!is_valid_date("Chapter One"));
        assert!(!is_valid_date(""));
        assert!(!is_valid_date("2023-13-45 10:00"));
    }

    #[test]
    fn test_bare_year_heading_reads_as_date() {
        assert!(is_valid_date("1984"));

        let records = parse_records("v1\n1984\n2023-04-01 10:00 | 1\nquote\n");
        // "1984" is not a heading; the block has no metadata line after it.
        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_sample() {
        let records = parse_records(SAMPLE);
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].section_name(), Some("Chapter One"));
        assert_eq!(records[0].highlight_date, "2023-04-01 10:00:00");
        assert_eq!(records[0].highlight_page, "42");
        assert_eq!(records[0].quote, "this continues a thought");

        assert_eq!(records[1].section_name(), Some("Chapter One"));
        assert_eq!(records[1].highlight_page, "43");
        assert_eq!(records[1].quote, "This Starts Fresh");
    }

    #[test]
    fn test_section_is_shared_between_records() {
        let records = parse_records(SAMPLE);
        let first = records[0].section.as_ref().unwrap();
        let second = records[1].section.as_ref().unwrap();
        assert!(Rc::ptr_eq(first, second));
    }

    #[test]
    fn test_sections_are_sticky_until_next_heading() {
        let body = "v1\n\
            2023-01-01 09:00 | 1\nbefore any heading\n\
            -------------------\n\
            Part One\n2023-01-02 09:00 | 2\nfirst\n\
            -------------------\n\
            2023-01-03 09:00 | 3\nsecond\n\
            -------------------\n\
            Part Two\n2023-01-04 09:00 | 4\nthird\n\
            -------------------\n\
            2023-01-05 09:00 | 5\nfourth\n";

        let sections: Vec<_> = parse_records(body)
            .iter()
            .map(|r| r.section_name().map(str::to_string))
            .collect();

        assert_eq!(
            sections,
            vec![
                None,
                Some("Part One".to_string()),
                Some("Part One".to_string()),
                Some("Part Two".to_string()),
                Some("Part Two".to_string()),
            ]
        );
    }

    #[test]
    fn test_multiline_quote() {
        let records = parse_records("v1\n2023-01-01 09:00 | p. 7\nline one\n\nline two\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].quote, "line one\nline two");
        assert_eq!(records[0].highlight_page, "p. 7");
    }

    #[test]
    fn test_block_without_metadata_field_is_dropped() {
        let body = "v1\n\
            Chapter\n2023-01-01 09:00 | 1\nkept\n\
            -------------------\n\
            2023-01-02 09:00\nno page field\n\
            -------------------\n\
            2023-01-03 09:00 | 3\nalso kept\n";

        let records = parse_records(body);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].quote, "kept");
        assert_eq!(records[1].quote, "also kept");
        // The dropped block must not change the section in effect.
        assert_eq!(records[1].section_name(), Some("Chapter"));
    }

    #[test]
    fn test_date_line_without_page_is_not_noise() {
        assert!(!is_leading_noise(&["2023-01-02 09:00", "Lost quote"]));
        assert!(is_leading_noise(&["Reading Notes", "Chapter 2"]));
        assert!(!is_leading_noise(&["Chapter 2", "2023-01-02 09:00 | 4"]));
    }

    #[test]
    fn test_heading_without_metadata_sets_section_only() {
        let body = "v1\n\
            Lonely Heading | x\n\
            -------------------\n\
            2023-01-03 09:00 | 3\ninherits\n";

        let records = parse_records(body);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].section_name(), Some("Lonely Heading | x"));
    }

    #[test]
    fn test_leading_noise_line_is_discarded() {
        let body = "v1\nReading Notes\nChapter 2\n2023-01-01 09:00 | 9\nquote\n";

        let records = parse_records(body);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].section_name(), Some("Chapter 2"));
    }

    #[test]
    fn test_empty_blocks_are_ignored() {
        let body = "v1\n\n-------------------\n   \n-------------------\n2023-01-01 09:00 | 1\nq\n-------------------\n";
        assert_eq!(parse_records(body).len(), 1);
    }

    #[test]
    fn test_preamble_only_body_has_no_records() {
        assert!(parse_records("v1").is_empty());
        assert!(parse_records("v1\n").is_empty());
    }

    #[test]
    fn test_crlf_lines() {
        let body = "v1\r\nChapter\r\n2023-01-01 09:00 | 1\r\nquote\r\n";
        let records = parse_records(body);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].section_name(), Some("Chapter"));
        assert_eq!(records[0].quote, "quote");
    }

    #[test]
    fn test_deep_trim() {
        assert_eq!(deep_trim("  --My Book!! "), "My Book");
        assert_eq!(deep_trim("(Jane Doe)"), "Jane Doe");
        assert_eq!(deep_trim("O'Brien, J."), "O'Brien, J");
        assert_eq!(deep_trim("***"), "");
    }

    #[test]
    fn test_parse_book_reference() {
        let reference = parse_book_reference("My Book - Jane Doe");
        assert_eq!(reference.title, "My Book");
        assert_eq!(reference.authors, "Jane Doe");

        let reference = parse_book_reference("Dune - Subtitle - Frank Herbert");
        assert_eq!(reference.title, "Dune");
        assert_eq!(reference.authors, "Subtitle - Frank Herbert");

        let reference = parse_book_reference("No Author Here");
        assert_eq!(reference.title, "No Author Here");
        assert_eq!(reference.authors, "");
    }

    #[test]
    fn test_book_reference_from_path() {
        let reference = book_reference_from_path(Path::new("notes/My Book - Jane Doe.raw"));
        assert_eq!(reference.title, "My Book");
        assert_eq!(reference.authors, "Jane Doe");
    }
}
