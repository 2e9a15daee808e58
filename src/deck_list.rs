//! Deck-list text parsing.
//!
//! Accepts the line-oriented dialects produced by deck builders and client
//! exports:
//!
//! ```text
//! // Commander
//! 1 Atraxa, Praetors' Voice (2X2) 190
//! // Deck
//! 1x Sol Ring (C21) 263
//! Arcane Signet (CMR) 297 1
//! 2 Swords to Plowshares
//! ```
//!
//! and delimited collection exports whose first line is a header row
//! (`Count,Name,Edition,Collector Number`).
//!
//! Commander rule: entries under a `commander` section marker form the
//! commander list. When the input has no commander marker at all, the first
//! parsed entry is the commander. Tabular input never has a commander.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::deck::DeckEntry;

static QUANTITY_FIRST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s*[xX]?\s+(.+?)\s+\(([A-Za-z0-9]+)\)(?:\s+(\S+))?$")
        .expect("valid quantity-first regex")
});
static QUANTITY_LAST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)\s+\(([A-Za-z0-9]+)\)\s+(\S+)\s+[xX]?(\d+)[xX]?$")
        .expect("valid quantity-last regex")
});
static QUANTITY_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s*[xX]?\s+(.+)$").expect("valid quantity-name regex"));
static FINISH_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\*[A-Za-z]+\*$").expect("valid finish marker regex"));

/// Bare header lines some clients emit instead of comment markers.
const BARE_SECTION_HEADERS: [&str; 8] = [
    "commander",
    "deck",
    "main",
    "mainboard",
    "maindeck",
    "sideboard",
    "companion",
    "maybeboard",
];

/// Header words that mark a delimited collection export.
const TABLE_HEADER_MARKERS: [&str; 4] = ["name", "binder", "tradelist", "scryfall id"];

const NAME_COLUMN: ColumnSynonyms = ColumnSynonyms {
    exact: &["name", "card name", "card"],
    contains: &["name"],
    exclude: &["set", "binder", "edition", "deck", "list"],
};
const QUANTITY_COLUMN: ColumnSynonyms = ColumnSynonyms {
    exact: &["quantity", "count", "qty", "amount"],
    contains: &["quantity", "count", "qty"],
    exclude: &["tradelist", "trade"],
};
const SET_COLUMN: ColumnSynonyms = ColumnSynonyms {
    exact: &["set code", "set", "edition code", "edition"],
    contains: &["set code", "edition", "set"],
    exclude: &["set name", "binder"],
};
const COLLECTOR_COLUMN: ColumnSynonyms = ColumnSynonyms {
    exact: &["collector number", "collector_number", "number", "cn", "card number"],
    contains: &["collector", "number"],
    exclude: &["scryfall", "multiverse"],
};

/// An input line that matched no known pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineError {
    /// 1-based line number in the original text.
    pub line: usize,
    pub text: String,
    pub reason: String,
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {} ({})", self.line, self.reason, self.text)
    }
}

#[derive(Debug, Error)]
pub enum DeckListError {
    #[error("no card name column found in header: {header}")]
    MissingNameColumn { header: String },
    #[error("deck list contains no card entries ({} unparsable line(s))", .errors.len())]
    NoEntries { errors: Vec<LineError> },
    #[error("unreadable table header: {0}")]
    Header(#[from] csv::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    Lines,
    Tabular { delimiter: u8 },
}

/// How the commander list was populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommanderSource {
    /// A `commander` section marker was present.
    Marked,
    /// No marker; the first parsed entry was promoted.
    Positional,
    /// Tabular input, which carries no commander.
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDeckList {
    pub commander: Vec<DeckEntry>,
    pub cards: Vec<DeckEntry>,
    pub errors: Vec<LineError>,
    pub dialect: Dialect,
    pub commander_source: CommanderSource,
}

impl ParsedDeckList {
    /// Commander entries followed by the main list.
    pub fn entries(&self) -> impl Iterator<Item = &DeckEntry> {
        self.commander.iter().chain(self.cards.iter())
    }

    pub fn into_entries(self) -> Vec<DeckEntry> {
        let mut entries = self.commander;
        entries.extend(self.cards);
        entries
    }
}

/// Parses deck-list text in any supported dialect.
///
/// Unparsable lines never abort the parse; they are collected in `errors`.
/// Fails only when a table header has no name column or nothing parsed.
pub fn parse_deck_list(text: &str) -> Result<ParsedDeckList, DeckListError> {
    let parsed = match detect_table(text) {
        Some((offset, delimiter)) => parse_table(text, offset, delimiter)?,
        None => parse_lines(text),
    };

    if parsed.commander.is_empty() && parsed.cards.is_empty() {
        return Err(DeckListError::NoEntries {
            errors: parsed.errors,
        });
    }

    log::info!(
        "parsed deck list: {} commander, {} cards, {} errors ({:?})",
        parsed.commander.len(),
        parsed.cards.len(),
        parsed.errors.len(),
        parsed.dialect
    );
    Ok(parsed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Commander,
    Main,
}

/// Merges entries by name key, keeping first-seen order and printing.
#[derive(Default)]
struct MergedSection {
    entries: Vec<DeckEntry>,
    index: HashMap<String, usize>,
}

impl MergedSection {
    fn push(&mut self, entry: DeckEntry) {
        let key = entry.name_key();
        match self.index.get(&key) {
            Some(&idx) => {
                let existing = &mut self.entries[idx];
                existing.quantity = existing.quantity.saturating_add(entry.quantity);
            }
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(entry);
            }
        }
    }
}

fn section_marker(line: &str) -> Option<Section> {
    let label = if let Some(rest) = line.strip_prefix("//") {
        rest
    } else if let Some(rest) = line.strip_prefix('#') {
        rest
    } else {
        let bare = line.trim_end_matches(':').trim().to_ascii_lowercase();
        if !BARE_SECTION_HEADERS.contains(&bare.as_str()) {
            return None;
        }
        line
    };

    if label.to_ascii_lowercase().contains("commander") {
        Some(Section::Commander)
    } else {
        Some(Section::Main)
    }
}

fn parse_lines(text: &str) -> ParsedDeckList {
    let mut parsed = Vec::new();
    let mut errors = Vec::new();
    let mut section = Section::Main;
    let mut saw_commander_marker = false;

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(next) = section_marker(line) {
            if next == Section::Commander {
                saw_commander_marker = true;
            }
            section = next;
            continue;
        }

        match parse_line(line) {
            Ok(entry) => parsed.push((idx + 1, line, section, entry)),
            Err(reason) => {
                log::debug!("unparsable deck line {}: {line}", idx + 1);
                errors.push(LineError {
                    line: idx + 1,
                    text: line.to_string(),
                    reason,
                });
            }
        }
    }

    // A name is either a commander or a main-deck card, never both.
    let commander_keys: HashSet<String> = parsed
        .iter()
        .filter(|(_, _, section, _)| *section == Section::Commander)
        .map(|(_, _, _, entry)| entry.name_key())
        .collect();

    let mut commander = MergedSection::default();
    let mut main = MergedSection::default();
    for (line_no, line, section, entry) in parsed {
        match section {
            Section::Commander => commander.push(entry),
            Section::Main if commander_keys.contains(&entry.name_key()) => {
                log::debug!("deck line {line_no} repeats a commander: {line}");
                errors.push(LineError {
                    line: line_no,
                    text: line.to_string(),
                    reason: "already listed as commander".to_string(),
                });
            }
            Section::Main => main.push(entry),
        }
    }
    errors.sort_by_key(|error| error.line);

    let mut commander = commander.entries;
    let mut cards = main.entries;
    let commander_source = if saw_commander_marker {
        CommanderSource::Marked
    } else {
        if !cards.is_empty() {
            commander.push(cards.remove(0));
        }
        CommanderSource::Positional
    };

    ParsedDeckList {
        commander,
        cards,
        errors,
        dialect: Dialect::Lines,
        commander_source,
    }
}

fn parse_line(line: &str) -> Result<DeckEntry, String> {
    let line = FINISH_MARKER_RE.replace(line, "");
    let line = line.trim();

    if let Some(caps) = QUANTITY_FIRST_RE.captures(line) {
        let quantity = parse_quantity(&caps[1])?;
        return Ok(DeckEntry::new(caps[2].trim(), quantity).with_printing(
            Some(caps[3].to_ascii_uppercase()),
            caps.get(4).map(|m| m.as_str().to_string()),
        ));
    }

    if let Some(caps) = QUANTITY_LAST_RE.captures(line) {
        let quantity = parse_quantity(&caps[4])?;
        return Ok(DeckEntry::new(caps[1].trim(), quantity)
            .with_printing(Some(caps[2].to_ascii_uppercase()), Some(caps[3].to_string())));
    }

    if let Some(caps) = QUANTITY_NAME_RE.captures(line) {
        let quantity = parse_quantity(&caps[1])?;
        return Ok(DeckEntry::new(caps[2].trim(), quantity));
    }

    Err("expected a quantity and card name".to_string())
}

fn parse_quantity(raw: &str) -> Result<u32, String> {
    match raw.parse::<u32>() {
        Ok(0) => Err("quantity must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("invalid quantity '{raw}'")),
    }
}

/// Returns the byte offset of the header line and the delimiter when the first
/// non-empty line looks like a table header.
fn detect_table(text: &str) -> Option<(usize, u8)> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            offset += line.len();
            continue;
        }

        let delimiter = if trimmed.contains('\t') {
            b'\t'
        } else if trimmed.contains(',') {
            b','
        } else if trimmed.contains(';') {
            b';'
        } else {
            return None;
        };

        // A quantity-led line is a card, not a header.
        if QUANTITY_NAME_RE.is_match(trimmed) {
            return None;
        }

        let lower = trimmed.to_ascii_lowercase();
        return TABLE_HEADER_MARKERS
            .iter()
            .any(|marker| lower.contains(marker))
            .then_some((offset, delimiter));
    }
    None
}

struct ColumnSynonyms {
    exact: &'static [&'static str],
    contains: &'static [&'static str],
    exclude: &'static [&'static str],
}

impl ColumnSynonyms {
    fn find(&self, headers: &[String]) -> Option<usize> {
        for synonym in self.exact {
            if let Some(idx) = headers.iter().position(|h| h == synonym) {
                return Some(idx);
            }
        }
        for synonym in self.contains {
            if let Some(idx) = headers.iter().position(|h| {
                h.contains(synonym) && !self.exclude.iter().any(|ex| h.contains(ex))
            }) {
                return Some(idx);
            }
        }
        None
    }
}

fn parse_table(text: &str, offset: usize, delimiter: u8) -> Result<ParsedDeckList, DeckListError> {
    let leading_lines = text[..offset].matches('\n').count();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text[offset..].as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();

    let Some(name_col) = NAME_COLUMN.find(&headers) else {
        return Err(DeckListError::MissingNameColumn {
            header: headers.join(", "),
        });
    };
    let quantity_col = QUANTITY_COLUMN.find(&headers);
    let set_col = SET_COLUMN.find(&headers).filter(|idx| *idx != name_col);
    let collector_col = COLLECTOR_COLUMN.find(&headers);

    let mut cards = Vec::new();
    let mut errors = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let line = leading_lines
            + result
                .as_ref()
                .ok()
                .and_then(|record| record.position())
                .map_or(row_idx + 2, |pos| pos.line() as usize);
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                errors.push(LineError {
                    line,
                    text: String::new(),
                    reason: err.to_string(),
                });
                continue;
            }
        };

        let field = |col: Option<usize>| {
            col.and_then(|idx| record.get(idx))
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        let Some(name) = field(Some(name_col)) else {
            log::debug!("skipping table row {line} without a name");
            continue;
        };

        let quantity = match field(quantity_col) {
            None => 1,
            Some(raw) => match parse_quantity(raw) {
                Ok(n) => n,
                Err(reason) => {
                    errors.push(LineError {
                        line,
                        text: record.iter().collect::<Vec<_>>().join(","),
                        reason,
                    });
                    continue;
                }
            },
        };

        cards.push(DeckEntry::new(name, quantity).with_printing(
            field(set_col).map(str::to_ascii_uppercase),
            field(collector_col).map(str::to_string),
        ));
    }

    Ok(ParsedDeckList {
        commander: Vec::new(),
        cards,
        errors,
        dialect: Dialect::Tabular { delimiter },
        commander_source: CommanderSource::None,
    })
}
