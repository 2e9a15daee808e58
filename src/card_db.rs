//! Local card database built from a Scryfall bulk-data export.
//!
//! The rest of the crate only sees [`CardLookup`]; a network-backed lookup
//! could implement the same trait.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::card::{CardId, CardRecord, PtValue, name_key};
use crate::color::ColorSet;
use crate::deck::DeckEntry;
use crate::mana::ManaCost;

#[derive(Debug, Error)]
pub enum CardDbError {
    #[error("failed to open card database {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse card database: {0}")]
    Parse(#[from] serde_json::Error),
}

/// What to look a card up by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CardQuery {
    Name(String),
    /// A specific printing. Falls back to `name` when the printing is unknown.
    Printing {
        set: String,
        collector_number: String,
        name: String,
    },
}

impl CardQuery {
    pub fn for_entry(entry: &DeckEntry) -> Self {
        match (&entry.set, &entry.collector_number) {
            (Some(set), Some(collector_number)) => CardQuery::Printing {
                set: set.clone(),
                collector_number: collector_number.clone(),
                name: entry.name.clone(),
            },
            _ => CardQuery::Name(entry.name.clone()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CardQuery::Name(name) => name,
            CardQuery::Printing { name, .. } => name,
        }
    }
}

/// The result of resolving a batch of queries at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupBatch {
    pub found: Vec<CardRecord>,
    pub not_found: Vec<String>,
}

pub trait CardLookup {
    fn lookup(&self, query: &CardQuery) -> Option<CardRecord>;

    /// Resolves every query. Each record appears once in `found` and each
    /// missing name once in `not_found`, in query order.
    fn lookup_batch(&self, queries: &[CardQuery]) -> LookupBatch {
        let mut batch = LookupBatch::default();
        let mut seen_ids: HashSet<CardId> = HashSet::new();
        let mut seen_missing: HashSet<String> = HashSet::new();

        for query in queries {
            match self.lookup(query) {
                Some(record) => {
                    if seen_ids.insert(record.id.clone()) {
                        batch.found.push(record);
                    }
                }
                None => {
                    log::debug!("card lookup missed '{}'", query.name());
                    if seen_missing.insert(name_key(query.name())) {
                        batch.not_found.push(query.name().trim().to_string());
                    }
                }
            }
        }
        batch
    }
}

#[derive(Debug, Deserialize)]
struct ScryfallCard {
    id: Option<String>,
    name: String,
    type_line: Option<String>,
    oracle_text: Option<String>,
    mana_cost: Option<String>,
    cmc: Option<f64>,
    colors: Option<Vec<String>>,
    #[serde(default)]
    color_identity: Vec<String>,
    power: Option<String>,
    toughness: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
    image_uris: Option<ImageUris>,
    set: Option<String>,
    collector_number: Option<String>,
    lang: Option<String>,
    card_faces: Option<Vec<ScryfallFace>>,
}

#[derive(Debug, Deserialize)]
struct ScryfallFace {
    type_line: Option<String>,
    oracle_text: Option<String>,
    mana_cost: Option<String>,
    colors: Option<Vec<String>>,
    power: Option<String>,
    toughness: Option<String>,
    image_uris: Option<ImageUris>,
}

#[derive(Debug, Deserialize)]
struct ImageUris {
    normal: Option<String>,
}

impl ScryfallCard {
    fn is_english(&self) -> bool {
        self.lang.as_deref().unwrap_or("en") == "en"
    }

    fn faces(&self) -> &[ScryfallFace] {
        self.card_faces.as_deref().unwrap_or_default()
    }

    /// Joins a per-face field for multi-faced cards that only carry it on
    /// their faces.
    fn joined_faces(
        &self,
        separator: &str,
        field: impl Fn(&ScryfallFace) -> Option<&String>,
    ) -> Option<String> {
        let parts: Vec<&str> = self
            .faces()
            .iter()
            .filter_map(|face| field(face))
            .map(String::as_str)
            .filter(|text| !text.is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(separator))
    }

    fn pick_field<'a>(
        &'a self,
        own: Option<&'a String>,
        field: impl Fn(&'a ScryfallFace) -> Option<&'a String>,
    ) -> Option<&'a String> {
        own.or_else(|| self.faces().iter().find_map(field))
    }

    fn into_record(self) -> CardRecord {
        let type_line = self
            .type_line
            .clone()
            .or_else(|| self.joined_faces(" // ", |face| face.type_line.as_ref()))
            .unwrap_or_default();
        let oracle_text = self
            .oracle_text
            .clone()
            .or_else(|| self.joined_faces("\n", |face| face.oracle_text.as_ref()))
            .unwrap_or_default();
        let mana_cost = self
            .mana_cost
            .clone()
            .filter(|cost| !cost.is_empty())
            .or_else(|| self.joined_faces(" // ", |face| face.mana_cost.as_ref()))
            .unwrap_or_default();
        let parsed_cost = ManaCost::parse(&mana_cost);

        let colors = match &self.colors {
            Some(colors) => symbols_to_set(colors),
            None if !self.faces().is_empty() => self
                .faces()
                .iter()
                .filter_map(|face| face.colors.as_ref())
                .fold(ColorSet::COLORLESS, |acc, colors| {
                    acc.union(symbols_to_set(colors))
                }),
            None => parsed_cost.colors(),
        };

        let power = self
            .pick_field(self.power.as_ref(), |face| face.power.as_ref())
            .map(|text| PtValue::parse(text));
        let toughness = self
            .pick_field(self.toughness.as_ref(), |face| face.toughness.as_ref())
            .map(|text| PtValue::parse(text));
        let image_uri = self
            .image_uris
            .as_ref()
            .and_then(|uris| uris.normal.clone())
            .or_else(|| {
                self.faces()
                    .iter()
                    .find_map(|face| face.image_uris.as_ref()?.normal.clone())
            });

        let id = match (&self.id, &self.set, &self.collector_number) {
            (Some(id), _, _) => CardId::new(id.clone()),
            (None, Some(set), Some(number)) => CardId::from_printing(set, number),
            _ => CardId::new(name_key(&self.name)),
        };

        CardRecord {
            id,
            type_line,
            oracle_text,
            mana_value: self
                .cmc
                .unwrap_or_else(|| f64::from(parsed_cost.mana_value())),
            mana_cost,
            colors,
            color_identity: symbols_to_set(&self.color_identity),
            power,
            toughness,
            keywords: self.keywords,
            image_uri,
            set: self.set,
            collector_number: self.collector_number,
            name: self.name,
        }
    }
}

fn symbols_to_set(symbols: &[String]) -> ColorSet {
    ColorSet::parse(&symbols.concat())
}

/// In-memory card database indexed by name, face name and printing.
#[derive(Debug, Default)]
pub struct CardDatabase {
    cards: Vec<CardRecord>,
    by_name: HashMap<String, usize>,
    by_printing: HashMap<(String, String), usize>,
}

impl CardDatabase {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CardDbError> {
        let path = path.as_ref();
        let file = fs::File::open(path).map_err(|source| CardDbError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cards: Vec<ScryfallCard> = serde_json::from_reader(BufReader::new(file))?;
        let db = Self::from_scryfall(cards);
        log::info!(
            "loaded {} cards ({} names) from {}",
            db.len(),
            db.by_name.len(),
            path.display()
        );
        Ok(db)
    }

    pub fn from_json_str(text: &str) -> Result<Self, CardDbError> {
        let cards: Vec<ScryfallCard> = serde_json::from_str(text)?;
        Ok(Self::from_scryfall(cards))
    }

    fn from_scryfall(cards: Vec<ScryfallCard>) -> Self {
        // English printings are indexed first so they win every name slot.
        let (english, other): (Vec<ScryfallCard>, Vec<ScryfallCard>) =
            cards.into_iter().partition(ScryfallCard::is_english);
        let skipped = other.len();
        let mut db = Self::from_records(english.into_iter().map(ScryfallCard::into_record));
        for record in other.into_iter().map(ScryfallCard::into_record) {
            db.insert(record);
        }
        log::debug!("indexed {skipped} non-English printings as fallbacks");
        db
    }

    pub fn from_records(records: impl IntoIterator<Item = CardRecord>) -> Self {
        let mut db = Self::default();
        for record in records {
            db.insert(record);
        }
        db
    }

    /// Adds a record. Earlier records keep their name and printing slots.
    pub fn insert(&mut self, record: CardRecord) {
        let idx = self.cards.len();
        for face in record.face_names() {
            self.by_name.entry(name_key(face)).or_insert(idx);
        }
        if let (Some(set), Some(number)) = (&record.set, &record.collector_number) {
            self.by_printing
                .entry(printing_key(set, number))
                .or_insert(idx);
        }
        self.cards.push(record);
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn by_name(&self, name: &str) -> Option<&CardRecord> {
        self.by_name.get(&name_key(name)).map(|&idx| &self.cards[idx])
    }

    pub fn by_printing(&self, set: &str, collector_number: &str) -> Option<&CardRecord> {
        self.by_printing
            .get(&printing_key(set, collector_number))
            .map(|&idx| &self.cards[idx])
    }
}

fn printing_key(set: &str, collector_number: &str) -> (String, String) {
    (
        set.trim().to_lowercase(),
        collector_number.trim().to_lowercase(),
    )
}

impl CardLookup for CardDatabase {
    fn lookup(&self, query: &CardQuery) -> Option<CardRecord> {
        let found = match query {
            CardQuery::Name(name) => self.by_name(name),
            CardQuery::Printing {
                set,
                collector_number,
                name,
            } => self
                .by_printing(set, collector_number)
                .or_else(|| self.by_name(name)),
        };
        found.cloned()
    }
}
