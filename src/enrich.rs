//! Applies card lookup results to parsed entries and assembles decks.

use std::collections::HashMap;

use serde::Serialize;

use crate::card::{CardRecord, name_key};
use crate::card_db::{CardQuery, LookupBatch};
use crate::deck::{Deck, DeckEntry};
use crate::deck_list::{CommanderSource, LineError, ParsedDeckList};

/// Name and printing indexes over a lookup batch, built once per merge.
struct BatchIndex<'a> {
    by_name: HashMap<String, &'a CardRecord>,
    by_printing: HashMap<(String, String), &'a CardRecord>,
}

impl<'a> BatchIndex<'a> {
    fn new(batch: &'a LookupBatch) -> Self {
        let mut by_name = HashMap::with_capacity(batch.found.len());
        let mut by_printing = HashMap::new();
        for record in &batch.found {
            for face in record.face_names() {
                by_name.entry(name_key(face)).or_insert(record);
            }
            if let (Some(set), Some(number)) = (&record.set, &record.collector_number) {
                by_printing
                    .entry((name_key(set), name_key(number)))
                    .or_insert(record);
            }
        }
        Self {
            by_name,
            by_printing,
        }
    }

    fn get(&self, entry: &DeckEntry) -> Option<&'a CardRecord> {
        let printed = match CardQuery::for_entry(entry) {
            CardQuery::Printing {
                set,
                collector_number,
                ..
            } => self
                .by_printing
                .get(&(name_key(&set), name_key(&collector_number)))
                .copied(),
            CardQuery::Name(_) => None,
        };
        printed.or_else(|| self.by_name.get(&entry.name_key()).copied())
    }
}

/// Joins entries with lookup results by name (or exact printing when the
/// entry names one). Entries without a match are kept and flagged
/// `not_found`.
pub fn merge_entries(entries: Vec<DeckEntry>, batch: &LookupBatch) -> Vec<DeckEntry> {
    let index = BatchIndex::new(batch);
    entries
        .into_iter()
        .map(|mut entry| match index.get(&entry) {
            Some(card) => DeckEntry::enriched(card.clone(), entry.quantity),
            None => {
                entry.card = None;
                entry.not_found = true;
                entry
            }
        })
        .collect()
}

/// The outcome of importing a deck list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckImport {
    pub deck: Deck,
    pub not_found: Vec<String>,
    pub parse_errors: Vec<LineError>,
    /// Enriched cards outside the commanders' color identity.
    pub off_identity: Vec<String>,
}

/// Builds a deck from a parsed list and its lookup results.
///
/// When the commander was promoted positionally and both it and the next
/// entry are legendary creatures, the next entry joins the commander list as
/// a partner.
pub fn assemble_deck(name: &str, parsed: ParsedDeckList, batch: &LookupBatch) -> DeckImport {
    let ParsedDeckList {
        commander,
        cards,
        errors,
        commander_source,
        ..
    } = parsed;

    let mut commander = merge_entries(commander, batch);
    let mut cards = merge_entries(cards, batch);

    let is_legend = |entry: &DeckEntry| {
        entry
            .card
            .as_ref()
            .is_some_and(CardRecord::is_legendary_creature)
    };
    if commander_source == CommanderSource::Positional
        && commander.len() == 1
        && is_legend(&commander[0])
        && cards.first().is_some_and(|entry| is_legend(entry))
    {
        let partner = cards.remove(0);
        log::debug!("treating '{}' as partner commander", partner.name);
        commander.push(partner);
    }

    let deck = Deck::new(name, commander, cards);
    let not_found: Vec<String> = deck
        .entries()
        .filter(|entry| entry.not_found)
        .map(|entry| entry.name.clone())
        .collect();
    let off_identity: Vec<String> = deck
        .off_identity_cards()
        .into_iter()
        .map(|entry| entry.name.clone())
        .collect();

    if !not_found.is_empty() {
        log::warn!("{} card(s) not found in card database", not_found.len());
    }
    log::info!(
        "assembled deck '{}' ({}): {} cards, identity {}",
        deck.name,
        deck.id,
        deck.card_count(),
        deck.color_identity()
    );

    DeckImport {
        deck,
        not_found,
        parse_errors: errors,
        off_identity,
    }
}
