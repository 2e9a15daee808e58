//! The player's card collection and how much of it is free to use.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::card::{CardId, CardRecord, name_key};
use crate::card_db::LookupBatch;
use crate::color::ColorSet;
use crate::deck::Deck;
use crate::deck_list::{LineError, ParsedDeckList};
use crate::enrich::merge_entries;

/// Owned copies of one printing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionEntry {
    pub card_id: CardId,
    pub quantity: u32,
    pub card: CardRecord,
}

/// At most one entry per card id; adding a printing again raises its
/// quantity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection {
    entries: Vec<CollectionEntry>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionImport {
    /// Copies added across all entries.
    pub added: u32,
    pub not_found: Vec<String>,
    pub parse_errors: Vec<LineError>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[CollectionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_cards(&self) -> u32 {
        self.entries.iter().map(|entry| entry.quantity).sum()
    }

    pub fn get(&self, id: &CardId) -> Option<&CollectionEntry> {
        self.entries.iter().find(|entry| &entry.card_id == id)
    }

    pub fn add(&mut self, card: CardRecord, quantity: u32) {
        if quantity == 0 {
            return;
        }
        match self.entries.iter_mut().find(|entry| entry.card_id == card.id) {
            Some(entry) => entry.quantity = entry.quantity.saturating_add(quantity),
            None => self.entries.push(CollectionEntry {
                card_id: card.id.clone(),
                quantity,
                card,
            }),
        }
    }

    /// Removes up to `quantity` copies, dropping the entry when none remain.
    /// Returns false when the card is not in the collection.
    pub fn remove(&mut self, id: &CardId, quantity: u32) -> bool {
        let Some(idx) = self.entries.iter().position(|entry| &entry.card_id == id) else {
            return false;
        };
        let entry = &mut self.entries[idx];
        entry.quantity = entry.quantity.saturating_sub(quantity);
        if entry.quantity == 0 {
            self.entries.remove(idx);
        }
        true
    }

    /// Adds every enriched entry of a parsed list. Commander placement is
    /// irrelevant here, so both sections are imported alike.
    pub fn import(&mut self, parsed: ParsedDeckList, batch: &LookupBatch) -> CollectionImport {
        let ParsedDeckList {
            mut commander,
            cards,
            errors,
            ..
        } = parsed;
        commander.extend(cards);

        let mut summary = CollectionImport {
            parse_errors: errors,
            ..Default::default()
        };
        for entry in merge_entries(commander, batch) {
            match entry.card {
                Some(card) => {
                    summary.added = summary.added.saturating_add(entry.quantity);
                    self.add(card, entry.quantity);
                }
                None => summary.not_found.push(entry.name),
            }
        }

        log::info!(
            "collection import: {} copies added, {} not found, {} entries total",
            summary.added,
            summary.not_found.len(),
            self.len()
        );
        summary
    }
}

/// Owned versus committed copies of one printing. `available` goes negative
/// when decks use more copies than are owned.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub card: CardRecord,
    pub owned: u32,
    pub used: u32,
    pub available: i64,
}

/// A card offered to the scorer with the copies free to use.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableCard {
    pub card: CardRecord,
    pub available: u32,
}

/// Owned minus used, per collection entry, where usage sums every deck's
/// commander and main entries matched by card id.
///
/// Pure; recompute whenever the collection or any deck changes.
pub fn compute_availability(collection: &[CollectionEntry], decks: &[Deck]) -> Vec<Availability> {
    let mut usage: HashMap<&CardId, u32> = HashMap::new();
    for deck in decks {
        for (id, quantity) in deck.usage_by_card() {
            let used = usage.entry(id).or_insert(0);
            *used = used.saturating_add(quantity);
        }
    }

    collection
        .iter()
        .map(|entry| {
            let used = usage.get(&entry.card_id).copied().unwrap_or(0);
            Availability {
                card: entry.card.clone(),
                owned: entry.quantity,
                used,
                available: i64::from(entry.quantity) - i64::from(used),
            }
        })
        .collect()
}

/// Cards that may be suggested for a deck with `identity`: at least one free
/// copy and a color identity inside the deck's.
///
/// Printings sharing a name collapse into one card (the first printing seen)
/// with their free copies summed, since the scorer works by name.
pub fn suggestion_pool(availability: &[Availability], identity: ColorSet) -> Vec<AvailableCard> {
    let mut pool: Vec<AvailableCard> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();

    for item in availability {
        if item.available <= 0 || !identity.allows(item.card.color_identity) {
            continue;
        }
        let free = u32::try_from(item.available).unwrap_or(u32::MAX);
        let key = name_key(&item.card.name);
        match by_name.get(&key).copied() {
            Some(idx) => pool[idx].available = pool[idx].available.saturating_add(free),
            None => {
                by_name.insert(key, pool.len());
                pool.push(AvailableCard {
                    card: item.card.clone(),
                    available: free,
                });
            }
        }
    }

    log::debug!(
        "suggestion pool for identity {identity}: {} of {} entries",
        pool.len(),
        availability.len()
    );
    pool
}
