//! Decks: commander and main-list entries, color identity, and edits.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::card::{CardId, CardRecord, name_key};
use crate::color::ColorSet;

/// One line of a deck: a card name with a quantity and optional printing,
/// carrying the card record once enrichment has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckEntry {
    pub name: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collector_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<CardRecord>,
    /// Set when the card database had no match for this entry.
    #[serde(default)]
    pub not_found: bool,
}

impl DeckEntry {
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            quantity,
            set: None,
            collector_number: None,
            card: None,
            not_found: false,
        }
    }

    pub fn with_printing(mut self, set: Option<String>, collector_number: Option<String>) -> Self {
        self.set = set;
        self.collector_number = collector_number;
        self
    }

    pub fn enriched(card: CardRecord, quantity: u32) -> Self {
        Self {
            name: card.name.clone(),
            quantity,
            set: card.set.clone(),
            collector_number: card.collector_number.clone(),
            card: Some(card),
            not_found: false,
        }
    }

    pub fn name_key(&self) -> String {
        name_key(&self.name)
    }

    pub fn card_id(&self) -> Option<&CardId> {
        self.card.as_ref().map(|card| &card.id)
    }

    pub fn is_enriched(&self) -> bool {
        self.card.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeckId(pub String);

impl DeckId {
    pub fn random() -> Self {
        Self(format!("{:016x}", rand::rng().random::<u64>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: DeckId,
    pub name: String,
    /// Zero to two entries; two for partner commanders.
    pub commander: Vec<DeckEntry>,
    pub cards: Vec<DeckEntry>,
    pub created_at: DateTime<Utc>,
}

impl Deck {
    pub fn new(name: impl Into<String>, commander: Vec<DeckEntry>, cards: Vec<DeckEntry>) -> Self {
        Self {
            id: DeckId::random(),
            name: name.into(),
            commander,
            cards,
            created_at: Utc::now(),
        }
    }

    /// Commander entries followed by the rest of the deck.
    pub fn entries(&self) -> impl Iterator<Item = &DeckEntry> {
        self.commander.iter().chain(self.cards.iter())
    }

    /// Union of the commanders' color identities. Unenriched commanders
    /// contribute nothing.
    pub fn color_identity(&self) -> ColorSet {
        self.commander
            .iter()
            .filter_map(|entry| entry.card.as_ref())
            .fold(ColorSet::COLORLESS, |identity, card| {
                identity.union(card.color_identity)
            })
    }

    pub fn contains_name(&self, name: &str) -> bool {
        let key = name_key(name);
        self.entries().any(|entry| entry.name_key() == key)
    }

    pub fn card_count(&self) -> u32 {
        self.entries().map(|entry| entry.quantity).sum()
    }

    /// Enriched non-commander entries inside the commander's identity. Entries
    /// the lookup missed are left out.
    pub fn legal_cards(&self) -> Vec<&DeckEntry> {
        let identity = self.color_identity();
        self.cards
            .iter()
            .filter(|entry| {
                entry
                    .card
                    .as_ref()
                    .is_some_and(|card| identity.allows(card.color_identity))
            })
            .collect()
    }

    /// Enriched non-commander entries whose identity falls outside the
    /// commander's.
    pub fn off_identity_cards(&self) -> Vec<&DeckEntry> {
        let identity = self.color_identity();
        self.cards
            .iter()
            .filter(|entry| {
                entry
                    .card
                    .as_ref()
                    .is_some_and(|card| !identity.allows(card.color_identity))
            })
            .collect()
    }

    /// Whether `card` could be added: identity-legal and not already present.
    pub fn accepts(&self, card: &CardRecord) -> bool {
        self.color_identity().allows(card.color_identity) && !self.contains_name(&card.name)
    }

    /// Adds an entry to the main list, summing quantity with an existing entry
    /// of the same name.
    pub fn add_card(&mut self, entry: DeckEntry) {
        let mut cards = std::mem::take(&mut self.cards);
        let key = entry.name_key();
        match cards.iter_mut().find(|existing| existing.name_key() == key) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(entry.quantity);
                if existing.card.is_none() && entry.card.is_some() {
                    existing.card = entry.card;
                    existing.not_found = false;
                }
            }
            None => cards.push(entry),
        }
        self.cards = cards;
    }

    /// Removes `quantity` copies (or every copy when `None`) of the named card
    /// from the main list. Returns false when the card is not in the list.
    pub fn remove_card(&mut self, name: &str, quantity: Option<u32>) -> bool {
        let key = name_key(name);
        if !self.cards.iter().any(|entry| entry.name_key() == key) {
            return false;
        }
        self.cards = std::mem::take(&mut self.cards)
            .into_iter()
            .filter_map(|mut entry| {
                if entry.name_key() != key {
                    return Some(entry);
                }
                match quantity {
                    Some(n) if n < entry.quantity => {
                        entry.quantity -= n;
                        Some(entry)
                    }
                    _ => None,
                }
            })
            .collect();
        true
    }

    /// Total quantity of each printing used by this deck, keyed by card id.
    pub fn usage_by_card(&self) -> HashMap<&CardId, u32> {
        let mut usage = HashMap::new();
        for entry in self.entries() {
            if let Some(id) = entry.card_id() {
                let used = usage.entry(id).or_insert(0u32);
                *used = used.saturating_add(entry.quantity);
            }
        }
        usage
    }
}
