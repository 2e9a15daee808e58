pub mod card;
pub mod card_db;
pub mod collection;
pub mod color;
pub mod config;
pub mod deck;
pub mod deck_list;
pub mod enrich;
pub mod error;
pub mod mana;
pub mod need;
pub mod roles;
pub mod scoring;
pub mod stats;
pub mod store;

pub use card::{CardId, CardRecord, PtValue, name_key};
pub use card_db::{CardDatabase, CardDbError, CardLookup, CardQuery, LookupBatch};
pub use collection::{
    Availability, AvailableCard, Collection, CollectionEntry, CollectionImport,
    compute_availability, suggestion_pool,
};
pub use color::{Color, ColorSet};
pub use config::{Config, ConfigError};
pub use deck::{Deck, DeckEntry, DeckId};
pub use deck_list::{
    CommanderSource, DeckListError, Dialect, LineError, ParsedDeckList, parse_deck_list,
};
pub use enrich::{DeckImport, assemble_deck, merge_entries};
pub use error::{Error, Result};
pub use mana::{ManaCost, ManaSymbol};
pub use need::{NeedError, NeedSpecification, Role, RoleCount};
pub use roles::{ROLE_MATCHERS, RoleMatcher, roles_for};
pub use scoring::{CardScore, MAX_CANDIDATES, ScoredCandidate, Signal, score_and_filter, score_card};
pub use stats::DeckStats;
pub use store::{FileStore, KeyValueStore, Library, MemoryStore, StoreError};
