//! Relevance scoring of owned, unused cards against a deck's needs.
//!
//! Every candidate starts at zero and accumulates points from independent
//! signal families:
//!
//! | Family                | Points             |
//! |-----------------------|--------------------|
//! | synergy term          | 15 per term        |
//! | wanted keyword        | 10 per keyword     |
//! | wanted creature type  | 12 per type        |
//! | additional oracle term| 8 per term         |
//! | needed role           | flat, per role     |
//! | mana rock (ramp)      | 12, stacks on ramp |
//! | big creature          | 8                  |
//! | curve correction      | 5                  |
//!
//! Curated lists (terms, keywords, types) reward every distinct hit. Role
//! families fire once per card however many phrases match, so verbose
//! oracle text cannot dominate the ranking.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::card::{CardRecord, name_key};
use crate::collection::AvailableCard;
use crate::deck::DeckEntry;
use crate::need::{NeedSpecification, Role};
use crate::roles::{self, CardText, MANA_ROCK_POINTS, ROLE_MATCHERS};

/// Hard cap on the candidate list handed to analysis.
pub const MAX_CANDIDATES: usize = 100;

pub const SYNERGY_TERM_POINTS: u32 = 15;
pub const KEYWORD_POINTS: u32 = 10;
pub const CREATURE_TYPE_POINTS: u32 = 12;
pub const ORACLE_TERM_POINTS: u32 = 8;
pub const BIG_CREATURE_POINTS: u32 = 8;
pub const CURVE_POINTS: u32 = 5;

/// One reason a card scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Signal {
    SynergyTerm { term: String },
    Keyword { keyword: String },
    CreatureType { creature_type: String },
    OracleTerm { term: String },
    Role { role: Role, points: u32 },
    ManaRock,
    BigCreature { power: i32 },
    CurveFix,
}

impl Signal {
    pub fn points(&self) -> u32 {
        match self {
            Signal::SynergyTerm { .. } => SYNERGY_TERM_POINTS,
            Signal::Keyword { .. } => KEYWORD_POINTS,
            Signal::CreatureType { .. } => CREATURE_TYPE_POINTS,
            Signal::OracleTerm { .. } => ORACLE_TERM_POINTS,
            Signal::Role { points, .. } => *points,
            Signal::ManaRock => MANA_ROCK_POINTS,
            Signal::BigCreature { .. } => BIG_CREATURE_POINTS,
            Signal::CurveFix => CURVE_POINTS,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::SynergyTerm { term } => write!(f, "synergy \"{term}\""),
            Signal::Keyword { keyword } => write!(f, "keyword {keyword}"),
            Signal::CreatureType { creature_type } => write!(f, "type {creature_type}"),
            Signal::OracleTerm { term } => write!(f, "text \"{term}\""),
            Signal::Role { role, .. } => write!(f, "{role}"),
            Signal::ManaRock => f.write_str("mana rock"),
            Signal::BigCreature { power } => write!(f, "power {power}"),
            Signal::CurveFix => f.write_str("curve"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CardScore {
    pub score: u32,
    pub signals: Vec<Signal>,
}

impl CardScore {
    fn add(&mut self, signal: Signal) {
        self.score = self.score.saturating_add(signal.points());
        self.signals.push(signal);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    pub card: CardRecord,
    pub available: u32,
    pub relevance_score: u32,
    pub signals: Vec<Signal>,
}

/// Scores a single card. Pure; absent need fields contribute nothing.
pub fn score_card(card: &CardRecord, need: &NeedSpecification) -> CardScore {
    let text = CardText::new(card);
    let mut score = CardScore::default();

    for term in &need.synergy_oracle_terms {
        let term_lower = term.to_lowercase();
        if text.oracle.contains(&term_lower) || text.name.contains(&term_lower) {
            score.add(Signal::SynergyTerm { term: term.clone() });
        }
    }

    for keyword in &need.wanted_keywords {
        if card.has_keyword(keyword) {
            score.add(Signal::Keyword {
                keyword: keyword.clone(),
            });
        }
    }

    for creature_type in &need.wanted_creature_types {
        if text.type_line.contains(&creature_type.to_lowercase()) {
            score.add(Signal::CreatureType {
                creature_type: creature_type.clone(),
            });
        }
    }

    for term in &need.additional_oracle_terms {
        if text.oracle.contains(&term.to_lowercase()) {
            score.add(Signal::OracleTerm { term: term.clone() });
        }
    }

    for matcher in ROLE_MATCHERS.iter() {
        if need.needs(matcher.role) && matcher.matches(&text) {
            score.add(Signal::Role {
                role: matcher.role,
                points: matcher.points,
            });
        }
    }
    if need.needs_ramp && roles::is_mana_rock(&text) {
        score.add(Signal::ManaRock);
    }

    if need.want_big_creatures
        && let Some(min_power) = need.min_power
        && let Some(power) = card.numeric_power()
        && power >= min_power
    {
        score.add(Signal::BigCreature { power });
    }

    if let Some(note) = need.cmc_curve_note.as_deref()
        && curve_fix_applies(note, card.mana_value)
    {
        score.add(Signal::CurveFix);
    }

    score
}

/// Cheap cards help a top-heavy curve, expensive threats help a curve that
/// sits too low. Both directions are checked; a card can satisfy at most one.
fn curve_fix_applies(note: &str, mana_value: f64) -> bool {
    let note = note.to_lowercase();
    let wants_cheap = note.contains("top-heavy") || note.contains("expensive");
    let wants_threats = note.contains("too low") || note.contains("needs threats");
    (wants_cheap && mana_value <= 3.0) || (wants_threats && mana_value >= 5.0)
}

/// Ranks available cards for a deck.
///
/// Cards already in the deck (by name, any face) are excluded, as is every
/// card that scores zero. The result is sorted by descending score with ties
/// kept in input order, and holds at most [`MAX_CANDIDATES`] entries. An
/// empty result is valid.
pub fn score_and_filter(
    available: &[AvailableCard],
    need: &NeedSpecification,
    deck_cards: &[DeckEntry],
) -> Vec<ScoredCandidate> {
    let mut in_deck: HashSet<String> = HashSet::new();
    for entry in deck_cards {
        in_deck.insert(entry.name_key());
        if let Some(card) = &entry.card {
            in_deck.extend(card.face_names().into_iter().map(name_key));
        }
    }

    let mut candidates: Vec<ScoredCandidate> = available
        .iter()
        .filter(|candidate| {
            !candidate
                .card
                .face_names()
                .into_iter()
                .any(|face| in_deck.contains(&name_key(face)))
        })
        .filter_map(|candidate| {
            let CardScore { score, signals } = score_card(&candidate.card, need);
            (score > 0).then(|| ScoredCandidate {
                card: candidate.card.clone(),
                available: candidate.available,
                relevance_score: score,
                signals,
            })
        })
        .collect();

    // `sort_by` is stable, so equal scores keep the caller's order.
    candidates.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
    let total = candidates.len();
    candidates.truncate(MAX_CANDIDATES);

    log::debug!(
        "scored {} available cards: {} candidates, kept {}",
        available.len(),
        total,
        candidates.len()
    );
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{CardId, PtValue};

    fn card(name: &str, type_line: &str, oracle: &str) -> CardRecord {
        CardRecord {
            type_line: type_line.to_string(),
            oracle_text: oracle.to_string(),
            ..CardRecord::new(CardId::new(name_key(name)), name)
        }
    }

    fn available(card: CardRecord) -> AvailableCard {
        AvailableCard {
            card,
            available: 1,
        }
    }

    #[test]
    fn test_synergy_term_counts_each_matched_term_once() {
        let need = NeedSpecification {
            synergy_oracle_terms: vec!["wall".to_string(), "defender".to_string()],
            ..Default::default()
        };
        let wall = card("Stone Barrier", "Creature — Wall", "This creature is a Wall");
        assert_eq!(score_card(&wall, &need).score, 15);

        let both = card("Tall Wall", "Creature — Wall", "Defender. This wall is tall.");
        assert_eq!(score_card(&both, &need).score, 30);
    }

    #[test]
    fn test_synergy_term_matches_name() {
        let need = NeedSpecification {
            synergy_oracle_terms: vec!["goblin".to_string()],
            ..Default::default()
        };
        let card = card("Goblin Bombardment", "Enchantment", "Sacrifice a creature: deal 1 damage.");
        assert_eq!(score_card(&card, &need).score, 15);
    }

    #[test]
    fn test_role_bonus_is_flat() {
        let need = NeedSpecification {
            needs_card_draw: true,
            ..Default::default()
        };
        let card = card("Double Draw", "Sorcery", "Draw a card. Draw a card.");
        let score = score_card(&card, &need);
        assert_eq!(score.score, 12);
        assert_eq!(
            score.signals,
            vec![Signal::Role {
                role: Role::CardDraw,
                points: 12
            }]
        );
    }

    #[test]
    fn test_role_without_need_flag_scores_nothing() {
        let card = card("Murder", "Instant", "Destroy target creature.");
        assert_eq!(score_card(&card, &NeedSpecification::default()).score, 0);
    }

    #[test]
    fn test_mana_rock_stacks_with_ramp() {
        let need = NeedSpecification {
            needs_ramp: true,
            ..Default::default()
        };
        let signet = card("Arcane Signet", "Artifact", "{T}: Add one mana of any color in your commander's color identity.");
        assert_eq!(score_card(&signet, &need).score, 22);

        let dork = card("Llanowar Elves", "Creature — Elf Druid", "{T}: Add {G}.");
        assert_eq!(score_card(&dork, &need).score, 10);
    }

    #[test]
    fn test_keywords_match_exactly_case_insensitive() {
        let need = NeedSpecification {
            wanted_keywords: vec!["Flying".to_string(), "Haste".to_string()],
            ..Default::default()
        };
        let mut angel = card("Serra Angel", "Creature — Angel", "Flying, vigilance");
        angel.keywords = vec!["flying".to_string(), "Vigilance".to_string()];
        assert_eq!(score_card(&angel, &need).score, 10);

        let mut other = card("Odd", "Creature — Bird", "");
        other.keywords = vec!["Flying Reach".to_string()];
        assert_eq!(score_card(&other, &need).score, 0);
    }

    #[test]
    fn test_creature_type_and_oracle_terms() {
        let need = NeedSpecification {
            wanted_creature_types: vec!["goblin".to_string(), "warrior".to_string()],
            additional_oracle_terms: vec!["sacrifice".to_string()],
            ..Default::default()
        };
        let card = card(
            "Mogg War Marshal",
            "Creature — Goblin Warrior",
            "Echo {1}{R}. When this creature enters or dies, create a 1/1 red Goblin creature token. Sacrifice it later.",
        );
        assert_eq!(score_card(&card, &need).score, 12 + 12 + 8);
    }

    #[test]
    fn test_big_creature_requires_numeric_power() {
        let need = NeedSpecification {
            want_big_creatures: true,
            min_power: Some(5),
            ..Default::default()
        };
        let mut dragon = card("Shivan Dragon", "Creature — Dragon", "Flying");
        dragon.power = Some(PtValue::Fixed(5));
        assert_eq!(score_card(&dragon, &need).score, 8);

        let mut goyf = card("Tarmogoyf", "Creature — Lhurgoyf", "");
        goyf.power = Some(PtValue::StarPlus(7));
        assert_eq!(score_card(&goyf, &need).score, 0);

        let no_min = NeedSpecification {
            want_big_creatures: true,
            ..Default::default()
        };
        assert_eq!(score_card(&dragon, &no_min).score, 0);
    }

    #[test]
    fn test_curve_note_branches() {
        let mut cheap = card("Cheap", "Instant", "");
        cheap.mana_value = 2.0;
        let mut pricey = card("Pricey", "Creature — Dragon", "");
        pricey.mana_value = 6.0;

        let top_heavy = NeedSpecification {
            cmc_curve_note: Some("The curve is Top-Heavy".to_string()),
            ..Default::default()
        };
        assert_eq!(score_card(&cheap, &top_heavy).score, 5);
        assert_eq!(score_card(&pricey, &top_heavy).score, 0);

        let too_low = NeedSpecification {
            cmc_curve_note: Some("curve is too low, needs threats".to_string()),
            ..Default::default()
        };
        assert_eq!(score_card(&cheap, &too_low).score, 0);
        assert_eq!(score_card(&pricey, &too_low).score, 5);

        let both = NeedSpecification {
            cmc_curve_note: Some("too expensive but also too low".to_string()),
            ..Default::default()
        };
        assert_eq!(score_card(&pricey, &both).score, 5);
        assert_eq!(score_card(&cheap, &both).score, 5);

        let mut middling = card("Middling", "Sorcery", "");
        middling.mana_value = 4.0;
        assert_eq!(score_card(&middling, &both).score, 0);
    }

    #[test]
    fn test_excludes_deck_cards_and_zero_scores() {
        let need = NeedSpecification {
            needs_removal: true,
            ..Default::default()
        };
        let pool = vec![
            available(card("Swords to Plowshares", "Instant", "Exile target creature.")),
            available(card("Murder", "Instant", "Destroy target creature.")),
            available(card("Grizzly Bears", "Creature — Bear", "")),
        ];
        let deck = vec![DeckEntry::new("  swords to PLOWSHARES", 1)];

        let result = score_and_filter(&pool, &need, &deck);
        let names: Vec<&str> = result.iter().map(|c| c.card.name.as_str()).collect();
        assert_eq!(names, vec!["Murder"]);
        assert_eq!(result[0].relevance_score, 12);
    }

    #[test]
    fn test_excludes_by_face_name() {
        let need = NeedSpecification {
            needs_card_draw: true,
            ..Default::default()
        };
        let pool = vec![available(card(
            "Delver of Secrets // Insectile Aberration",
            "Creature — Human Wizard // Creature — Human Insect",
            "At the beginning of your upkeep, look at the top card of your library. Draw a card.",
        ))];
        let deck = vec![DeckEntry::new("Delver of Secrets", 1)];
        assert!(score_and_filter(&pool, &need, &deck).is_empty());
    }

    #[test]
    fn test_stable_ordering_and_cap() {
        let need = NeedSpecification {
            needs_counterspells: true,
            synergy_oracle_terms: vec!["scry".to_string()],
            ..Default::default()
        };
        let mut pool: Vec<AvailableCard> = (0..150)
            .map(|i| available(card(&format!("Counter {i:03}"), "Instant", "Counter target spell.")))
            .collect();
        pool.push(available(card("Dissolve", "Instant", "Counter target spell. Scry 1.")));

        let result = score_and_filter(&pool, &need, &[]);
        assert_eq!(result.len(), MAX_CANDIDATES);
        assert_eq!(result[0].card.name, "Dissolve");
        assert_eq!(result[0].relevance_score, 30);
        assert_eq!(result[1].card.name, "Counter 000");
        assert_eq!(result[99].card.name, "Counter 098");
        assert!(result.windows(2).all(|w| w[0].relevance_score >= w[1].relevance_score));

        assert_eq!(result, score_and_filter(&pool, &need, &[]));
    }

    #[test]
    fn test_empty_inputs_yield_empty_result() {
        let need = NeedSpecification {
            needs_removal: true,
            ..Default::default()
        };
        assert!(score_and_filter(&[], &need, &[]).is_empty());

        let pool = vec![available(card("Murder", "Instant", "Destroy target creature."))];
        assert!(score_and_filter(&pool, &NeedSpecification::default(), &[]).is_empty());
    }
}
