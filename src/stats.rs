//! Summary statistics for a deck.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::color::Color;
use crate::deck::Deck;
use crate::mana::ManaCost;
use crate::need::{NeedSpecification, Role, RoleCount};
use crate::roles::roles_for;

/// Mana value buckets `0..=6`, then `7+`.
pub const CURVE_BUCKETS: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckStats {
    pub total_cards: u32,
    /// Copies the card database could not resolve; excluded from every
    /// other figure.
    pub unresolved: u32,
    pub lands: u32,
    pub creatures: u32,
    /// Average mana value over nonland copies.
    pub average_mana_value: f64,
    pub curve: [u32; CURVE_BUCKETS],
    /// Colored pips per color, WUBRG order.
    pub pips: [u32; 5],
    pub roles: BTreeMap<Role, u32>,
}

impl DeckStats {
    pub fn from_deck(deck: &Deck) -> Self {
        let mut stats = DeckStats {
            total_cards: 0,
            unresolved: 0,
            lands: 0,
            creatures: 0,
            average_mana_value: 0.0,
            curve: [0; CURVE_BUCKETS],
            pips: [0; 5],
            roles: BTreeMap::new(),
        };
        let mut nonland = 0u32;
        let mut mana_value_sum = 0.0;

        for entry in deck.entries() {
            let copies = entry.quantity;
            stats.total_cards = stats.total_cards.saturating_add(copies);
            let Some(card) = &entry.card else {
                stats.unresolved = stats.unresolved.saturating_add(copies);
                continue;
            };

            if card.is_creature() {
                stats.creatures = stats.creatures.saturating_add(copies);
            }
            if card.is_land() {
                stats.lands = stats.lands.saturating_add(copies);
            } else {
                nonland = nonland.saturating_add(copies);
                mana_value_sum += card.mana_value * f64::from(copies);
                let bucket = (card.mana_value.max(0.0).floor() as usize).min(CURVE_BUCKETS - 1);
                stats.curve[bucket] = stats.curve[bucket].saturating_add(copies);
            }

            let cost = ManaCost::parse(&card.mana_cost);
            for (slot, color) in stats.pips.iter_mut().zip(Color::ALL) {
                *slot = slot.saturating_add(cost.colored_pips(color).saturating_mul(copies));
            }
            for role in roles_for(card) {
                let count = stats.roles.entry(role).or_insert(0);
                *count = count.saturating_add(copies);
            }
        }

        if nonland > 0 {
            stats.average_mana_value = mana_value_sum / f64::from(nonland);
        }
        stats
    }

    pub fn pips_for(&self, color: Color) -> u32 {
        Color::ALL
            .iter()
            .position(|c| *c == color)
            .map_or(0, |idx| self.pips[idx])
    }

    pub fn role_count(&self, role: Role) -> u32 {
        self.roles.get(&role).copied().unwrap_or(0)
    }

    /// Writes this deck's role counts into `need.role_counts[..].current`,
    /// keeping any ideal counts already present.
    pub fn fill_role_counts(&self, need: &mut NeedSpecification) {
        for role in Role::ALL {
            let count = need.role_counts.entry(role).or_insert_with(RoleCount::default);
            count.current = self.role_count(role);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{CardId, CardRecord};
    use crate::deck::DeckEntry;

    fn card(name: &str, type_line: &str, cost: &str, mv: f64, oracle: &str) -> CardRecord {
        CardRecord {
            type_line: type_line.to_string(),
            mana_cost: cost.to_string(),
            mana_value: mv,
            oracle_text: oracle.to_string(),
            ..CardRecord::new(CardId::new(name), name)
        }
    }

    fn deck() -> Deck {
        Deck::new(
            "Stats",
            vec![DeckEntry::enriched(
                card(
                    "Atraxa, Praetors' Voice",
                    "Legendary Creature — Phyrexian Angel Horror",
                    "{G}{W}{U}{B}",
                    4.0,
                    "Flying, vigilance, deathtouch, lifelink",
                ),
                1,
            )],
            vec![
                DeckEntry::enriched(card("Island", "Basic Land — Island", "", 0.0, "({T}: Add {U}.)"), 10),
                DeckEntry::enriched(card("Sol Ring", "Artifact", "{1}", 1.0, "{T}: Add {C}{C}."), 1),
                DeckEntry::enriched(card("Counterspell", "Instant", "{U}{U}", 2.0, "Counter target spell."), 2),
                DeckEntry::enriched(
                    card("Blightsteel Colossus", "Artifact Creature — Phyrexian Golem", "{12}", 12.0, "Trample, infect, indestructible"),
                    1,
                ),
                DeckEntry::new("Unknown", 3),
            ],
        )
    }

    #[test]
    fn test_counts_and_curve() {
        let stats = DeckStats::from_deck(&deck());
        assert_eq!(stats.total_cards, 18);
        assert_eq!(stats.unresolved, 3);
        assert_eq!(stats.lands, 10);
        assert_eq!(stats.creatures, 2);
        assert_eq!(stats.curve[1], 1);
        assert_eq!(stats.curve[2], 2);
        assert_eq!(stats.curve[4], 1);
        assert_eq!(stats.curve[7], 1);
        assert_eq!(stats.curve[0], 0);
        // (4 + 1 + 2 * 2 + 12) / 5
        assert!((stats.average_mana_value - 4.2).abs() < 1e-9);
    }

    #[test]
    fn test_pips() {
        let stats = DeckStats::from_deck(&deck());
        assert_eq!(stats.pips_for(Color::Blue), 5);
        assert_eq!(stats.pips_for(Color::Green), 1);
        assert_eq!(stats.pips_for(Color::Red), 0);
    }

    #[test]
    fn test_roles_feed_need_counts() {
        let stats = DeckStats::from_deck(&deck());
        assert_eq!(stats.role_count(Role::Counterspells), 2);
        assert_eq!(stats.role_count(Role::Ramp), 1);
        assert_eq!(stats.role_count(Role::Protection), 1);

        let mut need = NeedSpecification::default();
        need.role_counts.insert(Role::Counterspells, RoleCount { current: 0, ideal: 6 });
        stats.fill_role_counts(&mut need);
        assert_eq!(need.role_count(Role::Counterspells), RoleCount { current: 2, ideal: 6 });
        assert_eq!(need.role_count(Role::Tutor).current, 0);
    }

    #[test]
    fn test_huge_quantities_saturate() {
        let counterspell = card("Counterspell", "Instant", "{U}{U}", 2.0, "Counter target spell.");
        let deck = Deck::new(
            "Huge",
            vec![],
            vec![
                DeckEntry::enriched(counterspell.clone(), u32::MAX),
                DeckEntry::enriched(counterspell, 1),
            ],
        );
        let stats = DeckStats::from_deck(&deck);
        assert_eq!(stats.total_cards, u32::MAX);
        assert_eq!(stats.curve[2], u32::MAX);
        assert_eq!(stats.pips_for(Color::Blue), u32::MAX);
        assert_eq!(stats.role_count(Role::Counterspells), u32::MAX);
    }

    #[test]
    fn test_empty_deck() {
        let stats = DeckStats::from_deck(&Deck::new("Empty", vec![], vec![]));
        assert_eq!(stats.total_cards, 0);
        assert_eq!(stats.average_mana_value, 0.0);
    }
}
