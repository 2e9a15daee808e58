//! Fixed heuristic vocabularies that recognize a card's functional roles from
//! its oracle text.
//!
//! Matching is case-insensitive substring containment. Each role fires at most
//! once per card no matter how many phrases hit. False positives and
//! negatives are the known precision ceiling of plain phrase matching.

use std::sync::LazyLock;

use regex::Regex;

use crate::card::CardRecord;
use crate::need::Role;

/// How one role is recognized, and what it is worth to the scorer.
#[derive(Debug)]
pub struct RoleMatcher {
    pub role: Role,
    /// Any one of these in the oracle text matches.
    pub any_of: &'static [&'static str],
    /// Every one of these must be in the oracle text.
    pub all_of: &'static [&'static str],
    /// Regexes over the lower-cased oracle text; any one matches.
    pub patterns: &'static [&'static str],
    /// When non-empty, the type line must contain one of these as well.
    pub type_line_any: &'static [&'static str],
    /// Also look for `any_of` phrases in the keyword list.
    pub check_keywords: bool,
    pub points: u32,
}

pub static ROLE_MATCHERS: [RoleMatcher; 10] = [
    RoleMatcher {
        role: Role::Removal,
        any_of: &["destroy target", "exile target", "deals damage to target"],
        all_of: &[],
        patterns: &[r"gets -(\d+|x)/-(\d+|x)", r"deals (\d+|x) damage to (any|target)"],
        type_line_any: &[],
        check_keywords: false,
        points: 12,
    },
    RoleMatcher {
        role: Role::Ramp,
        any_of: &[
            "add {",
            "add one mana",
            "add two mana",
            "add three mana",
            "mana of any color",
            "search your library for a basic land",
            "search your library for up to two basic land",
            "put a land card from your hand onto the battlefield",
        ],
        all_of: &[],
        patterns: &[],
        type_line_any: &["artifact", "creature", "enchantment"],
        check_keywords: false,
        points: 10,
    },
    RoleMatcher {
        role: Role::CardDraw,
        any_of: &["draw a card", "draws a card", "draw cards"],
        all_of: &[],
        patterns: &[r"draws? (two|three|four|five|six|seven|x|that many) cards"],
        type_line_any: &[],
        check_keywords: false,
        points: 12,
    },
    RoleMatcher {
        role: Role::BoardWipes,
        any_of: &[
            "destroy all",
            "exile all",
            "destroy each",
            "damage to each creature",
            "all creatures get -",
            "return all nonland permanents",
        ],
        all_of: &[],
        patterns: &[],
        type_line_any: &[],
        check_keywords: false,
        points: 15,
    },
    RoleMatcher {
        role: Role::Counterspells,
        any_of: &["counter target"],
        all_of: &[],
        patterns: &[],
        type_line_any: &[],
        check_keywords: false,
        points: 15,
    },
    RoleMatcher {
        role: Role::Protection,
        any_of: &["hexproof", "indestructible", "protection from", "shroud", "regenerate"],
        all_of: &[],
        patterns: &[],
        type_line_any: &[],
        check_keywords: true,
        points: 10,
    },
    RoleMatcher {
        role: Role::LandFetch,
        any_of: &[],
        all_of: &["search your library for a", "land"],
        patterns: &[],
        type_line_any: &[],
        check_keywords: false,
        points: 12,
    },
    RoleMatcher {
        role: Role::Graveyard,
        any_of: &[
            "from your graveyard",
            "from a graveyard",
            "into your graveyard",
            "in your graveyard",
            "from graveyards",
            "mill",
            "flashback",
            "unearth",
        ],
        all_of: &[],
        patterns: &[],
        type_line_any: &[],
        check_keywords: false,
        points: 10,
    },
    RoleMatcher {
        role: Role::Tokens,
        any_of: &[],
        all_of: &["create", "token"],
        patterns: &[],
        type_line_any: &[],
        check_keywords: false,
        points: 12,
    },
    RoleMatcher {
        role: Role::Tutor,
        any_of: &[],
        all_of: &["search your library", "put it into your hand"],
        patterns: &[],
        type_line_any: &[],
        check_keywords: false,
        points: 15,
    },
];

/// Extra ramp credit for artifacts that tap for mana, stacking with the ramp
/// role itself.
pub const MANA_ROCK_POINTS: u32 = 12;

static MANA_ROCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{t\}(, [^:]+)?: add ").expect("valid mana rock regex"));

static COMPILED_PATTERNS: LazyLock<Vec<Vec<Regex>>> = LazyLock::new(|| {
    ROLE_MATCHERS
        .iter()
        .map(|matcher| {
            matcher
                .patterns
                .iter()
                .map(|pattern| Regex::new(pattern).expect("valid role pattern"))
                .collect()
        })
        .collect()
});

/// Lower-cased views of the card fields the matchers read, built once per
/// card.
#[derive(Debug, Clone)]
pub struct CardText {
    pub name: String,
    pub oracle: String,
    pub type_line: String,
    pub keywords: Vec<String>,
}

impl CardText {
    pub fn new(card: &CardRecord) -> Self {
        Self {
            name: card.name.to_lowercase(),
            oracle: card.oracle_text.to_lowercase(),
            type_line: card.type_line.to_lowercase(),
            keywords: card.keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}

impl RoleMatcher {
    pub fn matches(&self, text: &CardText) -> bool {
        if !self.type_line_any.is_empty()
            && !self.type_line_any.iter().any(|t| text.type_line.contains(t))
        {
            return false;
        }

        if !self.all_of.iter().all(|phrase| text.oracle.contains(phrase)) {
            return false;
        }
        if self.any_of.is_empty() && self.patterns.is_empty() {
            return !self.all_of.is_empty();
        }

        let phrase_hit = self.any_of.iter().any(|phrase| {
            text.oracle.contains(phrase)
                || (self.check_keywords && text.keywords.iter().any(|k| k.contains(phrase)))
        });
        phrase_hit || self.compiled().iter().any(|re| re.is_match(&text.oracle))
    }

    fn compiled(&self) -> &'static [Regex] {
        let idx = ROLE_MATCHERS
            .iter()
            .position(|matcher| matcher.role == self.role)
            .unwrap_or_default();
        &COMPILED_PATTERNS[idx]
    }
}

/// Whether an artifact taps for mana.
pub fn is_mana_rock(text: &CardText) -> bool {
    text.type_line.contains("artifact") && MANA_ROCK_RE.is_match(&text.oracle)
}

/// Every role the card's text fills.
pub fn roles_for(card: &CardRecord) -> Vec<Role> {
    let text = CardText::new(card);
    ROLE_MATCHERS
        .iter()
        .filter(|matcher| matcher.matches(&text))
        .map(|matcher| matcher.role)
        .collect()
}
