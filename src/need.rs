//! The structured description of what a deck is missing.
//!
//! Produced by an external analysis step as JSON and validated here once.
//! Every field is optional on the wire; an absent field means "no preference"
//! and contributes nothing to scoring.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Functional roles a card can fill in a deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Removal,
    Ramp,
    CardDraw,
    BoardWipes,
    Counterspells,
    Protection,
    LandFetch,
    Graveyard,
    Tokens,
    Tutor,
}

impl Role {
    pub const ALL: [Role; 10] = [
        Role::Removal,
        Role::Ramp,
        Role::CardDraw,
        Role::BoardWipes,
        Role::Counterspells,
        Role::Protection,
        Role::LandFetch,
        Role::Graveyard,
        Role::Tokens,
        Role::Tutor,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Role::Removal => "removal",
            Role::Ramp => "ramp",
            Role::CardDraw => "card draw",
            Role::BoardWipes => "board wipes",
            Role::Counterspells => "counterspells",
            Role::Protection => "protection",
            Role::LandFetch => "land fetch",
            Role::Graveyard => "graveyard",
            Role::Tokens => "tokens",
            Role::Tutor => "tutors",
        }
    }

    /// The camelCase key used for this role in `roleCounts`.
    pub fn from_key(key: &str) -> Option<Role> {
        let role = match key {
            "removal" => Role::Removal,
            "ramp" => Role::Ramp,
            "cardDraw" => Role::CardDraw,
            "boardWipes" => Role::BoardWipes,
            "counterspells" => Role::Counterspells,
            "protection" => Role::Protection,
            "landFetch" => Role::LandFetch,
            "graveyard" => Role::Graveyard,
            "tokens" => Role::Tokens,
            "tutor" => Role::Tutor,
            _ => return None,
        };
        Some(role)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How many cards of a role the deck runs and how many it should.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleCount {
    #[serde(deserialize_with = "null_as_default")]
    pub current: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub ideal: u32,
}

impl RoleCount {
    pub fn shortfall(self) -> u32 {
        self.ideal.saturating_sub(self.current)
    }
}

#[derive(Debug, Error)]
pub enum NeedError {
    #[error("need specification is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("need specification must be a JSON object")]
    NotAnObject,
    #[error("no JSON object found in analysis output")]
    NoJsonObject,
}

/// Every field may be absent or `null`; either way it takes its neutral
/// default.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NeedSpecification {
    #[serde(deserialize_with = "null_as_default")]
    pub needs_removal: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub needs_ramp: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub needs_card_draw: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub needs_board_wipes: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub needs_counterspells: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub needs_protection: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub needs_land_fetch: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub needs_graveyard: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub needs_tokens: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub needs_tutor: bool,
    #[serde(deserialize_with = "known_role_counts")]
    pub role_counts: BTreeMap<Role, RoleCount>,
    #[serde(deserialize_with = "null_as_default")]
    pub wanted_keywords: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub wanted_creature_types: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub synergy_oracle_terms: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub additional_oracle_terms: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub want_big_creatures: bool,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "whole_number"
    )]
    pub min_power: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmc_curve_note: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Keeps the counts for roles this crate knows and drops the rest.
fn known_role_counts<'de, D>(deserializer: D) -> Result<BTreeMap<Role, RoleCount>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Option<RoleCount>>> = Option::deserialize(deserializer)?;
    let mut counts = BTreeMap::new();
    for (key, count) in raw.unwrap_or_default() {
        match Role::from_key(&key) {
            Some(role) => {
                counts.insert(role, count.unwrap_or_default());
            }
            None => log::debug!("ignoring count for unknown role {key:?}"),
        }
    }
    Ok(counts)
}

/// Accepts `5` and `5.0`; rejects fractions and values outside `i32`.
fn whole_number<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;

    let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let value = match number.as_i64() {
        Some(value) => value,
        None => match number.as_f64() {
            Some(value) if value.fract() == 0.0 && value.abs() <= i64::MAX as f64 => value as i64,
            _ => return Err(D::Error::custom(format!("expected a whole number, found {number}"))),
        },
    };
    i32::try_from(value)
        .map(Some)
        .map_err(|_| D::Error::custom(format!("{value} is out of range")))
}

impl NeedSpecification {
    /// Parses and normalizes a JSON object.
    ///
    /// Wrongly typed fields are an error; missing fields take their neutral
    /// default.
    pub fn from_json(text: &str) -> Result<Self, NeedError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        if !value.is_object() {
            return Err(NeedError::NotAnObject);
        }
        let need: NeedSpecification = serde_json::from_value(value)?;
        Ok(need.normalized())
    }

    /// Like [`from_json`](Self::from_json), but for free text such as a model
    /// reply. The body of a ```` ```json ```` fence is preferred; otherwise the
    /// outermost `{ ... }` is used.
    pub fn from_model_output(text: &str) -> Result<Self, NeedError> {
        let text = json_fence(text).unwrap_or(text);
        let start = text.find('{').ok_or(NeedError::NoJsonObject)?;
        let end = text.rfind('}').ok_or(NeedError::NoJsonObject)?;
        if end < start {
            return Err(NeedError::NoJsonObject);
        }
        Self::from_json(&text[start..=end])
    }

    /// Trims and lower-cases the matching vocabularies, drops blanks and
    /// duplicates. Keywords keep their case for display; they are compared
    /// case-insensitively.
    pub fn normalized(mut self) -> Self {
        self.wanted_keywords = clean_terms(self.wanted_keywords, false);
        self.wanted_creature_types = clean_terms(self.wanted_creature_types, true);
        self.synergy_oracle_terms = clean_terms(self.synergy_oracle_terms, true);
        self.additional_oracle_terms = clean_terms(self.additional_oracle_terms, true);
        self.cmc_curve_note = self
            .cmc_curve_note
            .map(|note| note.trim().to_string())
            .filter(|note| !note.is_empty());
        self.min_power = self.min_power.filter(|power| *power >= 0);
        self
    }

    pub fn needs(&self, role: Role) -> bool {
        match role {
            Role::Removal => self.needs_removal,
            Role::Ramp => self.needs_ramp,
            Role::CardDraw => self.needs_card_draw,
            Role::BoardWipes => self.needs_board_wipes,
            Role::Counterspells => self.needs_counterspells,
            Role::Protection => self.needs_protection,
            Role::LandFetch => self.needs_land_fetch,
            Role::Graveyard => self.needs_graveyard,
            Role::Tokens => self.needs_tokens,
            Role::Tutor => self.needs_tutor,
        }
    }

    pub fn set_need(&mut self, role: Role, needed: bool) {
        let flag = match role {
            Role::Removal => &mut self.needs_removal,
            Role::Ramp => &mut self.needs_ramp,
            Role::CardDraw => &mut self.needs_card_draw,
            Role::BoardWipes => &mut self.needs_board_wipes,
            Role::Counterspells => &mut self.needs_counterspells,
            Role::Protection => &mut self.needs_protection,
            Role::LandFetch => &mut self.needs_land_fetch,
            Role::Graveyard => &mut self.needs_graveyard,
            Role::Tokens => &mut self.needs_tokens,
            Role::Tutor => &mut self.needs_tutor,
        };
        *flag = needed;
    }

    pub fn needed_roles(&self) -> Vec<Role> {
        Role::ALL.into_iter().filter(|role| self.needs(*role)).collect()
    }

    pub fn role_count(&self, role: Role) -> RoleCount {
        self.role_counts.get(&role).copied().unwrap_or_default()
    }

    /// True when no field can contribute to a score.
    pub fn is_empty(&self) -> bool {
        self.needed_roles().is_empty()
            && self.wanted_keywords.is_empty()
            && self.wanted_creature_types.is_empty()
            && self.synergy_oracle_terms.is_empty()
            && self.additional_oracle_terms.is_empty()
            && !(self.want_big_creatures && self.min_power.is_some())
            && self.cmc_curve_note.is_none()
    }
}

fn json_fence(text: &str) -> Option<&str> {
    let opening = text.to_ascii_lowercase().find("```json")?;
    let body = &text[opening + "```json".len()..];
    let end = body.find("```").unwrap_or(body.len());
    Some(&body[..end])
}

fn clean_terms(terms: Vec<String>, lowercase: bool) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(terms.len());
    for term in terms {
        let term = term.trim();
        if term.is_empty() {
            continue;
        }
        let term = if lowercase {
            term.to_lowercase()
        } else {
            term.to_string()
        };
        if !cleaned.iter().any(|seen| seen.eq_ignore_ascii_case(&term)) {
            cleaned.push(term);
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_neutral() {
        let need = NeedSpecification::from_json("{}").unwrap();
        assert_eq!(need, NeedSpecification::default());
        assert!(need.is_empty());
    }

    #[test]
    fn test_parses_camel_case_fields() {
        let need = NeedSpecification::from_json(
            r#"{
                "needsRemoval": true,
                "needsCardDraw": true,
                "roleCounts": {"removal": {"current": 3, "ideal": 8}},
                "wantedKeywords": ["Flying", " flying ", ""],
                "wantedCreatureTypes": ["Goblin"],
                "synergyOracleTerms": ["Sacrifice", "sacrifice"],
                "wantBigCreatures": true,
                "minPower": 5,
                "cmcCurveNote": "  Curve is top-heavy  "
            }"#,
        )
        .unwrap();

        assert_eq!(need.needed_roles(), vec![Role::Removal, Role::CardDraw]);
        assert_eq!(need.role_count(Role::Removal).shortfall(), 5);
        assert_eq!(need.role_count(Role::Ramp), RoleCount::default());
        assert_eq!(need.wanted_keywords, vec!["Flying"]);
        assert_eq!(need.wanted_creature_types, vec!["goblin"]);
        assert_eq!(need.synergy_oracle_terms, vec!["sacrifice"]);
        assert_eq!(need.min_power, Some(5));
        assert_eq!(need.cmc_curve_note.as_deref(), Some("Curve is top-heavy"));
        assert!(!need.is_empty());
    }

    #[test]
    fn test_wrong_shape_is_malformed() {
        assert!(matches!(
            NeedSpecification::from_json("[1, 2]"),
            Err(NeedError::NotAnObject)
        ));
        assert!(matches!(
            NeedSpecification::from_json(r#"{"needsRemoval": "yes"}"#),
            Err(NeedError::Malformed(_))
        ));
        assert!(matches!(
            NeedSpecification::from_json(r#"{"wantedKeywords": "Flying"}"#),
            Err(NeedError::Malformed(_))
        ));
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let need = NeedSpecification::from_json(r#"{"commentary": "ok", "needsRamp": true}"#).unwrap();
        assert!(need.needs(Role::Ramp));
    }

    #[test]
    fn test_from_model_output_extracts_fenced_json() {
        let reply = "Here is the analysis:\n```json\n{\"needsTutor\": true}\n```\nGood luck!";
        let need = NeedSpecification::from_model_output(reply).unwrap();
        assert!(need.needs_tutor);

        assert!(matches!(
            NeedSpecification::from_model_output("no json here"),
            Err(NeedError::NoJsonObject)
        ));
    }

    #[test]
    fn test_null_fields_take_defaults() {
        let need = NeedSpecification::from_json(
            r#"{
                "needsRemoval": null, "needsRamp": null, "needsCardDraw": null,
                "needsBoardWipes": null, "needsCounterspells": null, "needsProtection": null,
                "needsLandFetch": null, "needsGraveyard": null, "needsTokens": null,
                "needsTutor": null, "roleCounts": null, "wantedKeywords": null,
                "wantedCreatureTypes": null, "synergyOracleTerms": null,
                "additionalOracleTerms": null, "wantBigCreatures": null,
                "minPower": null, "cmcCurveNote": null
            }"#,
        )
        .unwrap();
        assert_eq!(need, NeedSpecification::default());

        let need = NeedSpecification::from_json(
            r#"{"roleCounts": {"ramp": null, "removal": {"current": null, "ideal": 8}}}"#,
        )
        .unwrap();
        assert_eq!(need.role_count(Role::Ramp), RoleCount::default());
        assert_eq!(need.role_count(Role::Removal).shortfall(), 8);
    }

    #[test]
    fn test_min_power_accepts_whole_floats() {
        let need = NeedSpecification::from_json(r#"{"minPower": 5.0}"#).unwrap();
        assert_eq!(need.min_power, Some(5));
        assert!(matches!(
            NeedSpecification::from_json(r#"{"minPower": 4.5}"#),
            Err(NeedError::Malformed(_))
        ));
    }

    #[test]
    fn test_unknown_role_counts_are_dropped() {
        let need = NeedSpecification::from_json(
            r#"{"needsRamp": true, "roleCounts": {"lands": {"current": 30, "ideal": 37}, "ramp": {"current": 4, "ideal": 10}}}"#,
        )
        .unwrap();
        assert!(need.needs(Role::Ramp));
        assert_eq!(need.role_counts.len(), 1);
        assert_eq!(need.role_count(Role::Ramp).shortfall(), 6);
    }

    #[test]
    fn test_model_output_prefers_json_fence() {
        let reply = "Tap it with {T} for mana.\n```json\n{\"needsRamp\": true}\n```\nAlso {C}.";
        let need = NeedSpecification::from_model_output(reply).unwrap();
        assert!(need.needs_ramp);
    }

    #[test]
    fn test_big_creature_flag_without_min_power_is_empty() {
        let need = NeedSpecification {
            want_big_creatures: true,
            ..Default::default()
        };
        assert!(need.is_empty());
    }

    #[test]
    fn test_set_need() {
        let mut need = NeedSpecification::default();
        need.set_need(Role::BoardWipes, true);
        assert!(need.needs_board_wipes);
        assert_eq!(need.needed_roles(), vec![Role::BoardWipes]);
    }
}
