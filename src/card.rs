use std::fmt;

use serde::{Deserialize, Serialize};

use crate::color::ColorSet;

/// Stable identifier assigned by the card database to one printing.
///
/// Distinct printings of the same card share a name but never an id, so
/// ownership and deck usage are always matched on this, not on the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub String);

impl CardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fallback identity for records that only carry a printing reference.
    pub fn from_printing(set: &str, collector_number: &str) -> Self {
        Self(format!(
            "{}:{}",
            set.trim().to_ascii_lowercase(),
            collector_number.trim().to_ascii_lowercase()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Printed power or toughness, which is not always a number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PtValue {
    /// Fixed numeric value (e.g., 4)
    Fixed(i32),
    /// Star value, determined by some characteristic (e.g., *)
    Star,
    /// Star plus a number (e.g., 1+* or *+1)
    StarPlus(i32),
    /// Anything else the database prints (`?`, `∞`, `1.5`).
    Other(String),
}

impl PtValue {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if let Ok(n) = text.parse::<i32>() {
            return PtValue::Fixed(n);
        }
        if text == "*" {
            return PtValue::Star;
        }
        let bonus = text
            .strip_suffix("+*")
            .or_else(|| text.strip_prefix("*+"))
            .and_then(|n| n.trim().parse::<i32>().ok());
        match bonus {
            Some(n) => PtValue::StarPlus(n),
            None => PtValue::Other(text.to_string()),
        }
    }

    /// The numeric value, only for fixed values.
    pub fn numeric(&self) -> Option<i32> {
        match self {
            PtValue::Fixed(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<String> for PtValue {
    fn from(text: String) -> Self {
        PtValue::parse(&text)
    }
}

impl From<PtValue> for String {
    fn from(value: PtValue) -> Self {
        value.to_string()
    }
}

impl fmt::Display for PtValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PtValue::Fixed(n) => write!(f, "{n}"),
            PtValue::Star => f.write_str("*"),
            PtValue::StarPlus(n) => write!(f, "{n}+*"),
            PtValue::Other(text) => f.write_str(text),
        }
    }
}

/// Normalized lookup key for a card name: trimmed and lower-cased.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Canonical card attributes as returned by the card database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRecord {
    pub id: CardId,
    pub name: String,
    #[serde(default)]
    pub type_line: String,
    #[serde(default)]
    pub oracle_text: String,
    #[serde(default)]
    pub mana_cost: String,
    #[serde(default)]
    pub mana_value: f64,
    #[serde(default)]
    pub colors: ColorSet,
    /// Determines Commander legality. Never substitute `colors` for this.
    #[serde(default)]
    pub color_identity: ColorSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<PtValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toughness: Option<PtValue>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collector_number: Option<String>,
}

impl CardRecord {
    pub fn new(id: CardId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            type_line: String::new(),
            oracle_text: String::new(),
            mana_cost: String::new(),
            mana_value: 0.0,
            colors: ColorSet::COLORLESS,
            color_identity: ColorSet::COLORLESS,
            power: None,
            toughness: None,
            keywords: Vec::new(),
            image_uri: None,
            set: None,
            collector_number: None,
        }
    }

    pub fn name_key(&self) -> String {
        name_key(&self.name)
    }

    /// Names under which this card may be listed: the full name plus each face
    /// of a multi-faced card (`"Delver of Secrets // Insectile Aberration"`).
    pub fn face_names(&self) -> Vec<&str> {
        let mut names = vec![self.name.trim()];
        if self.name.contains("//") {
            names.extend(
                self.name
                    .split("//")
                    .map(str::trim)
                    .filter(|face| !face.is_empty()),
            );
        }
        names
    }

    /// Case-insensitive check against the type line, e.g. `has_type("artifact")`.
    pub fn has_type(&self, word: &str) -> bool {
        self.type_line
            .to_lowercase()
            .contains(&word.to_lowercase())
    }

    pub fn is_creature(&self) -> bool {
        self.has_type("creature")
    }

    pub fn is_land(&self) -> bool {
        // The front face decides: "Instant // Land" MDFCs are spells.
        let front = self.type_line.split("//").next().unwrap_or_default();
        front.to_lowercase().contains("land")
    }

    pub fn is_legendary_creature(&self) -> bool {
        let front = self
            .type_line
            .split("//")
            .next()
            .unwrap_or_default()
            .to_lowercase();
        front.contains("legendary") && front.contains("creature")
    }

    pub fn numeric_power(&self) -> Option<i32> {
        self.power.as_ref().and_then(PtValue::numeric)
    }

    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| k.trim().eq_ignore_ascii_case(keyword.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sol_ring() -> CardRecord {
        CardRecord {
            type_line: "Artifact".to_string(),
            oracle_text: "{T}: Add {C}{C}.".to_string(),
            mana_cost: "{1}".to_string(),
            mana_value: 1.0,
            ..CardRecord::new(CardId::new("sol-ring-c21"), "Sol Ring")
        }
    }

    fn tarmogoyf() -> CardRecord {
        CardRecord {
            type_line: "Creature — Lhurgoyf".to_string(),
            power: Some(PtValue::Star),
            toughness: Some(PtValue::StarPlus(1)),
            colors: ColorSet::GREEN,
            color_identity: ColorSet::GREEN,
            ..CardRecord::new(CardId::new("goyf"), "Tarmogoyf")
        }
    }

    #[test]
    fn test_pt_value_parse() {
        assert_eq!(PtValue::parse("4"), PtValue::Fixed(4));
        assert_eq!(PtValue::parse("-1"), PtValue::Fixed(-1));
        assert_eq!(PtValue::parse("*"), PtValue::Star);
        assert_eq!(PtValue::parse("1+*"), PtValue::StarPlus(1));
        assert_eq!(PtValue::parse("*+1"), PtValue::StarPlus(1));
        assert_eq!(PtValue::parse("?"), PtValue::Other("?".to_string()));
    }

    #[test]
    fn test_pt_value_serde_round_trips_printed_text() {
        let value: PtValue = serde_json::from_str("\"1+*\"").unwrap();
        assert_eq!(value, PtValue::StarPlus(1));
        assert_eq!(serde_json::to_string(&value).unwrap(), "\"1+*\"");
    }

    #[test]
    fn test_non_numeric_power_has_no_numeric_value() {
        assert_eq!(tarmogoyf().numeric_power(), None);
    }

    #[test]
    fn test_type_line_helpers() {
        let ring = sol_ring();
        assert!(ring.has_type("ARTIFACT"));
        assert!(!ring.is_creature());
        assert!(!ring.is_land());

        let mut commander = tarmogoyf();
        commander.type_line = "Legendary Creature — Elf Druid".to_string();
        assert!(commander.is_legendary_creature());
        assert!(!tarmogoyf().is_legendary_creature());
    }

    #[test]
    fn test_mdfc_land_back_is_not_a_land() {
        let mut card = CardRecord::new(CardId::new("x"), "Sink into Stupor // Soporific Springs");
        card.type_line = "Instant // Land".to_string();
        assert!(!card.is_land());
        assert_eq!(
            card.face_names(),
            vec![
                "Sink into Stupor // Soporific Springs",
                "Sink into Stupor",
                "Soporific Springs"
            ]
        );
    }

    #[test]
    fn test_name_key_normalizes() {
        assert_eq!(name_key("  Sol Ring "), "sol ring");
        assert_eq!(sol_ring().name_key(), "sol ring");
    }

    #[test]
    fn test_card_record_deserializes_with_missing_fields() {
        let card: CardRecord =
            serde_json::from_str(r#"{"id":"abc","name":"Forest","colorIdentity":["G"]}"#)
                .unwrap();
        assert_eq!(card.color_identity, ColorSet::GREEN);
        assert!(card.colors.is_empty());
        assert!(card.keywords.is_empty());
    }

    #[test]
    fn test_printing_card_id() {
        assert_eq!(CardId::from_printing("C21 ", "263").as_str(), "c21:263");
    }
}
