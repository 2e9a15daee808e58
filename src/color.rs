use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Blue,
    Black,
    Red,
    Green,
}

impl Color {
    /// WUBRG order.
    pub const ALL: [Color; 5] = [
        Color::White,
        Color::Blue,
        Color::Black,
        Color::Red,
        Color::Green,
    ];

    /// Parses a single mana symbol letter (case-insensitive).
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol.to_ascii_uppercase() {
            'W' => Some(Color::White),
            'U' => Some(Color::Blue),
            'B' => Some(Color::Black),
            'R' => Some(Color::Red),
            'G' => Some(Color::Green),
            _ => None,
        }
    }

    pub const fn symbol(self) -> char {
        match self {
            Color::White => 'W',
            Color::Blue => 'U',
            Color::Black => 'B',
            Color::Red => 'R',
            Color::Green => 'G',
        }
    }
}

/// A set of colors represented as bitflags.
///
/// Used both for a card's castable colors and for its color identity. The empty
/// set is colorless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColorSet(u8);

impl ColorSet {
    pub const COLORLESS: Self = Self(0);
    pub const WHITE: Self = Self(1 << 0);
    pub const BLUE: Self = Self(1 << 1);
    pub const BLACK: Self = Self(1 << 2);
    pub const RED: Self = Self(1 << 3);
    pub const GREEN: Self = Self(1 << 4);

    pub const fn new() -> Self {
        Self(0)
    }

    pub const fn from_color(color: Color) -> Self {
        match color {
            Color::White => Self::WHITE,
            Color::Blue => Self::BLUE,
            Color::Black => Self::BLACK,
            Color::Red => Self::RED,
            Color::Green => Self::GREEN,
        }
    }

    /// Parses symbol text such as `"WU"`, `"W,U"`, `"{W}{U}"` or `"w u"`.
    /// Characters that are not color symbols are ignored.
    pub fn parse(text: &str) -> Self {
        text.chars().filter_map(Color::from_symbol).collect()
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, color: Color) -> bool {
        self.0 & Self::from_color(color).0 != 0
    }

    /// Returns true if this set contains all colors in the other set.
    pub const fn contains_all(self, other: ColorSet) -> bool {
        self.0 & other.0 == other.0
    }

    /// Commander legality: a card may join a deck whose identity is `self`
    /// only if the card's identity is a subset of it. Colorless cards are
    /// legal everywhere.
    pub const fn allows(self, card_identity: ColorSet) -> bool {
        self.contains_all(card_identity)
    }

    pub const fn union(self, other: ColorSet) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn with(self, color: Color) -> Self {
        self.union(Self::from_color(color))
    }

    /// Iterates the contained colors in WUBRG order.
    pub fn iter(self) -> impl Iterator<Item = Color> {
        Color::ALL.into_iter().filter(move |color| self.contains(*color))
    }

    /// Symbol letters in WUBRG order, e.g. `"UB"`. Empty for colorless.
    pub fn symbols(self) -> String {
        self.iter().map(Color::symbol).collect()
    }
}

impl fmt::Display for ColorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("C")
        } else {
            f.write_str(&self.symbols())
        }
    }
}

impl From<Color> for ColorSet {
    fn from(color: Color) -> Self {
        Self::from_color(color)
    }
}

impl FromIterator<Color> for ColorSet {
    fn from_iter<T: IntoIterator<Item = Color>>(iter: T) -> Self {
        iter.into_iter()
            .fold(ColorSet::COLORLESS, |set, color| set.with(color))
    }
}

// Card databases exchange colors as `["W", "U"]`.
impl Serialize for ColorSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let symbols: Vec<String> = self.iter().map(|c| c.symbol().to_string()).collect();
        symbols.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ColorSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let symbols = Vec::<String>::deserialize(deserializer)?;
        let mut set = ColorSet::COLORLESS;
        for symbol in symbols {
            let mut chars = symbol.trim().chars();
            match (chars.next().and_then(Color::from_symbol), chars.next()) {
                (Some(color), None) => set = set.with(color),
                _ => {
                    return Err(serde::de::Error::custom(format!(
                        "invalid color symbol '{symbol}'"
                    )));
                }
            }
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_set_empty() {
        let set = ColorSet::new();
        assert!(set.is_empty());
        assert_eq!(set.to_string(), "C");
    }

    #[test]
    fn test_color_set_union_and_symbols() {
        let dimir = ColorSet::BLACK.union(ColorSet::BLUE);
        assert_eq!(dimir.symbols(), "UB");
    }

    #[test]
    fn test_color_set_parse_tolerates_formatting() {
        assert_eq!(ColorSet::parse("{W}{U}"), ColorSet::WHITE.union(ColorSet::BLUE));
        assert_eq!(ColorSet::parse("g, r"), ColorSet::GREEN.union(ColorSet::RED));
        assert!(ColorSet::parse("").is_empty());
    }

    #[test]
    fn test_allows_requires_subset() {
        let mono_white = ColorSet::WHITE;
        let dimir = ColorSet::BLUE.union(ColorSet::BLACK);
        assert!(!mono_white.allows(dimir));
        assert!(mono_white.allows(ColorSet::WHITE));

        let esper = ColorSet::parse("WUB");
        assert!(esper.allows(dimir));
    }

    #[test]
    fn test_colorless_identity_is_legal_everywhere() {
        for identity in [ColorSet::COLORLESS, ColorSet::RED, ColorSet::parse("WUBRG")] {
            assert!(identity.allows(ColorSet::COLORLESS));
        }
    }

    #[test]
    fn test_color_set_with() {
        let set = ColorSet::new().with(Color::Green).with(Color::White);
        assert_eq!(set.symbols(), "WG");
        assert!(!set.contains(Color::Blue));
    }

    #[test]
    fn test_serde_symbol_array() {
        let set: ColorSet = serde_json::from_str(r#"["U","B"]"#).unwrap();
        assert_eq!(set, ColorSet::BLUE.union(ColorSet::BLACK));
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["U","B"]"#);

        let err = serde_json::from_str::<ColorSet>(r#"["X"]"#);
        assert!(err.is_err());
    }
}
