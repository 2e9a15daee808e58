use crate::color::{Color, ColorSet};

/// Atomic mana payment options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManaSymbol {
    White,
    Blue,
    Black,
    Red,
    Green,
    /// Colorless mana {C}
    Colorless,
    /// Generic mana {1}, {2}, etc.
    Generic(u32),
    Snow,
    /// Life payment for Phyrexian costs
    Life(u8),
    /// Variable mana {X}
    X,
}

impl ManaSymbol {
    /// Returns the mana value contribution of this symbol.
    pub fn mana_value(&self) -> u32 {
        match self {
            ManaSymbol::White
            | ManaSymbol::Blue
            | ManaSymbol::Black
            | ManaSymbol::Red
            | ManaSymbol::Green
            | ManaSymbol::Colorless
            | ManaSymbol::Snow => 1,
            ManaSymbol::Generic(n) => *n,
            ManaSymbol::Life(_) | ManaSymbol::X => 0,
        }
    }

    pub fn color(&self) -> Option<Color> {
        match self {
            ManaSymbol::White => Some(Color::White),
            ManaSymbol::Blue => Some(Color::Blue),
            ManaSymbol::Black => Some(Color::Black),
            ManaSymbol::Red => Some(Color::Red),
            ManaSymbol::Green => Some(Color::Green),
            _ => None,
        }
    }

    fn parse(token: &str) -> Option<Self> {
        if let Ok(n) = token.parse::<u32>() {
            return Some(ManaSymbol::Generic(n));
        }
        match token.to_ascii_uppercase().as_str() {
            "W" => Some(ManaSymbol::White),
            "U" => Some(ManaSymbol::Blue),
            "B" => Some(ManaSymbol::Black),
            "R" => Some(ManaSymbol::Red),
            "G" => Some(ManaSymbol::Green),
            "C" => Some(ManaSymbol::Colorless),
            "S" => Some(ManaSymbol::Snow),
            "P" => Some(ManaSymbol::Life(2)),
            "X" | "Y" | "Z" => Some(ManaSymbol::X),
            _ => None,
        }
    }
}

/// A mana cost as a sequence of pips, where each pip lists alternative payment
/// options.
///
/// - `{2}{W}{W}` = `[[Generic(2)], [White], [White]]`
/// - `{W/U}` (hybrid) = `[[White, Blue]]`
/// - `{W/P}` (phyrexian) = `[[White, Life(2)]]`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManaCost {
    pips: Vec<Vec<ManaSymbol>>,
}

impl ManaCost {
    pub fn new() -> Self {
        Self { pips: Vec::new() }
    }

    /// Parses oracle-style cost text such as `"{2}{W/U}{B}"`.
    ///
    /// Unknown symbols (half mana, un-set oddities) are skipped. Split cards
    /// (`"{1}{U} // {2}{R}"`) contribute the pips of every half.
    pub fn parse(text: &str) -> Self {
        let mut pips = Vec::new();
        let mut rest = text;
        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            let inner = &rest[start + 1..start + len];
            let pip: Vec<ManaSymbol> = inner.split('/').filter_map(ManaSymbol::parse).collect();
            if !pip.is_empty() {
                pips.push(pip);
            }
            rest = &rest[start + len + 1..];
        }
        Self { pips }
    }

    /// For each pip, uses the maximum mana value among its alternatives.
    pub fn mana_value(&self) -> u32 {
        self.pips
            .iter()
            .map(|pip| pip.iter().map(|s| s.mana_value()).max().unwrap_or(0))
            .sum()
    }

    pub fn pips(&self) -> &[Vec<ManaSymbol>] {
        &self.pips
    }

    pub fn colors(&self) -> ColorSet {
        self.pips
            .iter()
            .flatten()
            .filter_map(ManaSymbol::color)
            .collect()
    }

    /// Number of pips payable with the given color.
    pub fn colored_pips(&self, color: Color) -> u32 {
        self.pips
            .iter()
            .filter(|pip| pip.iter().any(|s| s.color() == Some(color)))
            .count() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.pips.is_empty()
    }

    pub fn has_x(&self) -> bool {
        self.pips
            .iter()
            .any(|pip| pip.iter().any(|s| matches!(s, ManaSymbol::X)))
    }
}
