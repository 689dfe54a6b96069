use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    /// Order in which holdings appear in the dotted hand notation.
    pub const DISPLAY_ORDER: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];

    pub fn is_major(self) -> bool {
        matches!(self, Suit::Spades | Suit::Hearts)
    }

    fn slot(self) -> usize {
        match self {
            Suit::Spades => 0,
            Suit::Hearts => 1,
            Suit::Diamonds => 2,
            Suit::Clubs => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Suit::Spades => "spades",
            Suit::Hearts => "hearts",
            Suit::Diamonds => "diamonds",
            Suit::Clubs => "clubs",
        }
    }
}

/// One player's thirteen cards, stored as a rank bitmask per suit.
///
/// Bit `r` of a holding is set when rank `r` (2 through 14, ace high) is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hand {
    holdings: [u16; 4],
}

const RANK_SYMBOLS: &str = "23456789TJQKA";

fn rank_value(symbol: char) -> Option<u8> {
    RANK_SYMBOLS
        .find(symbol.to_ascii_uppercase())
        .and_then(|idx| u8::try_from(idx + 2).ok())
}

impl Hand {
    pub fn length(&self, suit: Suit) -> u8 {
        // at most 13 bits are ever set
        self.holdings[suit.slot()].count_ones() as u8
    }

    pub fn holds(&self, suit: Suit, rank: u8) -> bool {
        rank <= 14 && self.holdings[suit.slot()] & (1 << rank) != 0
    }

    pub fn hcp(&self) -> u8 {
        Suit::DISPLAY_ORDER
            .iter()
            .map(|&suit| {
                let h = self.holdings[suit.slot()];
                (11..=14u8)
                    .filter(|&r| h & (1 << r) != 0)
                    .map(|r| r - 10)
                    .sum::<u8>()
            })
            .sum()
    }

    /// High-card points plus one point per card beyond four in any suit.
    pub fn points(&self) -> u8 {
        let length_pts: u8 = Suit::DISPLAY_ORDER
            .iter()
            .map(|&s| self.length(s).saturating_sub(4))
            .sum();
        self.hcp() + length_pts
    }

    pub fn distribution(&self) -> [u8; 4] {
        Suit::DISPLAY_ORDER.map(|s| self.length(s))
    }

    /// No void, no singleton, at most one doubleton.
    pub fn is_balanced(&self) -> bool {
        let dist = self.distribution();
        let doubletons = dist.iter().filter(|&&l| l == 2).count();
        dist.iter().all(|&l| l >= 2) && doubletons <= 1
    }

    /// Longest suit, preferring the higher-ranking suit on ties.
    pub fn longest_suit(&self) -> Suit {
        Suit::DISPLAY_ORDER
            .iter()
            .copied()
            .max_by_key(|&s| (self.length(s), s))
            .unwrap_or(Suit::Spades)
    }
}

impl FromStr for Hand {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        let normalized = s.trim().replace("10", "T");
        let parts: Vec<&str> = normalized.split('.').collect();
        if parts.len() != 4 {
            return Err(EngineError::invalid_hand(
                s,
                format!("expected 4 dot-separated suits, found {}", parts.len()),
            ));
        }

        let mut holdings = [0u16; 4];
        for (suit, part) in Suit::DISPLAY_ORDER.iter().zip(parts) {
            for symbol in part.chars().filter(|c| !c.is_whitespace()) {
                let rank = rank_value(symbol).ok_or_else(|| {
                    EngineError::invalid_hand(s, format!("unknown rank '{symbol}'"))
                })?;
                let bit = 1u16 << rank;
                let holding = &mut holdings[suit.slot()];
                if *holding & bit != 0 {
                    return Err(EngineError::invalid_hand(
                        s,
                        format!("duplicate card '{symbol}' in {}", suit.name()),
                    ));
                }
                *holding |= bit;
            }
        }

        let hand = Hand { holdings };
        let total: u8 = hand.distribution().iter().sum();
        if total != 13 {
            return Err(EngineError::invalid_hand(
                s,
                format!("expected 13 cards, found {total}"),
            ));
        }
        Ok(hand)
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbols: Vec<char> = RANK_SYMBOLS.chars().collect();
        let rendered: Vec<String> = Suit::DISPLAY_ORDER
            .iter()
            .map(|&suit| {
                (2..=14u8)
                    .rev()
                    .filter(|&r| self.holds(suit, r))
                    .map(|r| symbols[usize::from(r - 2)])
                    .collect()
            })
            .collect();
        write!(f, "{}", rendered.join("."))
    }
}
