//! Calls and auction bookkeeping
//!
//! Auction positions are relative: the call at index `i` was made by the
//! player `len - i` seats before whoever is about to call. Partnership
//! relationships only need the parity of that distance, so the dealer is not
//! required to interpret an auction.

use crate::error::{EngineError, EngineResult};
use crate::hand::Suit;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Strain {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
    NoTrump,
}

impl Strain {
    pub const ALL: [Strain; 5] = [
        Strain::Clubs,
        Strain::Diamonds,
        Strain::Hearts,
        Strain::Spades,
        Strain::NoTrump,
    ];

    pub fn suit(self) -> Option<Suit> {
        match self {
            Strain::Clubs => Some(Suit::Clubs),
            Strain::Diamonds => Some(Suit::Diamonds),
            Strain::Hearts => Some(Suit::Hearts),
            Strain::Spades => Some(Suit::Spades),
            Strain::NoTrump => None,
        }
    }

    fn index(self) -> u8 {
        match self {
            Strain::Clubs => 0,
            Strain::Diamonds => 1,
            Strain::Hearts => 2,
            Strain::Spades => 3,
            Strain::NoTrump => 4,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Strain::Clubs => "C",
            Strain::Diamonds => "D",
            Strain::Hearts => "H",
            Strain::Spades => "S",
            Strain::NoTrump => "N",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Call {
    Pass,
    Double,
    Redouble,
    Bid { level: u8, strain: Strain },
}

impl Call {
    /// Position of a bid in the bidding ladder (1C = 0 ... 7N = 34).
    pub fn bid_rank(self) -> Option<u8> {
        match self {
            Call::Bid { level, strain } => Some((level - 1) * 5 + strain.index()),
            _ => None,
        }
    }

    pub fn is_bid(self) -> bool {
        matches!(self, Call::Bid { .. })
    }

    /// Every bid ranked strictly above `rank` (or all 35 bids when `None`).
    pub fn bids_above(rank: Option<u8>) -> impl Iterator<Item = Call> {
        (1..=7u8)
            .flat_map(|level| Strain::ALL.map(|strain| Call::Bid { level, strain }))
            .filter(move |call| match (rank, call.bid_rank()) {
                (Some(floor), Some(r)) => r > floor,
                _ => true,
            })
    }
}

impl FromStr for Call {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        let token = s.trim().to_ascii_uppercase();
        match token.as_str() {
            "P" | "PASS" => return Ok(Call::Pass),
            "X" | "D" | "DBL" => return Ok(Call::Double),
            "XX" | "R" | "RDBL" => return Ok(Call::Redouble),
            _ => {}
        }

        let mut chars = token.chars();
        let level = chars
            .next()
            .and_then(|c| c.to_digit(10))
            .and_then(|d| u8::try_from(d).ok())
            .filter(|d| (1..=7).contains(d))
            .ok_or_else(|| EngineError::InvalidCall(s.to_string()))?;
        let strain = match chars.as_str() {
            "C" => Strain::Clubs,
            "D" => Strain::Diamonds,
            "H" => Strain::Hearts,
            "S" => Strain::Spades,
            "N" | "NT" => Strain::NoTrump,
            _ => return Err(EngineError::InvalidCall(s.to_string())),
        };
        Ok(Call::Bid { level, strain })
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Call::Pass => write!(f, "PASS"),
            Call::Double => write!(f, "X"),
            Call::Redouble => write!(f, "XX"),
            Call::Bid { level, strain } => write!(f, "{}{}", level, strain.symbol()),
        }
    }
}

/// A validated sequence of calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Auction {
    calls: Vec<Call>,
}

impl Auction {
    /// Parse call tokens and check each call was legal when it was made.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> EngineResult<Self> {
        let mut auction = Auction::default();
        for token in tokens {
            let call: Call = token.as_ref().parse()?;
            if auction.is_ended() || !auction.legal_calls().contains(&call) {
                return Err(EngineError::InvalidCall(token.as_ref().to_string()));
            }
            auction.calls.push(call);
        }
        Ok(auction)
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Four passes to open, or three passes following any other call.
    pub fn is_ended(&self) -> bool {
        let n = self.calls.len();
        if n < 4 {
            return false;
        }
        self.calls[n - 3..].iter().all(|c| *c == Call::Pass)
    }

    /// Index and value of the most recent bid.
    pub fn last_bid(&self) -> Option<(usize, Call)> {
        self.calls
            .iter()
            .enumerate()
            .rev()
            .find(|(_, c)| c.is_bid())
            .map(|(i, c)| (i, *c))
    }

    /// Whether the call at `index` was made by the side about to call.
    pub fn is_ours(&self, index: usize) -> bool {
        (self.calls.len() - index) % 2 == 0
    }

    /// Bids made by the next caller's partner, most recent first.
    pub fn partner_bids(&self) -> impl Iterator<Item = Call> + '_ {
        let n = self.calls.len();
        self.calls
            .iter()
            .enumerate()
            .rev()
            .filter(move |(i, c)| (n - i) % 4 == 2 && c.is_bid())
            .map(|(_, c)| *c)
    }

    /// Whether the next caller's partner has made any call yet.
    pub fn partner_has_called(&self) -> bool {
        self.calls.len() >= 2
    }

    pub fn opponents_have_bid(&self) -> bool {
        let n = self.calls.len();
        self.calls
            .iter()
            .enumerate()
            .any(|(i, c)| (n - i) % 2 == 1 && c.is_bid())
    }

    /// Calls available to the next player.
    pub fn legal_calls(&self) -> Vec<Call> {
        if self.is_ended() {
            return Vec::new();
        }

        let mut calls = vec![Call::Pass];
        let last_non_pass = self
            .calls
            .iter()
            .enumerate()
            .rev()
            .find(|(_, c)| **c != Call::Pass);

        if let Some((idx, call)) = last_non_pass {
            if !self.is_ours(idx) {
                match call {
                    Call::Bid { .. } => calls.push(Call::Double),
                    Call::Double => calls.push(Call::Redouble),
                    _ => {}
                }
            }
        }

        let floor = self.last_bid().and_then(|(_, c)| c.bid_rank());
        calls.extend(Call::bids_above(floor));
        calls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auction(tokens: &[&str]) -> Auction {
        Auction::parse(tokens).unwrap()
    }

    #[test]
    fn test_parse_call_tokens() {
        assert_eq!("pass".parse::<Call>().unwrap(), Call::Pass);
        assert_eq!("X".parse::<Call>().unwrap(), Call::Double);
        assert_eq!("xx".parse::<Call>().unwrap(), Call::Redouble);
        assert_eq!(
            "3nt".parse::<Call>().unwrap(),
            Call::Bid { level: 3, strain: Strain::NoTrump }
        );
        assert!("8C".parse::<Call>().is_err());
        assert!("1Z".parse::<Call>().is_err());
        assert!("".parse::<Call>().is_err());
    }

    #[test]
    fn test_render_round_trips_through_display() {
        for token in ["PASS", "X", "XX", "1C", "4S", "7N"] {
            assert_eq!(token.parse::<Call>().unwrap().to_string(), token);
        }
    }

    #[test]
    fn test_insufficient_bid_rejected() {
        let err = Auction::parse(&["1S", "1H"]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidCall(t) if t == "1H"));
    }

    #[test]
    fn test_double_own_side_rejected() {
        assert!(Auction::parse(&["1S", "P", "X"]).is_err());
        assert!(Auction::parse(&["1S", "X"]).is_ok());
        assert!(Auction::parse(&["1S", "X", "XX"]).is_ok());
        assert!(Auction::parse(&["1S", "X", "P", "XX"]).is_err());
    }

    #[test]
    fn test_passout_detection() {
        assert!(!auction(&["P", "P", "P"]).is_ended());
        assert!(auction(&["P", "P", "P", "P"]).is_ended());
        assert!(auction(&["1D", "P", "P", "P"]).is_ended());
        assert!(!auction(&["1D", "P", "P"]).is_ended());
        assert!(Auction::parse(&["P", "P", "P", "P", "1C"]).is_err());
    }

    #[test]
    fn test_legal_calls_after_overcall() {
        let a = auction(&["1D", "3S"]);
        let calls = a.legal_calls();
        assert_eq!(calls[0], Call::Pass);
        assert!(calls.contains(&Call::Double));
        assert!(!calls.contains(&Call::Redouble));
        assert_eq!(calls[2], Call::Bid { level: 3, strain: Strain::NoTrump });
    }

    #[test]
    fn test_partner_relationships() {
        let a = auction(&["1D", "3S"]);
        let partner: Vec<Call> = a.partner_bids().collect();
        assert_eq!(partner, vec![Call::Bid { level: 1, strain: Strain::Diamonds }]);
        assert!(a.opponents_have_bid());
        assert!(a.partner_has_called());

        let opening = Auction::default();
        assert_eq!(opening.partner_bids().count(), 0);
        assert!(!opening.opponents_have_bid());
        assert_eq!(opening.legal_calls().len(), 36);
    }
}
