//! Card types and the card/plaintext bijection used by the cipher.
//!
//! A card is a compact deck index. The cryptographic plaintext for index
//! `i` is `i + 2`: modular exponentiation fixes 0 and 1, so those values
//! must never appear in a deck.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of cards in a standard deck.
pub const STANDARD_DECK_SIZE: usize = 52;

/// Offset between a deck index and its cryptographic plaintext.
pub const PLAINTEXT_OFFSET: u8 = 2;

/// Card rank values (2-10, then Jack=11, Queen=12, King=13, Ace=14)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CardRank {
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Ten = 10,
    Jack = 11,
    Queen = 12,
    King = 13,
    Ace = 14,
}

impl CardRank {
    /// Convert from u8 to CardRank. Panics if value is outside 2..=14.
    pub fn from_u8(value: u8) -> Self {
        match value {
            2 => CardRank::Two,
            3 => CardRank::Three,
            4 => CardRank::Four,
            5 => CardRank::Five,
            6 => CardRank::Six,
            7 => CardRank::Seven,
            8 => CardRank::Eight,
            9 => CardRank::Nine,
            10 => CardRank::Ten,
            11 => CardRank::Jack,
            12 => CardRank::Queen,
            13 => CardRank::King,
            14 => CardRank::Ace,
            _ => panic!("Invalid card rank: {}", value),
        }
    }
}

/// Card suit values (0=Spades, 1=Hearts, 2=Diamonds, 3=Clubs)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardSuit {
    Spades = 0,
    Hearts = 1,
    Diamonds = 2,
    Clubs = 3,
}

impl CardSuit {
    /// Convert from u8 to CardSuit. Panics if value > 3.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => CardSuit::Spades,
            1 => CardSuit::Hearts,
            2 => CardSuit::Diamonds,
            3 => CardSuit::Clubs,
            _ => panic!("Invalid card suit: {}", value),
        }
    }
}

/// A playing card represented as a compact deck index.
///
/// Rank and suit only decode for a standard 52-card deck; larger decks
/// (e.g. double decks) still round-trip through the plaintext bijection but
/// render as bare indices.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Card(pub u8);

/// A revealed value that does not map back onto a deck index.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("value {0} does not decode to a card")]
pub struct CardDecodeError(pub BigUint);

impl Card {
    /// Create a card from rank and suit.
    pub fn new(rank: CardRank, suit: CardSuit) -> Self {
        Card((rank as u8 - 2) * 4 + suit as u8)
    }

    /// Get the rank of this card. Panics for indices past a standard deck.
    pub fn rank(self) -> CardRank {
        CardRank::from_u8(self.0 / 4 + 2)
    }

    /// Get the suit of this card. Panics for indices past a standard deck.
    pub fn suit(self) -> CardSuit {
        CardSuit::from_u8(self.0 % 4)
    }

    /// The cryptographic plaintext this card is dealt as.
    pub fn to_plaintext(self) -> BigUint {
        BigUint::from(self.0 as u64 + PLAINTEXT_OFFSET as u64)
    }

    /// Decode a fully revealed plaintext back to its card.
    pub fn from_plaintext(value: &BigUint) -> Result<Self, CardDecodeError> {
        let min = BigUint::from(PLAINTEXT_OFFSET);
        let max = BigUint::from(u8::MAX as u64 + PLAINTEXT_OFFSET as u64);
        if *value < min || *value > max {
            return Err(CardDecodeError(value.clone()));
        }
        let digits = value.to_u64_digits();
        // Bounds above guarantee a single digit.
        let index = digits.first().copied().unwrap_or(0) - PLAINTEXT_OFFSET as u64;
        Ok(Card(index as u8))
    }

    /// Get the rank as a string (2, 3, ..., T, J, Q, K, A)
    pub fn rank_str(self) -> &'static str {
        match self.rank() {
            CardRank::Two => "2",
            CardRank::Three => "3",
            CardRank::Four => "4",
            CardRank::Five => "5",
            CardRank::Six => "6",
            CardRank::Seven => "7",
            CardRank::Eight => "8",
            CardRank::Nine => "9",
            CardRank::Ten => "T",
            CardRank::Jack => "J",
            CardRank::Queen => "Q",
            CardRank::King => "K",
            CardRank::Ace => "A",
        }
    }

    /// Get the suit as a character (♠, ♥, ♦, ♣)
    pub fn suit_char(self) -> char {
        match self.suit() {
            CardSuit::Spades => '♠',
            CardSuit::Hearts => '♥',
            CardSuit::Diamonds => '♦',
            CardSuit::Clubs => '♣',
        }
    }

    /// Check if this is a red suit (hearts or diamonds)
    pub fn is_red(self) -> bool {
        self.0 < STANDARD_DECK_SIZE as u8
            && matches!(self.suit(), CardSuit::Hearts | CardSuit::Diamonds)
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if (self.0 as usize) < STANDARD_DECK_SIZE {
            write!(f, "{}{}", self.rank_str(), self.suit_char())
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_and_suit_decode() {
        // Index 0 is the two of spades, index 51 the ace of clubs.
        assert_eq!(Card(0).rank(), CardRank::Two);
        assert_eq!(Card(0).suit(), CardSuit::Spades);
        assert_eq!(Card(51).rank(), CardRank::Ace);
        assert_eq!(Card(51).suit(), CardSuit::Clubs);
        assert_eq!(Card::new(CardRank::Ace, CardSuit::Clubs), Card(51));
    }

    #[test]
    fn plaintext_round_trip() {
        for i in 0..STANDARD_DECK_SIZE as u8 {
            let card = Card(i);
            let back = Card::from_plaintext(&card.to_plaintext()).expect("valid plaintext");
            assert_eq!(card, back);
        }
    }

    #[test]
    fn plaintext_rejects_fixed_points_and_overflow() {
        assert!(Card::from_plaintext(&BigUint::from(0u32)).is_err());
        assert!(Card::from_plaintext(&BigUint::from(1u32)).is_err());
        assert!(Card::from_plaintext(&BigUint::from(2u32)).is_ok());
        assert!(Card::from_plaintext(&BigUint::from(258u32)).is_err());
    }

    #[test]
    fn display_matches_suit_cycle() {
        assert_eq!(Card(0).to_string(), "2♠");
        assert_eq!(Card(1).to_string(), "2♥");
        assert_eq!(Card(2).to_string(), "2♦");
        assert_eq!(Card(3).to_string(), "2♣");
        assert_eq!(Card(51).to_string(), "A♣");
        assert_eq!(Card(60).to_string(), "#60");
    }
}
