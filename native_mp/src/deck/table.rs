//! Deck orchestration: joint shuffling and per-card reveal fan-out.

use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};
use thiserror::Error;

use mp_shared::PlayerId;

use super::player::{LocalPlayer, Player, PlayerError};

/// Errors raised by deck orchestration.
#[derive(Debug, Error)]
pub enum DeckError {
    /// Every card has been drawn.
    #[error("cannot draw from an empty deck")]
    EmptyDeck,
    /// A stage pass failed; the deck is invalid until the next reset.
    #[error("shuffle failed at participant {player}")]
    ShuffleFailed {
        player: PlayerId,
        #[source]
        source: PlayerError,
    },
    /// A participant holds no key for a card it was asked to reveal.
    #[error("participant {player} holds no key for the requested card")]
    RevealFailed { player: PlayerId },
    /// A participant errored (for example refused) during reveal fan-out.
    #[error("participant {player} rejected the reveal request")]
    RevealRejected {
        player: PlayerId,
        #[source]
        source: PlayerError,
    },
    /// The requested recipient is not seated at this table.
    #[error("no participant with id {0} at this table")]
    UnknownPlayer(PlayerId),
}

/// A drawn card: the deck ciphertext identifying it, and its value with
/// every layer but the recipient's stripped.
#[derive(Clone, Debug)]
pub struct DrawnCard {
    pub original: BigUint,
    pub mostly_decrypted: BigUint,
}

/// The jointly shuffled deck and the participants seated around it.
///
/// The deck holds plaintexts `2..=count+1` before a shuffle and layered
/// ciphertexts afterwards; the top of the deck is the tail of the sequence.
pub struct Deck<P: Player> {
    players: Vec<P>,
    count: usize,
    cards: Vec<BigUint>,
}

impl<P: Player> Deck<P> {
    /// Create a deck of `count` cards for the given participants. The deck
    /// is unusable until the first [`Deck::reset_and_shuffle`].
    pub fn new(players: Vec<P>, count: usize) -> Self {
        Deck {
            players,
            count,
            cards: Vec::new(),
        }
    }

    /// Rebuild the plaintext deck and run the three shuffle stages across
    /// every participant in seating order. A failure aborts immediately and
    /// leaves the deck invalid until the next reset.
    pub fn reset_and_shuffle(&mut self) -> Result<(), DeckError> {
        self.cards = (0..self.count)
            .map(|i| BigUint::from(i as u64 + 2))
            .collect();
        for player in &mut self.players {
            let id = player.id();
            player
                .shuffle_stage1(&mut self.cards)
                .map_err(|source| DeckError::ShuffleFailed { player: id, source })?;
        }
        for player in &mut self.players {
            let id = player.id();
            player
                .shuffle_stage2(&mut self.cards)
                .map_err(|source| DeckError::ShuffleFailed { player: id, source })?;
        }
        for player in &mut self.players {
            let id = player.id();
            player
                .shuffle_complete(&self.cards)
                .map_err(|source| DeckError::ShuffleFailed { player: id, source })?;
        }
        tracing::info!(
            players = self.players.len(),
            cards = self.count,
            "deck reset and jointly shuffled"
        );
        Ok(())
    }

    /// Pop the top ciphertext and reveal it for `recipient`: every other
    /// participant strips its layer, the recipient's layer stays on. The
    /// recipient applies its own final decryption privately.
    pub fn draw_card(&mut self, recipient: PlayerId) -> Result<DrawnCard, DeckError> {
        let original = self.cards.pop().ok_or(DeckError::EmptyDeck)?;
        let mostly_decrypted = self.mostly_reveal_card(&original, Some(recipient))?;
        Ok(DrawnCard {
            original,
            mostly_decrypted,
        })
    }

    /// Strip every participant's layer from `original` except `except`'s.
    /// With no matching `except` the result is fully decrypted.
    pub fn mostly_reveal_card(
        &self,
        original: &BigUint,
        except: Option<PlayerId>,
    ) -> Result<BigUint, DeckError> {
        let mut value = original.clone();
        for player in &self.players {
            if Some(player.id()) == except {
                continue;
            }
            match player.decrypt_card(original, &value) {
                Ok(Some(v)) => value = v,
                Ok(None) => {
                    return Err(DeckError::RevealFailed {
                        player: player.id(),
                    })
                }
                Err(source) => {
                    return Err(DeckError::RevealRejected {
                        player: player.id(),
                        source,
                    })
                }
            }
        }
        Ok(value)
    }

    /// Fully decrypt the remaining deck, preserving order.
    pub fn reveal_cards(&self) -> Result<Vec<BigUint>, DeckError> {
        self.cards
            .iter()
            .map(|card| self.mostly_reveal_card(card, None))
            .collect()
    }

    /// Number of cards left in the deck.
    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    /// The seated participants, in iteration order.
    pub fn players(&self) -> &[P] {
        &self.players
    }

    /// Mutable access to one participant by id.
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut P> {
        self.players.iter_mut().find(|p| p.id() == id)
    }
}

impl<R> Deck<LocalPlayer<R>>
where
    R: RngCore + CryptoRng,
{
    /// Draw the top card for `recipient` and land it in their hand,
    /// returning the recovered plaintext.
    pub fn deal_to(&mut self, recipient: PlayerId) -> Result<BigUint, DeckError> {
        if self.player_mut(recipient).is_none() {
            return Err(DeckError::UnknownPlayer(recipient));
        }
        let drawn = self.draw_card(recipient)?;
        let player = self
            .player_mut(recipient)
            .ok_or(DeckError::UnknownPlayer(recipient))?;
        player
            .receive_card(drawn.original, drawn.mostly_decrypted)
            .map_err(|source| match source {
                PlayerError::MissingKey => DeckError::RevealFailed { player: recipient },
                source => DeckError::RevealRejected {
                    player: recipient,
                    source,
                },
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::DecryptPolicy;
    use crate::sra;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn seeded_table(seed: u64, players: usize, count: usize) -> Deck<LocalPlayer<ChaCha20Rng>> {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let prime = sra::generate_prime(&mut rng, 64).expect("prime");
        let seats = (0..players)
            .map(|i| {
                let rng = ChaCha20Rng::seed_from_u64(seed.wrapping_add(i as u64 + 1));
                LocalPlayer::with_rng(rng, prime.clone(), 16)
            })
            .collect();
        Deck::new(seats, count)
    }

    #[test]
    fn drawing_past_the_end_is_an_error() {
        let mut deck = seeded_table(10, 2, 2);
        deck.reset_and_shuffle().expect("shuffle");
        let ids: Vec<PlayerId> = deck.players().iter().map(|p| p.id()).collect();
        deck.deal_to(ids[0]).expect("first draw");
        deck.deal_to(ids[1]).expect("second draw");
        assert!(matches!(deck.deal_to(ids[0]), Err(DeckError::EmptyDeck)));
    }

    #[test]
    fn fabricated_ciphertext_fails_the_reveal() {
        let mut deck = seeded_table(11, 2, 4);
        deck.reset_and_shuffle().expect("shuffle");
        let bogus = BigUint::from(123_456_789u64);
        let err = deck.mostly_reveal_card(&bogus, None).unwrap_err();
        assert!(matches!(err, DeckError::RevealFailed { .. }));
    }

    #[test]
    fn dealing_to_a_stranger_is_rejected() {
        let mut deck = seeded_table(12, 2, 4);
        deck.reset_and_shuffle().expect("shuffle");
        let before = deck.remaining();
        let err = deck.deal_to(PlayerId::random()).unwrap_err();
        assert!(matches!(err, DeckError::UnknownPlayer(_)));
        // The deck is untouched by the rejected request.
        assert_eq!(deck.remaining(), before);
    }

    #[test]
    fn refusing_participant_surfaces_in_fan_out() {
        struct DenyAll;
        impl DecryptPolicy for DenyAll {
            fn allow_decrypt(&self, _original: &BigUint) -> bool {
                false
            }
        }

        let mut rng = ChaCha20Rng::seed_from_u64(13);
        let prime = sra::generate_prime(&mut rng, 64).expect("prime");
        let open = LocalPlayer::with_rng(
            ChaCha20Rng::seed_from_u64(14),
            prime.clone(),
            16,
        );
        let refusing =
            LocalPlayer::with_rng(ChaCha20Rng::seed_from_u64(15), prime, 16).with_policy(DenyAll);
        let open_id = open.id();
        let refusing_id = refusing.id();
        let mut deck = Deck::new(vec![open, refusing], 4);
        deck.reset_and_shuffle().expect("shuffle");

        // Drawing for the open player needs the refusing player's layer off.
        let err = deck.draw_card(open_id).unwrap_err();
        match err {
            DeckError::RevealRejected { player, source } => {
                assert_eq!(player, refusing_id);
                assert!(matches!(source, PlayerError::AuthorizationDenied));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn boxed_players_share_a_table() {
        // Heterogeneous seating works through the trait object impl.
        let mut rng = ChaCha20Rng::seed_from_u64(16);
        let prime = sra::generate_prime(&mut rng, 64).expect("prime");
        let seats: Vec<Box<dyn Player>> = (0..2)
            .map(|i| {
                let rng = ChaCha20Rng::seed_from_u64(17 + i);
                Box::new(LocalPlayer::with_rng(rng, prime.clone(), 16)) as Box<dyn Player>
            })
            .collect();
        let mut deck = Deck::new(seats, 4);
        deck.reset_and_shuffle().expect("shuffle");
        let revealed = deck.reveal_cards().expect("reveal");
        let mut values: Vec<u64> = revealed
            .iter()
            .map(|v| v.to_u64_digits().first().copied().unwrap_or(0))
            .collect();
        values.sort_unstable();
        assert_eq!(values, vec![2, 3, 4, 5]);
    }
}
