//! Participant state machine: per-shuffle keys, the key index and the hand.

use std::collections::HashMap;
use std::mem;

use num_bigint::BigUint;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::{CryptoRng, RngCore};
use thiserror::Error;

use mp_shared::PlayerId;

use crate::sra::{KeyPair, SraError};

/// Errors raised by participant stage and decrypt operations.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// A stage operation arrived while the participant was in the wrong state.
    #[error("{op} invoked out of order (participant state: {state})")]
    OutOfOrder {
        op: &'static str,
        state: &'static str,
    },
    /// The presented deck does not match the held stage-2 key list.
    #[error("deck holds {actual} cards but {expected} stage-2 keys are stored")]
    LengthMismatch { expected: usize, actual: usize },
    /// A drawn card's final layer cannot be stripped: no key is held for it.
    #[error("no decryption key held for the drawn card")]
    MissingKey,
    /// The participant's policy refused the decrypt request.
    #[error("decrypt request refused by participant policy")]
    AuthorizationDenied,
    #[error(transparent)]
    KeyGen(#[from] SraError),
}

/// A table participant.
///
/// Implemented by [`LocalPlayer`] here; a remote proxy speaking the same
/// contract over some transport works identically, which is why the deck
/// only ever sees this trait.
pub trait Player {
    /// Unique identifier of this participant.
    fn id(&self) -> PlayerId;

    /// Encrypt every card under a fresh whole-deck key, then shuffle.
    fn shuffle_stage1(&mut self, cards: &mut [BigUint]) -> Result<(), PlayerError>;

    /// Swap the whole-deck layer for one fresh key per card, preserving
    /// positions.
    fn shuffle_stage2(&mut self, cards: &mut [BigUint]) -> Result<(), PlayerError>;

    /// Learn the final deck and index the per-card keys by its ciphertexts.
    fn shuffle_complete(&mut self, cards: &[BigUint]) -> Result<(), PlayerError>;

    /// Strip this participant's layer from `value`, where `original` is the
    /// fully-encrypted ciphertext identifying the card. `Ok(None)` means no
    /// key is held for that ciphertext.
    fn decrypt_card(
        &self,
        original: &BigUint,
        value: &BigUint,
    ) -> Result<Option<BigUint>, PlayerError>;
}

impl<P: Player + ?Sized> Player for Box<P> {
    fn id(&self) -> PlayerId {
        (**self).id()
    }

    fn shuffle_stage1(&mut self, cards: &mut [BigUint]) -> Result<(), PlayerError> {
        (**self).shuffle_stage1(cards)
    }

    fn shuffle_stage2(&mut self, cards: &mut [BigUint]) -> Result<(), PlayerError> {
        (**self).shuffle_stage2(cards)
    }

    fn shuffle_complete(&mut self, cards: &[BigUint]) -> Result<(), PlayerError> {
        (**self).shuffle_complete(cards)
    }

    fn decrypt_card(
        &self,
        original: &BigUint,
        value: &BigUint,
    ) -> Result<Option<BigUint>, PlayerError> {
        (**self).decrypt_card(original, value)
    }
}

/// Decides whether a decrypt request for a card should be honoured.
///
/// The table consults the holder of a card's key on every reveal; a real
/// deployment would check the game rules (whose turn it is, which cards are
/// in play) here.
pub trait DecryptPolicy: Send + Sync {
    fn allow_decrypt(&self, original: &BigUint) -> bool;
}

/// Policy that honours every request.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl DecryptPolicy for AllowAll {
    fn allow_decrypt(&self, _original: &BigUint) -> bool {
        true
    }
}

/// The per-shuffle key material, one variant per protocol state.
enum ShuffleState {
    /// No shuffle in progress and no keys held.
    Idle,
    /// Stage 1 done: the whole-deck key awaits stage 2.
    Stage1Done { deck_key: KeyPair },
    /// Stage 2 done: per-card keys in deck order await the final deck.
    Stage2Done { card_keys: Vec<KeyPair> },
    /// Shuffle complete: per-card keys indexed by final ciphertext.
    Ready { key_index: HashMap<BigUint, KeyPair> },
}

impl ShuffleState {
    fn name(&self) -> &'static str {
        match self {
            ShuffleState::Idle => "idle",
            ShuffleState::Stage1Done { .. } => "stage-1 done",
            ShuffleState::Stage2Done { .. } => "stage-2 done",
            ShuffleState::Ready { .. } => "ready",
        }
    }
}

/// A card in a participant's hand: the deck ciphertext it was drawn as and
/// the plaintext recovered from it.
#[derive(Clone, Debug)]
pub struct HeldCard {
    pub original: BigUint,
    pub plaintext: BigUint,
}

/// A participant running in this process, owning its keys and hand.
pub struct LocalPlayer<R = OsRng>
where
    R: RngCore + CryptoRng,
{
    id: PlayerId,
    prime: BigUint,
    key_bits: u64,
    rng: R,
    state: ShuffleState,
    hand: Vec<HeldCard>,
    policy: Box<dyn DecryptPolicy>,
}

impl LocalPlayer {
    /// Create a participant drawing entropy from the operating system.
    pub fn new(prime: BigUint, key_bits: u64) -> Self {
        Self::with_rng(OsRng, prime, key_bits)
    }
}

impl<R> LocalPlayer<R>
where
    R: RngCore + CryptoRng,
{
    /// Create a participant with an explicit entropy source.
    pub fn with_rng(rng: R, prime: BigUint, key_bits: u64) -> Self {
        LocalPlayer {
            id: PlayerId::random(),
            prime,
            key_bits,
            rng,
            state: ShuffleState::Idle,
            hand: Vec::new(),
            policy: Box::new(AllowAll),
        }
    }

    /// Replace the decrypt-authorisation policy.
    pub fn with_policy(mut self, policy: impl DecryptPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Cards currently held by this participant.
    pub fn hand(&self) -> &[HeldCard] {
        &self.hand
    }

    /// Privately strip the last encryption layer from a drawn card, add it
    /// to the hand and return the recovered plaintext.
    pub fn receive_card(
        &mut self,
        original: BigUint,
        mostly_decrypted: BigUint,
    ) -> Result<BigUint, PlayerError> {
        let key = self.card_key(&original).ok_or(PlayerError::MissingKey)?;
        let plaintext = key.decrypt(&mostly_decrypted);
        tracing::debug!(player = %self.id, "drawn card decrypted into hand");
        self.hand.push(HeldCard {
            original,
            plaintext: plaintext.clone(),
        });
        Ok(plaintext)
    }

    fn card_key(&self, original: &BigUint) -> Option<&KeyPair> {
        match &self.state {
            ShuffleState::Ready { key_index } => key_index.get(original),
            _ => None,
        }
    }
}

impl<R> Player for LocalPlayer<R>
where
    R: RngCore + CryptoRng,
{
    fn id(&self) -> PlayerId {
        self.id
    }

    fn shuffle_stage1(&mut self, cards: &mut [BigUint]) -> Result<(), PlayerError> {
        match &self.state {
            ShuffleState::Idle | ShuffleState::Ready { .. } => {}
            other => {
                return Err(PlayerError::OutOfOrder {
                    op: "stage-1 shuffle",
                    state: other.name(),
                })
            }
        }
        // A fresh shuffle invalidates whatever the previous one produced.
        self.state = ShuffleState::Idle;
        self.hand.clear();

        let deck_key = KeyPair::generate(&mut self.rng, &self.prime, self.key_bits)?;
        for card in cards.iter_mut() {
            *card = deck_key.encrypt(card);
        }
        cards.shuffle(&mut self.rng);
        self.state = ShuffleState::Stage1Done { deck_key };
        tracing::debug!(player = %self.id, cards = cards.len(), "stage-1 encrypt-and-shuffle done");
        Ok(())
    }

    fn shuffle_stage2(&mut self, cards: &mut [BigUint]) -> Result<(), PlayerError> {
        let deck_key = match mem::replace(&mut self.state, ShuffleState::Idle) {
            ShuffleState::Stage1Done { deck_key } => deck_key,
            other => {
                let err = PlayerError::OutOfOrder {
                    op: "stage-2 shuffle",
                    state: other.name(),
                };
                self.state = other;
                return Err(err);
            }
        };
        // On a key-generation failure the state stays Idle: the shuffle is
        // aborted and only a fresh stage 1 can restart it.
        let mut card_keys = Vec::with_capacity(cards.len());
        for card in cards.iter_mut() {
            let key = KeyPair::generate(&mut self.rng, &self.prime, self.key_bits)?;
            *card = key.encrypt(&deck_key.decrypt(card));
            card_keys.push(key);
        }
        self.state = ShuffleState::Stage2Done { card_keys };
        tracing::debug!(player = %self.id, cards = cards.len(), "stage-2 per-card re-encryption done");
        Ok(())
    }

    fn shuffle_complete(&mut self, cards: &[BigUint]) -> Result<(), PlayerError> {
        let card_keys = match mem::replace(&mut self.state, ShuffleState::Idle) {
            ShuffleState::Stage2Done { card_keys } => card_keys,
            other => {
                let err = PlayerError::OutOfOrder {
                    op: "shuffle completion",
                    state: other.name(),
                };
                self.state = other;
                return Err(err);
            }
        };
        if card_keys.len() != cards.len() {
            let expected = card_keys.len();
            self.state = ShuffleState::Stage2Done { card_keys };
            return Err(PlayerError::LengthMismatch {
                expected,
                actual: cards.len(),
            });
        }
        let key_index: HashMap<BigUint, KeyPair> =
            cards.iter().cloned().zip(card_keys).collect();
        self.state = ShuffleState::Ready { key_index };
        tracing::debug!(player = %self.id, "per-card keys indexed, participant ready");
        Ok(())
    }

    fn decrypt_card(
        &self,
        original: &BigUint,
        value: &BigUint,
    ) -> Result<Option<BigUint>, PlayerError> {
        let Some(key) = self.card_key(original) else {
            return Ok(None);
        };
        if !self.policy.allow_decrypt(original) {
            return Err(PlayerError::AuthorizationDenied);
        }
        Ok(Some(key.decrypt(value)))
    }
}
