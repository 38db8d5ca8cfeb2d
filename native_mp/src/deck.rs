//! Three-stage shuffle-and-deal protocol over the commutative cipher.
//!
//! Stage 1 has every participant encrypt the whole deck under a single key
//! and shuffle it. Stage 2 swaps that whole-deck layer for one fresh key per
//! card, preserving order. Completion hands everyone the final deck so each
//! participant can index its per-card keys by the fully-encrypted
//! ciphertexts. From then on any single card can be revealed to a chosen
//! recipient without touching the rest of the deck.

mod player;
mod table;

pub use player::{AllowAll, DecryptPolicy, HeldCard, LocalPlayer, Player, PlayerError};
pub use table::{Deck, DeckError, DrawnCard};
