//! Terminal rendering for cards and hands.

use mp_shared::Card;
use owo_colors::OwoColorize;

/// Render one card like "A♠", with red suits colored.
pub fn card_label(card: Card) -> String {
    if card.is_red() {
        card.red().to_string()
    } else {
        card.to_string()
    }
}

/// Render a sequence of cards space-separated.
pub fn cards_line(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|c| card_label(*c))
        .collect::<Vec<_>>()
        .join(" ")
}
