//! Headless demo table: jointly shuffle a deck and deal hands between local
//! participants.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use num_bigint::BigUint;
use rand::rngs::OsRng;

use mp_shared::{Card, PlayerId};
use native_mp::config::Config;
use native_mp::deck::{Deck, LocalPlayer, Player};
use native_mp::pretty;
use native_mp::sra;

#[derive(Parser, Debug)]
#[command(name = "mp-cli", version, about = "Demo table for the mental poker core", long_about = None)]
struct Cli {
    /// Optional TOML config file; created with defaults when missing
    #[arg(long)]
    config: Option<PathBuf>,

    /// Width of the shared prime modulus in bits
    #[arg(long)]
    prime_bits: Option<u64>,

    /// Width of each participant's exponents in bits
    #[arg(long)]
    key_bits: Option<u64>,

    /// Number of cards in the deck
    #[arg(long)]
    deck_size: Option<usize>,

    /// Verbose logging
    #[arg(long, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Jointly shuffle the deck, then reveal every card in deck order
    Shuffle {
        /// Number of participants at the table
        #[arg(long, default_value_t = 3)]
        players: usize,
    },
    /// Jointly shuffle, then deal hands round-robin
    Deal {
        /// Number of participants at the table
        #[arg(long, default_value_t = 3)]
        players: usize,
        /// Cards dealt to each participant
        #[arg(long, default_value_t = 5)]
        cards_each: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = if cli.debug {
        "debug".to_string()
    } else {
        "native_mp=info,warn".to_string()
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(cli.debug)
        .init();

    let mut cfg = match &cli.config {
        Some(path) => Config::load_or_create(path)
            .with_context(|| format!("loading or creating config '{}'", path.display()))?,
        None => Config::default(),
    };
    if let Some(bits) = cli.prime_bits {
        cfg.prime_bits = bits;
    }
    if let Some(bits) = cli.key_bits {
        cfg.key_bits = bits;
    }
    if let Some(size) = cli.deck_size {
        cfg.deck_size = size;
    }
    cfg.validate()?;

    match cli.command {
        Commands::Shuffle { players } => run_shuffle(&cfg, players),
        Commands::Deal {
            players,
            cards_each,
        } => run_deal(&cfg, players, cards_each),
    }
}

/// Seat `players` participants around a freshly shuffled deck.
fn shuffled_table(cfg: &Config, players: usize) -> Result<Deck<LocalPlayer>> {
    anyhow::ensure!(players >= 2, "a table needs at least 2 participants");
    tracing::info!(bits = cfg.prime_bits, "generating shared prime");
    let prime = sra::generate_prime(&mut OsRng, cfg.prime_bits)?;
    let seats = (0..players)
        .map(|_| LocalPlayer::new(prime.clone(), cfg.key_bits))
        .collect();
    let mut deck = Deck::new(seats, cfg.deck_size);
    deck.reset_and_shuffle().context("joint shuffle failed")?;
    Ok(deck)
}

fn run_shuffle(cfg: &Config, players: usize) -> Result<()> {
    let deck = shuffled_table(cfg, players)?;
    let revealed = deck.reveal_cards().context("revealing the deck")?;
    let cards = decode_cards(&revealed)?;
    println!("Shuffled deck ({} cards):", cards.len());
    println!("  {}", pretty::cards_line(&cards));
    Ok(())
}

fn run_deal(cfg: &Config, players: usize, cards_each: usize) -> Result<()> {
    anyhow::ensure!(
        players * cards_each <= cfg.deck_size,
        "cannot deal {} cards each to {} participants from a {}-card deck",
        cards_each,
        players,
        cfg.deck_size
    );
    let mut deck = shuffled_table(cfg, players)?;
    let ids: Vec<PlayerId> = deck.players().iter().map(|p| p.id()).collect();

    for _ in 0..cards_each {
        for &id in &ids {
            deck.deal_to(id)
                .with_context(|| format!("dealing to participant {id}"))?;
        }
    }

    for (seat, id) in ids.iter().enumerate() {
        let player = deck
            .player_mut(*id)
            .context("participant disappeared from the table")?;
        let plaintexts: Vec<BigUint> =
            player.hand().iter().map(|c| c.plaintext.clone()).collect();
        let cards = decode_cards(&plaintexts)?;
        println!("Seat {seat} ({id}):");
        println!("  {}", pretty::cards_line(&cards));
    }

    let revealed = deck.reveal_cards().context("revealing the remainder")?;
    let cards = decode_cards(&revealed)?;
    println!("Remaining deck ({} cards):", cards.len());
    println!("  {}", pretty::cards_line(&cards));
    Ok(())
}

fn decode_cards(values: &[BigUint]) -> Result<Vec<Card>> {
    values
        .iter()
        .map(|v| Card::from_plaintext(v).context("revealed value is not a card"))
        .collect()
}
