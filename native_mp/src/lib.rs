//! Mental poker core: a commutative SRA cipher over a shared prime and the
//! three-stage shuffle-and-deal protocol that lets mutually distrusting
//! participants shuffle a deck together and deal cards selectively.

pub mod config;
pub mod deck;
pub mod pretty;
pub mod sra;
