//! Random prime drawing for SRA exponents and shared moduli.
//!
//! Candidates are fixed-width odd integers read straight from the entropy
//! source, sieved against small primes and then subjected to Miller-Rabin
//! with random bases.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};

use super::SraError;

/// Miller-Rabin rounds; the composite-acceptance probability is at most
/// 4^-ROUNDS.
const MILLER_RABIN_ROUNDS: usize = 40;

const SMALL_PRIMES: &[u32] = &[
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89,
    97, 101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191,
    193, 197, 199, 211, 223, 227, 229, 233, 239, 241, 251,
];

/// Draw a random prime of exactly `bits` bits from `rng`.
///
/// The top bit is pinned so the result has the full width, the low bit so it
/// is odd. Far more candidates than the expected 0.7·bits are examined
/// before giving up, so exhaustion only signals a broken entropy source.
pub(crate) fn random_prime<R>(rng: &mut R, bits: u64) -> Result<BigUint, SraError>
where
    R: RngCore + CryptoRng + ?Sized,
{
    debug_assert!(bits >= 8, "prime width below any usable exponent size");
    let bytes = bits.div_ceil(8) as usize;
    let excess = bytes as u64 * 8 - bits;
    let mut buf = vec![0u8; bytes];
    let attempts = (bits as usize).saturating_mul(64);
    for _ in 0..attempts {
        rng.try_fill_bytes(&mut buf).map_err(SraError::Entropy)?;
        let mut candidate = BigUint::from_bytes_be(&buf) >> excess;
        candidate.set_bit(bits - 1, true);
        candidate.set_bit(0, true);
        if is_probable_prime(rng, &candidate)? {
            return Ok(candidate);
        }
    }
    Err(SraError::Exhausted(attempts))
}

/// Miller-Rabin with a small-prime sieve in front.
fn is_probable_prime<R>(rng: &mut R, n: &BigUint) -> Result<bool, SraError>
where
    R: RngCore + CryptoRng + ?Sized,
{
    for &p in SMALL_PRIMES {
        let p = BigUint::from(p);
        if *n == p {
            return Ok(true);
        }
        if (n % &p).is_zero() {
            return Ok(false);
        }
    }

    // Write n - 1 = d * 2^s with d odd.
    let one = BigUint::one();
    let two = BigUint::from(2u32);
    let n_minus_1 = n - &one;
    let s = n_minus_1.trailing_zeros().unwrap_or(0);
    let d = &n_minus_1 >> s;

    'witness: for _ in 0..MILLER_RABIN_ROUNDS {
        let a = random_in_range(rng, &two, &n_minus_1)?;
        let mut x = a.modpow(&d, n);
        if x == one || x == n_minus_1 {
            continue;
        }
        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_1 {
                continue 'witness;
            }
        }
        return Ok(false);
    }
    Ok(true)
}

/// Uniform draw in `[low, high)` by rejection sampling whole-byte reads.
fn random_in_range<R>(rng: &mut R, low: &BigUint, high: &BigUint) -> Result<BigUint, SraError>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let span = high - low;
    let bits = span.bits();
    let bytes = bits.div_ceil(8) as usize;
    let excess = bytes as u64 * 8 - bits;
    let mut buf = vec![0u8; bytes];
    // Acceptance is at least one in two per read.
    loop {
        rng.try_fill_bytes(&mut buf).map_err(SraError::Entropy)?;
        let v = BigUint::from_bytes_be(&buf) >> excess;
        if v < span {
            return Ok(low + v);
        }
    }
}
