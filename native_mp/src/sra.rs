//! Commutative SRA cipher over a shared prime modulus.
//!
//! Every participant derives its key pairs from the same prime `p`. Because
//! `(m^e1)^e2 = (m^e2)^e1 (mod p)`, encryption layers from different key
//! pairs can be stripped in any order, which is what lets a deck be shuffled
//! under everyone's keys and later decrypted one layer at a time.

use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};
use thiserror::Error;

mod primes;

/// Ceiling on coprime-prime draws before key generation gives up.
const MAX_KEYGEN_ATTEMPTS: usize = 1024;

/// Errors produced while generating key material.
#[derive(Debug, Error)]
pub enum SraError {
    /// A retry loop exceeded its internal ceiling.
    #[error("key generation exhausted after {0} attempts")]
    Exhausted(usize),
    /// The underlying entropy source failed.
    #[error("entropy source failure")]
    Entropy(#[source] rand::Error),
}

/// A commutative SRA key pair bound to a shared prime.
///
/// The two exponents are interchangeable in direction; they are kept in the
/// order they were produced and callers must not assume which is which.
#[derive(Clone, Debug)]
pub struct KeyPair {
    prime: BigUint,
    enc: BigUint,
    dec: BigUint,
}

impl KeyPair {
    /// Generate a key pair for `prime` with `key_bits`-wide exponents.
    ///
    /// Draws fresh primes from `rng` until one is invertible modulo
    /// `prime - 1`; its inverse becomes the decryption exponent.
    pub fn generate<R>(rng: &mut R, prime: &BigUint, key_bits: u64) -> Result<Self, SraError>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        let phi = prime - 1u32;
        for _ in 0..MAX_KEYGEN_ATTEMPTS {
            let enc = primes::random_prime(rng, key_bits)?;
            // A prime exponent only fails to invert when it divides phi.
            if let Some(dec) = enc.modinv(&phi) {
                return Ok(KeyPair {
                    prime: prime.clone(),
                    enc,
                    dec,
                });
            }
        }
        Err(SraError::Exhausted(MAX_KEYGEN_ATTEMPTS))
    }

    /// Encrypt `v` under this key pair.
    pub fn encrypt(&self, v: &BigUint) -> BigUint {
        v.modpow(&self.enc, &self.prime)
    }

    /// Decrypt `v` under this key pair.
    pub fn decrypt(&self, v: &BigUint) -> BigUint {
        v.modpow(&self.dec, &self.prime)
    }
}

/// Generate a prime of the given bit width, suitable as a shared modulus.
pub fn generate_prime<R>(rng: &mut R, bits: u64) -> Result<BigUint, SraError>
where
    R: RngCore + CryptoRng + ?Sized,
{
    primes::random_prime(rng, bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn rng() -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(0x5ea1)
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let mut rng = rng();
        let prime = generate_prime(&mut rng, 256).expect("prime");
        let key = KeyPair::generate(&mut rng, &prime, 32).expect("key pair");
        for m in [2u64, 3, 42, 53, 1 << 20] {
            let m = BigUint::from(m);
            assert_eq!(key.decrypt(&key.encrypt(&m)), m);
            // The exponents are symmetric: stripping before layering works too.
            assert_eq!(key.encrypt(&key.decrypt(&m)), m);
        }
    }

    #[test]
    fn single_layer_changes_the_value() {
        let mut rng = rng();
        let prime = generate_prime(&mut rng, 256).expect("prime");
        for m in 2u64..40 {
            let key = KeyPair::generate(&mut rng, &prime, 32).expect("key pair");
            let m = BigUint::from(m);
            assert_ne!(key.encrypt(&m), m);
        }
    }

    #[test]
    fn commutative_across_all_orderings() {
        // Three key pairs over one prime: every encryption order against
        // every decryption order must recover the plaintext.
        let mut rng = rng();
        let prime = generate_prime(&mut rng, 256).expect("prime");
        let keys: Vec<KeyPair> = (0..3)
            .map(|_| KeyPair::generate(&mut rng, &prime, 32).expect("key pair"))
            .collect();
        let orders: [[usize; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        let m = BigUint::from(42u32);
        for enc_order in &orders {
            let mut c = m.clone();
            for &i in enc_order {
                c = keys[i].encrypt(&c);
                assert_ne!(c, m);
            }
            for dec_order in &orders {
                let mut v = c.clone();
                for &i in dec_order {
                    v = keys[i].decrypt(&v);
                }
                assert_eq!(v, m);
            }
        }
    }

    #[test]
    fn entropy_failure_surfaces() {
        struct BrokenRng;

        impl RngCore for BrokenRng {
            fn next_u32(&mut self) -> u32 {
                unimplemented!("entropy source is broken")
            }
            fn next_u64(&mut self) -> u64 {
                unimplemented!("entropy source is broken")
            }
            fn fill_bytes(&mut self, _dest: &mut [u8]) {
                unimplemented!("entropy source is broken")
            }
            fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
                Err(rand::Error::new(std::io::Error::other("no entropy")))
            }
        }

        impl CryptoRng for BrokenRng {}

        let prime = BigUint::from(101u32);
        let err = KeyPair::generate(&mut BrokenRng, &prime, 16).unwrap_err();
        assert!(matches!(err, SraError::Entropy(_)));
    }
}
