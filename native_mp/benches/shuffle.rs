use criterion::{criterion_group, criterion_main, Criterion};
use rand::rngs::OsRng;

use native_mp::deck::{Deck, LocalPlayer};
use native_mp::sra;

fn bench_shuffle(c: &mut Criterion) {
    let mut group = c.benchmark_group("shuffle");
    group.sample_size(10);
    let prime = sra::generate_prime(&mut OsRng, 256).expect("shared prime");
    for players in [2usize, 3, 6] {
        for key_bits in [32u64, 64] {
            for cards in [52usize, 104] {
                group.bench_function(format!("{players}p_{key_bits}b_{cards}c"), |b| {
                    b.iter(|| {
                        let seats = (0..players)
                            .map(|_| LocalPlayer::new(prime.clone(), key_bits))
                            .collect();
                        let mut deck = Deck::new(seats, cards);
                        deck.reset_and_shuffle().expect("joint shuffle");
                        deck
                    })
                });
            }
        }
    }
    group.finish();
}

criterion_group!(benches, bench_shuffle);
criterion_main!(benches);
