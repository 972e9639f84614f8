//! Performance benchmarks for carman-lzss
//!
//! - Compression and decompression speed across data patterns
//! - Throughput (MB/s)

use carman_lzss::{decode_lzss, encode_lzss};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

/// Type alias for pattern generator functions
type PatternGenerator = fn(usize) -> Vec<u8>;

mod test_data {
    /// All bytes the same.
    pub fn uniform(size: usize) -> Vec<u8> {
        vec![0xAA; size]
    }

    /// Repeating short phrase.
    pub fn repetitive(size: usize) -> Vec<u8> {
        b"TOBEORNOTTOBEORTOBEORNOT"
            .iter()
            .copied()
            .cycle()
            .take(size)
            .collect()
    }

    /// English-like text.
    pub fn text_like(size: usize) -> Vec<u8> {
        let text = b"The quick brown fox jumps over the lazy dog. \
                     Pack my box with five dozen liquor jugs. \
                     How vexingly quick daft zebras jump! ";
        text.iter().copied().cycle().take(size).collect()
    }

    /// Pseudo-random bytes; the encoder gives up on these.
    pub fn random(size: usize) -> Vec<u8> {
        let mut seed: u64 = 0x123456789ABCDEF0;
        (0..size)
            .map(|_| {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
                (seed >> 32) as u8
            })
            .collect()
    }
}

const PATTERNS: [(&str, PatternGenerator); 4] = [
    ("uniform", test_data::uniform),
    ("repetitive", test_data::repetitive),
    ("text_like", test_data::text_like),
    ("random", test_data::random),
];

const SIZES: [usize; 3] = [4 * 1024, 64 * 1024, 1024 * 1024];

fn bench_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("lzss_compress");
    for (name, generate) in PATTERNS {
        for size in SIZES {
            let data = generate(size);
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(BenchmarkId::new(name, size), &data, |b, data| {
                b.iter(|| encode_lzss(black_box(data)))
            });
        }
    }
    group.finish();
}

fn bench_expand(c: &mut Criterion) {
    let mut group = c.benchmark_group("lzss_expand");
    for (name, generate) in PATTERNS {
        for size in SIZES {
            let data = generate(size);
            let Ok(Some(packed)) = encode_lzss(&data) else {
                continue;
            };
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(BenchmarkId::new(name, size), &packed, |b, packed| {
                b.iter(|| decode_lzss(black_box(packed), size as u32))
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_compress, bench_expand);
criterion_main!(benches);
