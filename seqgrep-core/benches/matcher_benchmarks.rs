use criterion::{black_box, criterion_group, criterion_main, Criterion};
use seqgrep_core::{
    ApproxAlgorithm, ExactAlgorithm, MatcherFactory, MatcherParams,
};

fn generate_test_sequence(length: usize) -> Vec<u8> {
    let pattern = b"ATCGATCG";
    let mut sequence = Vec::with_capacity(length);

    while sequence.len() < length {
        let remaining = length - sequence.len();
        let chunk_size = std::cmp::min(pattern.len(), remaining);
        sequence.extend_from_slice(&pattern[..chunk_size]);
    }

    sequence
}

/// A 10kb buffer with the query planted near the end, so every strategy
/// scans most of it.
fn planted_buffer(query: &[u8]) -> Vec<u8> {
    let mut buffer = generate_test_sequence(10_000);
    let at = buffer.len() - query.len() - 16;
    buffer[at..at + query.len()].copy_from_slice(query);
    buffer
}

fn bench_exact_matching(c: &mut Criterion) {
    let query = b"TGCATGCATGCATGCA";
    let buffer = planted_buffer(query);

    for (label, algorithm) in [
        ("exact_naive_10kb", ExactAlgorithm::Naive),
        ("exact_boyer_moore_10kb", ExactAlgorithm::BoyerMoore),
        ("exact_aho_corasick_10kb", ExactAlgorithm::AhoCorasick),
    ] {
        let params = MatcherParams::exact("TGCATGCATGCATGCA", algorithm);
        let mut matcher = MatcherFactory::create(&params).unwrap();
        c.bench_function(label, |b| {
            b.iter(|| {
                let hit = matcher.first_match(black_box(&buffer)).unwrap();
                black_box(hit)
            })
        });
    }
}

fn bench_approx_matching(c: &mut Criterion) {
    let query = b"TGCATGCATGCATGCA";
    let buffer = planted_buffer(query);

    for (label, algorithm) in [
        ("approx_dp_10kb", ApproxAlgorithm::Dp),
        ("approx_wu_manber_10kb", ApproxAlgorithm::WuManber),
        ("approx_myers_10kb", ApproxAlgorithm::Myers),
        ("approx_myers_unlimited_10kb", ApproxAlgorithm::MyersUnlimited),
    ] {
        let params = MatcherParams::approximate("TGCATGCATGCATGCA", algorithm, 90);
        let mut matcher = MatcherFactory::create(&params).unwrap();
        c.bench_function(label, |b| {
            b.iter(|| {
                let hit = matcher.first_match(black_box(&buffer)).unwrap();
                black_box(hit)
            })
        });
    }
}

fn bench_expression_matching(c: &mut Criterion) {
    let buffer = planted_buffer(b"TGCATGCATGCATGCA");

    let boolean = MatcherParams::expression("TGCA.GCATGCATGCA || AAAAAAAA", false);
    let mut matcher = MatcherFactory::create(&boolean).unwrap();
    c.bench_function("expression_boolean_10kb", |b| {
        b.iter(|| {
            let found = matcher.has_match(black_box(&buffer)).unwrap();
            black_box(found)
        })
    });

    let positional = MatcherParams::expression("TGCA.GCATGCATGCA", true);
    let mut matcher = MatcherFactory::create(&positional).unwrap();
    c.bench_function("expression_positional_10kb", |b| {
        b.iter(|| {
            let hit = matcher.first_match(black_box(&buffer)).unwrap();
            black_box(hit)
        })
    });
}

fn bench_alignment_matching(c: &mut Criterion) {
    // Alignment cost is n*m; keep the buffer shorter than the linear
    // strategies get.
    let query = b"TGCATGCATGCATGCA";
    let mut buffer = generate_test_sequence(1_000);
    buffer[500..500 + query.len()].copy_from_slice(query);

    let params = MatcherParams::alignment("TGCATGCATGCATGCA", 75);
    let mut matcher = MatcherFactory::create(&params).unwrap();
    c.bench_function("smith_waterman_1kb", |b| {
        b.iter(|| {
            let hit = matcher.first_match(black_box(&buffer)).unwrap();
            black_box(hit)
        })
    });
}

criterion_group!(
    benches,
    bench_exact_matching,
    bench_approx_matching,
    bench_expression_matching,
    bench_alignment_matching
);
criterion_main!(benches);
