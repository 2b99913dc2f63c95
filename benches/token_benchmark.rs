use chrono::Duration;
use criterion::{criterion_group, criterion_main, Criterion};
use ronin_fitness::services::tokens::{hash_token, TokenService};
use std::hint::black_box;

fn benchmark_tokens(c: &mut Criterion) {
    let service = TokenService::new(
        b"bench_jwt_key_32_bytes_minimum!!",
        Duration::minutes(15),
        Duration::days(30),
    );
    let issued = service.issue(42).expect("Failed to issue tokens");

    let mut group = c.benchmark_group("tokens");

    group.bench_function("issue_pair", |b| {
        b.iter(|| service.issue(black_box(42)))
    });

    group.bench_function("verify_access", |b| {
        b.iter(|| service.verify_access(black_box(&issued.access_token)))
    });

    group.bench_function("hash_refresh_token", |b| {
        b.iter(|| hash_token(black_box(&issued.refresh_token)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_tokens);
criterion_main!(benches);
