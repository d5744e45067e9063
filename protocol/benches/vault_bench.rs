// Vault benchmarks for Token Trader.
//
// Covers key sealing and unsealing at a few PBKDF2 work factors, salted
// password hashing and checking, and Ed25519 key generation.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use trader_protocol::crypto::keys::LedgerPrivateKey;
use trader_protocol::crypto::{
    check_password, decrypt_message, encrypt_message_with, hash_password, EncryptionParams,
};

const PASSWORD: &str = "benchmarkPassword2024";

fn bench_key_generation(c: &mut Criterion) {
    c.bench_function("keys/generate", |b| {
        b.iter(LedgerPrivateKey::generate);
    });
}

fn bench_seal(c: &mut Criterion) {
    let mut group = c.benchmark_group("vault/seal");
    group.sample_size(10);
    let der = LedgerPrivateKey::generate().to_der_hex();

    for iterations in [1_000, 10_000, 100_000] {
        let params = EncryptionParams {
            iterations,
            ..EncryptionParams::default()
        };
        group.bench_with_input(
            BenchmarkId::from_parameter(iterations),
            &params,
            |b, params| {
                b.iter(|| encrypt_message_with(&der, PASSWORD, *params).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_unseal(c: &mut Criterion) {
    let mut group = c.benchmark_group("vault/unseal");
    group.sample_size(10);
    let der = LedgerPrivateKey::generate().to_der_hex();

    for iterations in [1_000, 10_000, 100_000] {
        let params = EncryptionParams {
            iterations,
            ..EncryptionParams::default()
        };
        let blob = encrypt_message_with(&der, PASSWORD, params).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(iterations), &blob, |b, blob| {
            b.iter(|| decrypt_message(blob, PASSWORD).unwrap());
        });
    }

    group.finish();
}

fn bench_password_hash(c: &mut Criterion) {
    c.bench_function("hash/hash_password", |b| {
        b.iter(|| hash_password(PASSWORD));
    });

    let record = hash_password(PASSWORD);
    c.bench_function("hash/check_password", |b| {
        b.iter(|| check_password(PASSWORD, &record.hash, &record.salt));
    });
}

criterion_group!(
    benches,
    bench_key_generation,
    bench_seal,
    bench_unseal,
    bench_password_hash,
);
criterion_main!(benches);
