//! Identity cache benchmarks
//!
//! Measures lookup cost on hits and misses, rekey, and contention across threads.

use std::hint::black_box;
use std::sync::Arc;

use bigip_session::{IdentityCache, ResourceKey, ResourceKind};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

#[derive(Debug)]
struct Proxy {
    name: String,
}

fn pool_key(index: usize) -> ResourceKey {
    ResourceKey::named(
        Some("lb1.example.com"),
        ResourceKind::Pool,
        &format!("/Common/pool_{index}"),
    )
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");

    for size in [10, 1_000, 10_000] {
        let cache = IdentityCache::new();
        let held: Vec<Arc<Proxy>> = (0..size)
            .map(|i| {
                cache.lookup_or_create(pool_key(i), || Proxy {
                    name: format!("/Common/pool_{i}"),
                })
            })
            .collect();
        let key = pool_key(size / 2);

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("hit", size), &key, |b, key| {
            b.iter(|| {
                let proxy = cache.lookup_or_create(key.clone(), || Proxy {
                    name: String::new(),
                });
                black_box(proxy.name.len())
            });
        });
        drop(held);
    }

    group.bench_function("miss_and_drop", |b| {
        let cache = IdentityCache::new();
        let key = pool_key(0);
        b.iter(|| {
            let proxy = cache.lookup_or_create(key.clone(), || Proxy {
                name: "/Common/pool_0".to_string(),
            });
            black_box(proxy);
        });
    });

    group.finish();
}

fn bench_rekey(c: &mut Criterion) {
    c.bench_function("rekey_roundtrip", |b| {
        let cache = IdentityCache::new();
        let a = pool_key(1);
        let z = pool_key(2);
        let proxy = cache.lookup_or_create(a.clone(), || Proxy {
            name: "/Common/pool_1".to_string(),
        });
        b.iter(|| {
            let _ = black_box(cache.rekey(&a, z.clone(), &proxy));
            let _ = black_box(cache.rekey(&z, a.clone(), &proxy));
        });
    });
}

fn bench_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("contention");

    for threads in [2, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &n| {
            let cache = Arc::new(IdentityCache::new());
            let held: Vec<Arc<Proxy>> = (0..64)
                .map(|i| {
                    cache.lookup_or_create(pool_key(i), || Proxy {
                        name: format!("/Common/pool_{i}"),
                    })
                })
                .collect();

            b.iter(|| {
                std::thread::scope(|s| {
                    for t in 0..n {
                        let cache = Arc::clone(&cache);
                        s.spawn(move || {
                            for i in 0..64 {
                                let proxy = cache.lookup_or_create(pool_key((i + t) % 64), || {
                                    Proxy {
                                        name: String::new(),
                                    }
                                });
                                black_box(proxy);
                            }
                        });
                    }
                });
            });
            drop(held);
        });
    }

    group.finish();
}

criterion_group!(benches, bench_lookup, bench_rekey, bench_contention);
criterion_main!(benches);
