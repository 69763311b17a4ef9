use babylon_cache::cache::{CacheConfig, CacheLayer, CacheMonitor, CachePolicy, MemoryStore};
use babylon_cache::schema::BalanceData;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::sync::Arc;

fn balance() -> BalanceData {
    BalanceData {
        balance: 500.0,
        total_deposited: 500.0,
        total_withdrawn: 0.0,
        lifetime_pnl: 0.0,
    }
}

fn bench_read_through(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("build runtime");
    let layer = CacheLayer::with_store(Arc::new(MemoryStore::new(&CacheConfig::memory())));
    let cache = layer.read_through();
    let policy = CachePolicy::user_balance("u1");

    runtime.block_on(async {
        cache
            .read_through(&policy, || async { Ok(balance()) })
            .await
            .expect("warm cache");
    });

    c.bench_function("read_through/hit", |b| {
        b.to_async(&runtime).iter(|| async {
            let value: BalanceData = cache
                .read_through(black_box(&policy), || async { Ok(balance()) })
                .await
                .expect("cache hit");
            black_box(value.balance);
        });
    });

    c.bench_function("read_through/miss", |b| {
        let mut n = 0u64;
        b.to_async(&runtime).iter(|| {
            n += 1;
            let policy = CachePolicy::user_balance(&format!("user-{}", n));
            let cache = cache.clone();
            async move {
                let value: BalanceData = cache
                    .read_through(&policy, || async { Ok(balance()) })
                    .await
                    .expect("cache miss");
                black_box(value.balance);
            }
        });
    });
}

fn bench_monitor(c: &mut Criterion) {
    let monitor = CacheMonitor::new();

    c.bench_function("monitor/record_hit", |b| {
        b.iter(|| monitor.record_hit(black_box("balance:u1"), black_box(0.2)));
    });
}

criterion_group!(benches, bench_read_through, bench_monitor);
criterion_main!(benches);
