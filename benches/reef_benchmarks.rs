//! Reef container benchmarks.
//!
//! Criterion benchmarks for the hot containers. To run:
//! ```bash
//! cargo bench
//! ```

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use reef::containers::lockfree_list::{indexed_list, lru_cache};
use reef::containers::{BloomFilter, BpTree, SafeMap, ZSet};

fn bench_safe_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("safe_map");
    group.measurement_time(Duration::from_secs(2));
    group.warm_up_time(Duration::from_secs(1));

    for size in [100usize, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("store", size), &size, |b, &size| {
            b.iter(|| {
                let map = SafeMap::new();
                for i in 0..size {
                    map.store(black_box(i), i);
                }
            });
        });
    }

    let map = SafeMap::new();
    for i in 0..10_000usize {
        map.store(i, i);
    }
    group.bench_function("load_hit", |b| {
        b.iter(|| map.load(black_box(&5_000)));
    });
    group.bench_function("compare_and_swap", |b| {
        b.iter(|| {
            map.compare_and_swap(black_box(&5_000), &5_000, 5_000);
        });
    });

    group.finish();
}

fn bench_zset(c: &mut Criterion) {
    let mut group = c.benchmark_group("zset");
    group.measurement_time(Duration::from_secs(2));

    for size in [100usize, 1_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("add", size), &size, |b, &size| {
            b.iter(|| {
                let zset = ZSet::new();
                for i in 0..size {
                    zset.add(&format!("member-{i}"), i as f64);
                }
            });
        });
    }

    let zset = ZSet::new();
    for i in 0..10_000 {
        zset.add(&format!("member-{i}"), f64::from(i));
    }
    group.bench_function("rank", |b| {
        b.iter(|| zset.rank(black_box("member-5000")));
    });
    group.bench_function("range_100", |b| {
        b.iter(|| zset.range(black_box(4_950), 5_049));
    });

    group.finish();
}

fn bench_lockfree_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("lockfree_list");
    group.measurement_time(Duration::from_secs(2));

    group.bench_function("add_back_1000", |b| {
        b.iter(|| {
            let list = indexed_list();
            for i in 0..1_000 {
                list.add_back(black_box(i), i);
            }
        });
    });

    let list = indexed_list();
    for i in 0..10_000 {
        list.add_back(i, i);
    }
    group.bench_function("find_indexed", |b| {
        b.iter(|| list.find(black_box(&5_000)));
    });

    group.bench_function("lru_churn", |b| {
        let cache = lru_cache(256);
        let mut next = 0usize;
        b.iter(|| {
            cache.add_back(black_box(next), next);
            next += 1;
        });
    });

    group.finish();
}

fn bench_bptree(c: &mut Criterion) {
    let mut group = c.benchmark_group("bptree");
    group.measurement_time(Duration::from_secs(2));

    for size in [1_000usize, 10_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("insert", size), &size, |b, &size| {
            b.iter(|| {
                let mut tree = BpTree::with_ord(8);
                for i in 0..size {
                    tree.insert(black_box(i), i);
                }
            });
        });
    }

    let mut tree = BpTree::with_ord(8);
    for i in 0..10_000usize {
        tree.insert(i, i);
    }
    group.bench_function("find", |b| {
        b.iter(|| tree.find(black_box(&5_000)));
    });
    group.bench_function("range_100", |b| {
        b.iter(|| tree.range_query(black_box(&4_950), &5_049));
    });

    group.finish();
}

fn bench_bloom_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("bloom_filter");
    group.measurement_time(Duration::from_secs(2));

    let filter = BloomFilter::with_rate(100_000, 0.01);
    group.bench_function("add", |b| {
        let mut next = 0u64;
        b.iter(|| {
            filter.add(black_box(&next));
            next += 1;
        });
    });
    group.bench_function("contains", |b| {
        b.iter(|| filter.contains(black_box(&42u64)));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_safe_map,
    bench_zset,
    bench_lockfree_list,
    bench_bptree,
    bench_bloom_filter
);
criterion_main!(benches);
