//! Criterion benchmarks comparing the crabtree B+ tree against other map
//! implementations:
//!
//! - `crabtree::Tree` — concurrent B+ tree with pessimistic latch crabbing
//! - `crossbeam_skiplist::SkipMap` — lock-free concurrent skip list
//! - `parking_lot::RwLock<BTreeMap>` — coarse-grained locked B-tree
//!
//! Single-threaded benchmarks measure raw operation cost; the concurrent
//! benchmarks measure throughput with every thread hitting the same map.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use crabtree::Tree;
use crossbeam_skiplist::SkipMap;
use parking_lot::RwLock;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::BTreeMap;
use std::hint::black_box;
use std::sync::Arc;
use std::thread;

const SEED: u64 = 42;
const PRELOAD: usize = 100_000;

fn random_keys(count: usize) -> Vec<i64> {
	let mut rng = StdRng::seed_from_u64(SEED);
	(0..count).map(|_| rng.gen_range(0..10_000_000)).collect()
}

fn bench_single_threaded_insert(c: &mut Criterion) {
	let keys = random_keys(PRELOAD);
	let mut group = c.benchmark_group("insert/single-thread");
	group.throughput(Throughput::Elements(keys.len() as u64));

	group.bench_function("crabtree", |b| {
		b.iter(|| {
			let tree: Tree<i64, i64> = Tree::new();
			for key in &keys {
				tree.insert(*key, *key);
			}
			black_box(tree);
		})
	});
	group.bench_function("rwlock-btreemap", |b| {
		b.iter(|| {
			let map = RwLock::new(BTreeMap::new());
			for key in &keys {
				map.write().insert(*key, *key);
			}
			black_box(map);
		})
	});
	group.bench_function("skipmap", |b| {
		b.iter(|| {
			let map = SkipMap::new();
			for key in &keys {
				map.insert(*key, *key);
			}
			black_box(map);
		})
	});
	group.finish();
}

fn bench_single_threaded_lookup(c: &mut Criterion) {
	let keys = random_keys(PRELOAD);

	let tree: Tree<i64, i64> = Tree::new();
	let btree = RwLock::new(BTreeMap::new());
	let skipmap = SkipMap::new();
	for key in &keys {
		tree.insert(*key, *key);
		btree.write().insert(*key, *key);
		skipmap.insert(*key, *key);
	}

	let mut group = c.benchmark_group("lookup/single-thread");
	group.throughput(Throughput::Elements(keys.len() as u64));

	group.bench_function("crabtree", |b| {
		b.iter(|| {
			for key in &keys {
				black_box(tree.search(key));
			}
		})
	});
	group.bench_function("rwlock-btreemap", |b| {
		b.iter(|| {
			for key in &keys {
				black_box(btree.read().get(key).copied());
			}
		})
	});
	group.bench_function("skipmap", |b| {
		b.iter(|| {
			for key in &keys {
				black_box(skipmap.get(key).map(|e| *e.value()));
			}
		})
	});
	group.finish();
}

fn bench_concurrent_mixed(c: &mut Criterion) {
	let mut group = c.benchmark_group("mixed/concurrent");

	for threads in [2usize, 4, 8] {
		let ops_per_thread = 50_000usize;
		group.throughput(Throughput::Elements((threads * ops_per_thread) as u64));

		group.bench_with_input(BenchmarkId::new("crabtree", threads), &threads, |b, &threads| {
			b.iter(|| {
				let tree = Arc::new(Tree::<i64, i64>::new());
				let handles: Vec<_> = (0..threads)
					.map(|t| {
						let tree = Arc::clone(&tree);
						thread::spawn(move || {
							let mut rng = StdRng::seed_from_u64(SEED + t as u64);
							for _ in 0..ops_per_thread {
								let key = rng.gen_range(0..100_000);
								if rng.gen_bool(0.2) {
									tree.insert(key, key);
								} else {
									black_box(tree.search(&key));
								}
							}
						})
					})
					.collect();
				for h in handles {
					h.join().unwrap();
				}
			})
		});

		group.bench_with_input(
			BenchmarkId::new("rwlock-btreemap", threads),
			&threads,
			|b, &threads| {
				b.iter(|| {
					let map = Arc::new(RwLock::new(BTreeMap::<i64, i64>::new()));
					let handles: Vec<_> = (0..threads)
						.map(|t| {
							let map = Arc::clone(&map);
							thread::spawn(move || {
								let mut rng = StdRng::seed_from_u64(SEED + t as u64);
								for _ in 0..ops_per_thread {
									let key = rng.gen_range(0..100_000);
									if rng.gen_bool(0.2) {
										map.write().insert(key, key);
									} else {
										black_box(map.read().get(&key).copied());
									}
								}
							})
						})
						.collect();
					for h in handles {
						h.join().unwrap();
					}
				})
			},
		);

		group.bench_with_input(BenchmarkId::new("skipmap", threads), &threads, |b, &threads| {
			b.iter(|| {
				let map = Arc::new(SkipMap::<i64, i64>::new());
				let handles: Vec<_> = (0..threads)
					.map(|t| {
						let map = Arc::clone(&map);
						thread::spawn(move || {
							let mut rng = StdRng::seed_from_u64(SEED + t as u64);
							for _ in 0..ops_per_thread {
								let key = rng.gen_range(0..100_000);
								if rng.gen_bool(0.2) {
									map.insert(key, key);
								} else {
									black_box(map.get(&key).map(|e| *e.value()));
								}
							}
						})
					})
					.collect();
				for h in handles {
					h.join().unwrap();
				}
			})
		});
	}
	group.finish();
}

criterion_group!(
	benches,
	bench_single_threaded_insert,
	bench_single_threaded_lookup,
	bench_concurrent_mixed
);
criterion_main!(benches);
