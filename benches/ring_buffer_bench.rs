//! Criterion benchmark for the versioned-slot ring and the mutex baseline
//!
//! Run with: cargo bench

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use slotring::baseline::MutexQueue;
use slotring::{BlockRing, BLOCK_SIZE};

fn bench_enqueue_dequeue(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_thread");
    group.throughput(Throughput::Elements(1));
    let block = [7u8; BLOCK_SIZE];

    group.bench_function("ring_enqueue", |b| {
        let (mut tx, _rx) = BlockRing::new(65536).unwrap().split();
        b.iter(|| {
            // Overwrites freely, the ring never fills.
            tx.enqueue(black_box(&block)).unwrap();
        });
    });

    group.bench_function("ring_enqueue_dequeue", |b| {
        let (mut tx, rx) = BlockRing::new(65536).unwrap().split();
        let mut buf = [0u8; BLOCK_SIZE];
        b.iter(|| {
            tx.enqueue(black_box(&block)).unwrap();
            black_box(rx.try_dequeue(&mut buf)).ok();
        });
    });

    group.bench_function("mutex_enqueue_dequeue", |b| {
        let queue: MutexQueue<BLOCK_SIZE> = MutexQueue::new();
        let mut buf = [0u8; BLOCK_SIZE];
        b.iter(|| {
            queue.enqueue(black_box(&block)).unwrap();
            black_box(queue.try_dequeue(&mut buf)).ok();
        });
    });

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");
    let block = [3u8; BLOCK_SIZE];

    for batch_size in [100usize, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*batch_size as u64));
        group.bench_with_input(BenchmarkId::new("ring", batch_size), batch_size, |b, &n| {
            let (mut tx, rx) = BlockRing::new(16384).unwrap().split();
            let mut buf = [0u8; BLOCK_SIZE];
            b.iter(|| {
                for _ in 0..n {
                    tx.enqueue(&block).unwrap();
                }
                for _ in 0..n {
                    black_box(rx.try_dequeue(&mut buf)).ok();
                }
            });
        });
        group.bench_with_input(BenchmarkId::new("mutex", batch_size), batch_size, |b, &n| {
            let queue: MutexQueue<BLOCK_SIZE> = MutexQueue::new();
            let mut buf = [0u8; BLOCK_SIZE];
            b.iter(|| {
                for _ in 0..n {
                    queue.enqueue(&block).unwrap();
                }
                for _ in 0..n {
                    black_box(queue.try_dequeue(&mut buf)).ok();
                }
            });
        });
    }

    group.finish();
}

/// Producer on the bench thread, background consumers draining.
fn bench_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended");
    group.throughput(Throughput::Elements(1));
    let block = [9u8; BLOCK_SIZE];

    for consumers in [1usize, 2, 4] {
        group.bench_with_input(
            BenchmarkId::new("ring", consumers),
            &consumers,
            |b, &consumers| {
                let (mut tx, rx) = BlockRing::new(4096).unwrap().split();
                let stop = Arc::new(AtomicBool::new(false));
                let handles: Vec<_> = (0..consumers)
                    .map(|_| {
                        let rx = rx.clone();
                        let stop = Arc::clone(&stop);
                        thread::spawn(move || {
                            let mut buf = [0u8; BLOCK_SIZE];
                            while !stop.load(Ordering::Relaxed) {
                                if rx.try_dequeue(&mut buf).is_err() {
                                    std::hint::spin_loop();
                                }
                            }
                        })
                    })
                    .collect();

                b.iter(|| tx.enqueue(black_box(&block)).unwrap());

                stop.store(true, Ordering::Relaxed);
                for handle in handles {
                    handle.join().unwrap();
                }
            },
        );

        group.bench_with_input(
            BenchmarkId::new("mutex", consumers),
            &consumers,
            |b, &consumers| {
                let queue = Arc::new(MutexQueue::<BLOCK_SIZE>::new());
                let stop = Arc::new(AtomicBool::new(false));
                let handles: Vec<_> = (0..consumers)
                    .map(|_| {
                        let queue = Arc::clone(&queue);
                        let stop = Arc::clone(&stop);
                        thread::spawn(move || {
                            let mut buf = [0u8; BLOCK_SIZE];
                            while !stop.load(Ordering::Relaxed) {
                                if queue.try_dequeue(&mut buf).is_err() {
                                    std::hint::spin_loop();
                                }
                            }
                        })
                    })
                    .collect();

                b.iter(|| queue.enqueue(black_box(&block)).unwrap());

                stop.store(true, Ordering::Relaxed);
                for handle in handles {
                    handle.join().unwrap();
                }
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_enqueue_dequeue, bench_batch, bench_contended);
criterion_main!(benches);
