//! Throughput harness: versioned-slot ring vs. mutex-guarded queue.
//!
//! One producer thread pushes `--iterations` blocks, `--consumers` threads
//! race to claim them. The ring may drop blocks when consumers fall behind;
//! the report shows how many were claimed and how many were lost.
//!
//! Usage:
//!   cargo run --release --bin spmc_bench -- [OPTIONS]
//!   RUST_LOG=slotring=trace cargo run --release --bin spmc_bench

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use slotring::baseline::MutexQueue;
use slotring::{DequeueError, RetryPolicy, RingBuffer, BLOCK_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum QueueKind {
    Ring,
    Mutex,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum WaitKind {
    Spin,
    Yield,
    Backoff,
}

impl From<WaitKind> for RetryPolicy {
    fn from(kind: WaitKind) -> Self {
        match kind {
            WaitKind::Spin => RetryPolicy::Spin,
            WaitKind::Yield => RetryPolicy::Yield,
            WaitKind::Backoff => RetryPolicy::Backoff,
        }
    }
}

/// Benchmark configuration
#[derive(Debug, Parser)]
#[command(name = "spmc_bench", about = "SPMC ring buffer throughput benchmark")]
struct BenchConfig {
    /// Blocks published by the producer
    #[arg(short, long, default_value_t = 1_000_000)]
    iterations: u64,

    /// Consumer threads
    #[arg(short, long, default_value_t = 2)]
    consumers: usize,

    /// Ring slots
    #[arg(long, default_value_t = 1024)]
    capacity: usize,

    /// Bytes per block (at most the slot size)
    #[arg(long, default_value_t = BLOCK_SIZE)]
    block_bytes: usize,

    /// Which queue to measure
    #[arg(long, value_enum, default_value_t = QueueKind::Both)]
    queue: QueueKind,

    /// Consumer wait strategy between failed attempts
    #[arg(long, value_enum, default_value_t = WaitKind::Backoff)]
    wait: WaitKind,

    /// Pin producer and consumers to consecutive cores (Linux only)
    #[arg(long)]
    pin: bool,
}

impl BenchConfig {
    fn validate(&self) -> Result<()> {
        if self.block_bytes < 8 || self.block_bytes > BLOCK_SIZE {
            bail!(
                "--block-bytes must be between 8 and {}, got {}",
                BLOCK_SIZE,
                self.block_bytes
            );
        }
        if self.consumers == 0 {
            bail!("--consumers must be at least 1");
        }
        Ok(())
    }
}

/// Counters shared by all consumer threads
#[derive(Default)]
struct BenchStats {
    claimed: AtomicU64,
    claim_lost: AtomicU64,
    skipped: AtomicU64,
    overwritten: AtomicU64,
    checksum: AtomicU64,
}

impl BenchStats {
    fn print_stats(&self, name: &str, config: &BenchConfig, elapsed: Duration) {
        let claimed = self.claimed.load(Ordering::Relaxed);
        let lost = config.iterations.saturating_sub(claimed);
        let secs = elapsed.as_secs_f64();

        println!("\n📊 {} ({} consumers)", name, config.consumers);
        println!("   Elapsed:       {:.3} s", secs);
        println!(
            "   Throughput:    {:.2} M blocks/sec",
            config.iterations as f64 / secs / 1_000_000.0
        );
        println!(
            "   Claimed:       {} / {} ({:.2}%)",
            claimed,
            config.iterations,
            claimed as f64 * 100.0 / config.iterations.max(1) as f64
        );
        println!("   Lost:          {}", lost);
        println!(
            "   Claim races:   {}",
            self.claim_lost.load(Ordering::Relaxed)
        );
        let skipped = self.skipped.load(Ordering::Relaxed);
        let overwritten = self.overwritten.load(Ordering::Relaxed);
        if skipped > 0 || overwritten > 0 {
            println!("   Skipped:       {} ⚠️", skipped);
            println!("   Torn reads:    {} ⚠️", overwritten);
        }
        println!("   Checksum:      {}", self.checksum.load(Ordering::Relaxed));
    }
}

fn block_for(seq: u64, len: usize) -> [u8; BLOCK_SIZE] {
    let mut block = [0u8; BLOCK_SIZE];
    block[..8].copy_from_slice(&seq.to_le_bytes());
    for (i, byte) in block[8..len].iter_mut().enumerate() {
        *byte = (seq as usize).wrapping_add(i) as u8;
    }
    block
}

fn seq_of(block: &[u8]) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&block[..8]);
    u64::from_le_bytes(raw)
}

#[cfg(target_os = "linux")]
fn pin_to_core(core: usize) {
    // SAFETY: cpu_set_t is plain data; zeroed is the empty set.
    let rc = unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_SET(core, &mut set);
        libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set)
    };
    if rc != 0 {
        warn!(core, "failed to pin thread: {}", std::io::Error::last_os_error());
    } else {
        debug!(core, "thread pinned");
    }
}

#[cfg(not(target_os = "linux"))]
fn pin_to_core(core: usize) {
    warn!(core, "thread pinning is only supported on Linux");
}

fn bench_ring(config: &BenchConfig) -> Result<()> {
    let ring = RingBuffer::<BLOCK_SIZE>::new(config.capacity).context("creating ring")?;
    let (mut producer, consumer) = ring.split();
    let stats = Arc::new(BenchStats::default());
    let start = Arc::new(Barrier::new(config.consumers + 1));
    let policy = RetryPolicy::from(config.wait);

    let mut handles = Vec::with_capacity(config.consumers);
    for id in 0..config.consumers {
        let consumer = consumer.clone();
        let stats = Arc::clone(&stats);
        let start = Arc::clone(&start);
        let pin = config.pin;
        handles.push(
            thread::Builder::new()
                .name(format!("ring-consumer-{}", id))
                .spawn(move || {
                    if pin {
                        pin_to_core(id + 1);
                    }
                    let mut buf = [0u8; BLOCK_SIZE];
                    start.wait();
                    loop {
                        match policy.run(|| {
                            let result = consumer.try_dequeue(&mut buf);
                            match result {
                                Err(DequeueError::ClaimLost) => {
                                    stats.claim_lost.fetch_add(1, Ordering::Relaxed);
                                }
                                Err(DequeueError::Lagged { skipped }) => {
                                    stats.skipped.fetch_add(skipped as u64, Ordering::Relaxed);
                                }
                                Err(DequeueError::Overwritten) => {
                                    stats.overwritten.fetch_add(1, Ordering::Relaxed);
                                }
                                Err(DequeueError::NotReady)
                                    if !consumer.producer_alive() && consumer.ring().is_empty() =>
                                {
                                    // Drained for good; stop retrying.
                                    return Ok(None);
                                }
                                _ => {}
                            }
                            result.map(Some)
                        }) {
                            Ok(Some(_)) => {
                                stats.claimed.fetch_add(1, Ordering::Relaxed);
                                stats.checksum.fetch_add(seq_of(&buf), Ordering::Relaxed);
                            }
                            Ok(None) => break,
                            Err(err) => {
                                warn!(%err, "consumer stopped");
                                break;
                            }
                        }
                    }
                })
                .context("spawning consumer")?,
        );
    }
    drop(consumer);

    if config.pin {
        pin_to_core(0);
    }
    start.wait();
    let began = Instant::now();
    for seq in 0..config.iterations {
        let block = block_for(seq, config.block_bytes);
        producer.enqueue(&block[..config.block_bytes])?;
    }
    drop(producer);

    for handle in handles {
        if handle.join().is_err() {
            bail!("ring consumer panicked");
        }
    }
    stats.print_stats("Versioned-slot ring (lock-free)", config, began.elapsed());
    Ok(())
}

fn bench_mutex(config: &BenchConfig) -> Result<()> {
    let queue = Arc::new(MutexQueue::<BLOCK_SIZE>::new());
    let done = Arc::new(AtomicBool::new(false));
    let stats = Arc::new(BenchStats::default());
    let start = Arc::new(Barrier::new(config.consumers + 1));
    let policy = RetryPolicy::from(config.wait);

    let mut handles = Vec::with_capacity(config.consumers);
    for id in 0..config.consumers {
        let queue = Arc::clone(&queue);
        let done = Arc::clone(&done);
        let stats = Arc::clone(&stats);
        let start = Arc::clone(&start);
        let pin = config.pin;
        handles.push(
            thread::Builder::new()
                .name(format!("mutex-consumer-{}", id))
                .spawn(move || {
                    if pin {
                        pin_to_core(id + 1);
                    }
                    let mut buf = [0u8; BLOCK_SIZE];
                    start.wait();
                    loop {
                        let result = policy.run(|| {
                            // Read the flag first so a late final push is not missed.
                            let finished = done.load(Ordering::Acquire);
                            match queue.try_dequeue(&mut buf) {
                                Err(DequeueError::NotReady) if finished => Ok(None),
                                other => other.map(Some),
                            }
                        });
                        match result {
                            Ok(Some(_)) => {
                                stats.claimed.fetch_add(1, Ordering::Relaxed);
                                stats.checksum.fetch_add(seq_of(&buf), Ordering::Relaxed);
                            }
                            Ok(None) => break,
                            Err(err) => {
                                warn!(%err, "consumer stopped");
                                break;
                            }
                        }
                    }
                })
                .context("spawning consumer")?,
        );
    }

    if config.pin {
        pin_to_core(0);
    }
    start.wait();
    let began = Instant::now();
    for seq in 0..config.iterations {
        let block = block_for(seq, config.block_bytes);
        queue.enqueue(&block[..config.block_bytes])?;
    }
    done.store(true, Ordering::Release);

    for handle in handles {
        if handle.join().is_err() {
            bail!("mutex consumer panicked");
        }
    }
    stats.print_stats("Mutex queue (parking_lot)", config, began.elapsed());
    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("slotring=info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_timer(fmt::time::uptime())
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let config = BenchConfig::parse();
    config.validate()?;
    info!(?config, "starting benchmark");

    println!("🚀 slotring SPMC benchmark");
    println!("===========================");
    println!(
        "   {} blocks x {} bytes, capacity {}",
        config.iterations, config.block_bytes, config.capacity
    );

    if matches!(config.queue, QueueKind::Ring | QueueKind::Both) {
        bench_ring(&config)?;
    }
    if matches!(config.queue, QueueKind::Mutex | QueueKind::Both) {
        bench_mutex(&config)?;
    }

    println!("\n✅ Benchmark complete");
    Ok(())
}
