//! End-to-end behavior of the filter: membership guarantees, statistical
//! false-positive bounds, and thread safety.

use bloomgate::alloc::{AlignedBuffer, Allocator};
use bloomgate::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use std::thread;

const FPR_KEYS: usize = 10_000;

/// ~9.6 bits/key with 7 probes targets a ~1% false-positive rate.
const FPR_BITS: u32 = 96_000;

fn flat_filter() -> DynamicBloom {
    DynamicBloomBuilder::new(FPR_BITS).num_probes(7).build().unwrap()
}

fn blocked_filter() -> DynamicBloom {
    DynamicBloomBuilder::new(FPR_BITS)
        .locality(1)
        .num_probes(7)
        .build()
        .unwrap()
}

/// Insert `FPR_KEYS` random keys, assert none go missing, then measure the
/// false-positive proportion over `FPR_KEYS` disjoint random keys.
fn measure_fp_rate(filter: &DynamicBloom, rng: &mut ChaCha8Rng) -> f64 {
    let inserted: Vec<u128> = (0..FPR_KEYS).map(|_| rng.gen()).collect();
    for key in &inserted {
        filter.insert(&key.to_le_bytes());
    }
    for key in &inserted {
        assert!(
            filter.may_contain(&key.to_le_bytes()),
            "false negative for inserted key {key:#x}"
        );
    }

    let mut false_positives = 0usize;
    for _ in 0..FPR_KEYS {
        let probe: u128 = rng.gen();
        if filter.may_contain(&probe.to_le_bytes()) {
            false_positives += 1;
        }
    }
    false_positives as f64 / FPR_KEYS as f64
}

#[test]
fn test_no_false_negatives_flat() {
    let filter = DynamicBloom::new(200_000, 6).unwrap();
    for i in 0..20_000u32 {
        filter.insert(&i.to_le_bytes());
    }
    for i in 0..20_000u32 {
        assert!(filter.may_contain(&i.to_le_bytes()), "false negative for {i}");
    }
}

#[test]
fn test_no_false_negatives_blocked() {
    let filter = DynamicBloomBuilder::new(200_000)
        .locality(1)
        .num_probes(6)
        .build()
        .unwrap();
    for i in 0..20_000u32 {
        filter.insert(&i.to_le_bytes());
    }
    for i in 0..20_000u32 {
        assert!(filter.may_contain(&i.to_le_bytes()), "false negative for {i}");
    }
}

#[test]
fn test_queries_are_deterministic() {
    let filter = flat_filter();
    filter.insert(b"present");

    // Repeated queries against unchanged state always agree.
    for key in [&b"present"[..], &b"absent-1"[..], &b"absent-2"[..]] {
        let first = filter.may_contain(key);
        for _ in 0..100 {
            assert_eq!(filter.may_contain(key), first);
        }
    }
    assert!(filter.may_contain(b"present"));
}

#[test]
fn test_repeated_insert_leaves_bit_state_unchanged() {
    let filter = flat_filter();
    for i in 0..1000u32 {
        filter.insert(&i.to_le_bytes());
    }
    let saturation = filter.saturation();
    for i in 0..1000u32 {
        filter.insert(&i.to_le_bytes());
    }
    assert_eq!(filter.saturation(), saturation);
}

#[test]
fn test_sizing_invariants_hold_across_capacities() {
    for requested in [1u32, 8, 100, 511, 512, 513, 100_000] {
        let flat = DynamicBloomBuilder::new(requested).build().unwrap();
        assert_eq!(flat.total_bits() % 8, 0);
        assert!(flat.total_bits() >= requested);

        let blocked = DynamicBloomBuilder::new(requested).locality(1).build().unwrap();
        assert_eq!(blocked.total_bits() % 512, 0);
        assert!(blocked.total_bits() >= requested);
        assert_eq!(blocked.num_blocks() % 2, 1);
    }
}

#[test]
fn test_false_positive_rate_flat_within_bound() {
    let mut rng = ChaCha8Rng::seed_from_u64(0xB100_F11E);
    let fp_rate = measure_fp_rate(&flat_filter(), &mut rng);
    // Sized for ~1%; allow a generous multiple for sampling variance.
    assert!(fp_rate < 0.025, "flat false-positive rate too high: {fp_rate}");
}

#[test]
fn test_false_positive_rate_blocked_within_bound() {
    let mut rng = ChaCha8Rng::seed_from_u64(0xB10C_7E57);
    let fp_rate = measure_fp_rate(&blocked_filter(), &mut rng);
    // Block confinement adds variance over the flat bound.
    assert!(fp_rate < 0.04, "blocked false-positive rate too high: {fp_rate}");
}

#[test]
fn test_concurrent_inserts_lose_no_updates() {
    const THREADS: u32 = 8;
    const PER_THREAD: u32 = 2000;

    for locality in [0u32, 1] {
        let filter = Arc::new(
            DynamicBloomBuilder::new(400_000)
                .locality(locality)
                .num_probes(6)
                .build()
                .unwrap(),
        );

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let f = Arc::clone(&filter);
                thread::spawn(move || {
                    for i in (t * PER_THREAD)..((t + 1) * PER_THREAD) {
                        f.insert(&i.to_le_bytes());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Single-threaded verification pass: every key from every thread.
        for i in 0..(THREADS * PER_THREAD) {
            assert!(
                filter.may_contain(&i.to_le_bytes()),
                "lost update for key {i} (locality={locality})"
            );
        }
    }
}

#[test]
fn test_queries_run_safely_alongside_inserts() {
    let filter = Arc::new(DynamicBloomBuilder::new(400_000).num_probes(6).build().unwrap());

    // Keys inserted before any concurrency starts must stay visible to
    // readers no matter what writers do in the meantime.
    for i in 0..1000u32 {
        filter.insert(&i.to_le_bytes());
    }

    let writers: Vec<_> = (0..4u32)
        .map(|t| {
            let f = Arc::clone(&filter);
            thread::spawn(move || {
                for i in 0..5000u32 {
                    f.insert(&(1_000_000 + t * 10_000 + i).to_le_bytes());
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let f = Arc::clone(&filter);
            thread::spawn(move || {
                for _ in 0..10 {
                    for i in 0..1000u32 {
                        assert!(f.may_contain(&i.to_le_bytes()));
                    }
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }
}

#[test]
fn test_allocator_failure_yields_no_filter() {
    struct ExhaustedAllocator;
    impl Allocator for ExhaustedAllocator {
        fn allocate_aligned(&self, size: usize, _: usize) -> bloomgate::Result<AlignedBuffer> {
            Err(BloomGateError::allocation_failed(size))
        }
    }

    let result = DynamicBloomBuilder::new(100_000)
        .allocator(ExhaustedAllocator)
        .build();
    match result {
        Err(BloomGateError::AllocationFailed { size }) => {
            assert_eq!(size, 100_000 / 8);
        }
        other => panic!("expected AllocationFailed, got {other:?}"),
    }
}

#[test]
fn test_huge_page_threshold_does_not_change_behavior() {
    // 1 MiB of bits crosses a small threshold; the filter must behave
    // identically whether or not the kernel honors the hint.
    let filter = DynamicBloomBuilder::new(1 << 23)
        .locality(1)
        .num_probes(6)
        .huge_page_threshold(4096)
        .build()
        .unwrap();

    for i in 0..10_000u32 {
        filter.insert(&i.to_le_bytes());
    }
    for i in 0..10_000u32 {
        assert!(filter.may_contain(&i.to_le_bytes()));
    }
}
