//! Tests for Scanner
//!
//! These tests verify:
//! - Point lookups (get_first) with and without compression
//! - Multi-value lookups (get_all) over duplicate keys
//! - Missing keys before, between and after written keys
//! - Query order enforcement and recovery
//! - Scanner pooling and reset hygiene
//! - Large files spanning many blocks

use hfile::store::MemSink;
use hfile::testdata::{mock_key_int, mock_value_int};
use hfile::{Config, HFileError, Reader, Writer};

// =============================================================================
// Helper Functions
// =============================================================================

fn key_i(i: u32) -> Vec<u8> {
    mock_key_int(i)
}

fn val_i(i: u32) -> Vec<u8> {
    mock_value_int(i)
}

/// Write `keys`/`values` to memory and open a reader over the result
fn temp_hfile(compress: bool, block_size: usize, keys: &[Vec<u8>], values: &[Vec<u8>]) -> Reader {
    let config = Config::builder()
        .compress(compress)
        .block_size(block_size)
        .build();
    let mut writer = Writer::new(MemSink::new(), config.clone()).unwrap();
    for (key, value) in keys.iter().zip(values) {
        writer.write(key, value).unwrap();
    }
    let (sink, _) = writer.finish().unwrap();
    Reader::from_bytes(sink.into_bytes(), config).unwrap()
}

/// Keys `0..count` with their mock values
fn sequential_hfile(compress: bool, block_size: usize, count: u32) -> Reader {
    let keys: Vec<_> = (0..count).map(key_i).collect();
    let vals: Vec<_> = (0..count).map(val_i).collect();
    temp_hfile(compress, block_size, &keys, &vals)
}

fn multi_value_hfile() -> Reader {
    let keys: Vec<_> = [10, 10, 20, 30, 30, 30, 40].into_iter().map(key_i).collect();
    let vals: Vec<_> = [10, 11, 20, 30, 31, 32, 40].into_iter().map(val_i).collect();
    temp_hfile(true, 4096, &keys, &vals)
}

// =============================================================================
// Round Trip Tests
// =============================================================================

#[test]
fn test_round_trip() {
    let keys = vec![key_i(1), key_i(2), key_i(3), key_i(4)];
    let vals = vec![val_i(1), val_i(2), val_i(3), val_i(4)];
    let reader = temp_hfile(false, 4096, &keys, &vals);
    let mut scanner = reader.scanner();

    assert_eq!(scanner.get_first(&key_i(3)).unwrap(), Some(val_i(3)));
    assert_eq!(scanner.get_first(&key_i(5)).unwrap(), None);
}

#[test]
fn test_round_trip_compressed() {
    let keys = vec![key_i(1), key_i(2), key_i(3), key_i(4)];
    let vals = vec![val_i(1), val_i(2), val_i(3), val_i(4)];
    let reader = temp_hfile(true, 4096, &keys, &vals);
    let mut scanner = reader.scanner();

    assert_eq!(scanner.get_first(&key_i(3)).unwrap(), Some(val_i(3)));
    assert_eq!(scanner.get_first(&key_i(5)).unwrap(), None);
}

#[test]
fn test_every_key_found_across_blocks() {
    for compress in [false, true] {
        let reader = sequential_hfile(compress, 128, 2000);
        assert!(reader.block_count() > 10);

        let mut scanner = reader.scanner();
        for i in 0..2000 {
            assert_eq!(scanner.get_first(&key_i(i)).unwrap(), Some(val_i(i)), "key {}", i);
        }
    }
}

#[test]
fn test_big_round_trip_compressed() {
    let reader = sequential_hfile(true, 4096, 1_000_000);
    let mut scanner = reader.scanner();

    assert_eq!(scanner.get_first(&key_i(501)).unwrap(), Some(val_i(501)));
}

#[test]
fn test_big_file_interior_keys_with_skips() {
    let reader = sequential_hfile(true, 4096, 200_000);
    let mut scanner = reader.scanner();

    // Large jumps exercise the binary-search fallback, small ones the probe
    for i in [0, 1, 2, 500, 501, 90_000, 90_001, 150_000, 199_999] {
        assert_eq!(scanner.get_first(&key_i(i)).unwrap(), Some(val_i(i)), "key {}", i);
    }
    assert_eq!(scanner.get_first(&key_i(200_000)).unwrap(), None);
}

// =============================================================================
// Missing Key Tests
// =============================================================================

#[test]
fn test_missing_keys_are_not_errors() {
    let keys = vec![key_i(10), key_i(20), key_i(30)];
    let vals = vec![val_i(10), val_i(20), val_i(30)];
    let reader = temp_hfile(false, 4096, &keys, &vals);
    let mut scanner = reader.scanner();

    assert_eq!(scanner.get_first(&key_i(5)).unwrap(), None);
    assert_eq!(scanner.get_first(&key_i(15)).unwrap(), None);
    assert_eq!(scanner.get_all(&key_i(25)).unwrap(), Vec::<Vec<u8>>::new());
    assert_eq!(scanner.get_first(&key_i(35)).unwrap(), None);
}

#[test]
fn test_keys_before_range_do_no_io() {
    let keys = vec![key_i(10), key_i(20)];
    let vals = vec![val_i(10), val_i(20)];
    let reader = temp_hfile(true, 4096, &keys, &vals);
    let mut scanner = reader.scanner();

    assert_eq!(scanner.get_first(&key_i(1)).unwrap(), None);
    assert_eq!(scanner.get_first(&key_i(2)).unwrap(), None);
    assert_eq!(scanner.current_block(), None);

    assert_eq!(scanner.get_first(&key_i(10)).unwrap(), Some(val_i(10)));
    assert_eq!(scanner.current_block(), Some(0));
}

#[test]
fn test_missing_key_does_not_hide_next_key() {
    let keys = vec![key_i(1), key_i(3)];
    let vals = vec![val_i(1), val_i(3)];
    let reader = temp_hfile(false, 4096, &keys, &vals);
    let mut scanner = reader.scanner();

    // Overshooting key 3 while looking for 2 must leave it visible
    assert_eq!(scanner.get_first(&key_i(2)).unwrap(), None);
    assert_eq!(scanner.get_first(&key_i(3)).unwrap(), Some(val_i(3)));
}

#[test]
fn test_empty_file() {
    let reader = temp_hfile(true, 4096, &[], &[]);
    let mut scanner = reader.scanner();

    assert_eq!(scanner.get_first(b"anything").unwrap(), None);
    assert!(scanner.get_all(b"anything").unwrap().is_empty());
}

// =============================================================================
// Multi-Value Tests
// =============================================================================

#[test]
fn test_multi_value_round_trip_compressed() {
    let reader = multi_value_hfile();
    let mut scanner = reader.scanner();

    let values = scanner.get_all(&key_i(30)).unwrap();
    assert_eq!(values.len(), 3);
    assert_eq!(values[1], val_i(31));

    let values = scanner.get_all(&key_i(40)).unwrap();
    assert_eq!(values, vec![val_i(40)]);

    let values = scanner.get_all(&key_i(50)).unwrap();
    assert!(values.is_empty());
}

#[test]
fn test_get_all_preserves_write_order() {
    let reader = multi_value_hfile();
    let mut scanner = reader.scanner();

    assert_eq!(scanner.get_all(&key_i(10)).unwrap(), vec![val_i(10), val_i(11)]);
    assert_eq!(scanner.get_all(&key_i(20)).unwrap(), vec![val_i(20)]);
    assert_eq!(scanner.get_all(&key_i(30)).unwrap(), vec![val_i(30), val_i(31), val_i(32)]);
}

#[test]
fn test_get_first_steps_through_duplicates() {
    let reader = multi_value_hfile();
    let mut scanner = reader.scanner();

    // Each call consumes the record it returns
    assert_eq!(scanner.get_first(&key_i(10)).unwrap(), Some(val_i(10)));
    assert_eq!(scanner.get_first(&key_i(10)).unwrap(), Some(val_i(11)));
    assert_eq!(scanner.get_first(&key_i(10)).unwrap(), None);
    assert_eq!(scanner.get_first(&key_i(20)).unwrap(), Some(val_i(20)));
}

#[test]
fn test_long_duplicate_run_with_tiny_blocks() {
    let mut keys = vec![key_i(1)];
    let mut vals = vec![val_i(1)];
    for i in 0..500 {
        keys.push(key_i(7));
        vals.push(val_i(i));
    }
    keys.push(key_i(9));
    vals.push(val_i(9));

    let reader = temp_hfile(true, 64, &keys, &vals);
    let mut scanner = reader.scanner();

    let values = scanner.get_all(&key_i(7)).unwrap();
    assert_eq!(values.len(), 500);
    assert_eq!(values[0], val_i(0));
    assert_eq!(values[499], val_i(499));
    assert_eq!(scanner.get_first(&key_i(9)).unwrap(), Some(val_i(9)));
}

// =============================================================================
// Query Order Tests
// =============================================================================

#[test]
fn test_out_of_order_query_fails_and_recovers() {
    let reader = sequential_hfile(false, 4096, 10);
    let mut scanner = reader.scanner();

    assert_eq!(scanner.get_first(&key_i(5)).unwrap(), Some(val_i(5)));

    match scanner.get_first(&key_i(2)) {
        Err(HFileError::OutOfOrder { previous, key }) => {
            assert_eq!(previous, key_i(5));
            assert_eq!(key, key_i(2));
        }
        other => panic!("Expected OutOfOrder, got {:?}", other),
    }
    assert!(matches!(scanner.get_all(&key_i(4)), Err(HFileError::OutOfOrder { .. })));

    // Back in order: still usable
    assert_eq!(scanner.get_first(&key_i(6)).unwrap(), Some(val_i(6)));
}

#[test]
fn test_equal_key_is_in_order() {
    let reader = sequential_hfile(false, 4096, 10);
    let mut scanner = reader.scanner();

    assert!(scanner.get_first(&key_i(5)).is_ok());
    assert!(scanner.get_first(&key_i(5)).is_ok());
}

#[test]
fn test_enforcement_off_skips_check() {
    let reader = sequential_hfile(false, 4096, 10);
    let mut scanner = reader.scanner();
    scanner.set_enforce_key_order(false);
    assert!(!scanner.enforce_key_order());

    assert_eq!(scanner.get_first(&key_i(5)).unwrap(), Some(val_i(5)));
    // No error; the cursor already moved past key 2
    assert_eq!(scanner.get_first(&key_i(2)).unwrap(), None);
}

#[test]
fn test_enforcement_default_comes_from_config() {
    let config = Config::builder().enforce_key_order(false).build();
    let mut writer = Writer::new(MemSink::new(), config.clone()).unwrap();
    writer.write(b"a", b"1").unwrap();
    let (sink, _) = writer.finish().unwrap();
    let reader = Reader::from_bytes(sink.into_bytes(), config).unwrap();

    assert!(!reader.scanner().enforce_key_order());
}

// =============================================================================
// Pooling and Reset Tests
// =============================================================================

#[test]
fn test_released_scanner_is_reused() {
    let reader = sequential_hfile(true, 256, 1000);
    assert_eq!(reader.idle_scanners(), 0);

    let mut scanner = reader.scanner();
    scanner.get_first(&key_i(900)).unwrap();
    scanner.release();
    assert_eq!(reader.idle_scanners(), 1);

    let mut scanner = reader.scanner();
    assert_eq!(reader.idle_scanners(), 0);
    assert_eq!(scanner.current_block(), None);

    // A smaller key than the previous session's last key is fine
    assert_eq!(scanner.get_first(&key_i(10)).unwrap(), Some(val_i(10)));
}

#[test]
fn test_dropped_scanner_returns_to_pool() {
    let reader = sequential_hfile(false, 4096, 10);
    {
        let mut scanner = reader.scanner();
        scanner.get_first(&key_i(1)).unwrap();
    }
    assert_eq!(reader.idle_scanners(), 1);
}

#[test]
fn test_pool_is_bounded() {
    let config = Config::builder().scanner_pool_size(2).build();
    let mut writer = Writer::new(MemSink::new(), config.clone()).unwrap();
    writer.write(b"k", b"v").unwrap();
    let (sink, _) = writer.finish().unwrap();
    let reader = Reader::from_bytes(sink.into_bytes(), config).unwrap();

    let scanners: Vec<_> = (0..3).map(|_| reader.scanner()).collect();
    drop(scanners);
    assert_eq!(reader.idle_scanners(), 2);
}

#[test]
fn test_reset_clears_order_and_block() {
    let reader = sequential_hfile(false, 64, 100);
    let mut scanner = reader.scanner();

    scanner.get_first(&key_i(80)).unwrap();
    assert!(scanner.current_block().is_some());

    scanner.reset();
    assert_eq!(scanner.current_block(), None);
    assert_eq!(scanner.get_first(&key_i(3)).unwrap(), Some(val_i(3)));
}

#[test]
fn test_new_scanner_buffer_is_presized() {
    let reader = sequential_hfile(true, 4096, 10_000);
    let scanner = reader.scanner();

    let average = reader.total_uncompressed_bytes() / reader.block_count() as u64;
    assert_eq!(reader.scanner_buffer_capacity(), (average as f64 * 1.5) as usize);
    assert!(scanner.buffer_capacity() >= reader.scanner_buffer_capacity());
}

#[test]
fn test_underestimated_buffer_grows() {
    // One oversized block among small ones: the average underestimates it
    let mut keys = Vec::new();
    let mut vals = Vec::new();
    for i in 0..50 {
        keys.push(key_i(i));
        vals.push(val_i(i));
    }
    keys.push(key_i(100));
    vals.push(vec![b'x'; 64 * 1024]);

    let reader = temp_hfile(true, 64, &keys, &vals);
    let mut scanner = reader.scanner();
    assert!(scanner.buffer_capacity() < 64 * 1024);

    let value = scanner.get_first(&key_i(100)).unwrap().unwrap();
    assert_eq!(value.len(), 64 * 1024);
    assert!(scanner.buffer_capacity() >= 64 * 1024);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_scanners_share_reader() {
    let reader = sequential_hfile(true, 512, 20_000);

    std::thread::scope(|scope| {
        for t in 0..4u32 {
            let reader = &reader;
            scope.spawn(move || {
                for round in 0..3 {
                    let mut scanner = reader.scanner();
                    for i in ((t + round)..20_000).step_by(97) {
                        assert_eq!(scanner.get_first(&key_i(i)).unwrap(), Some(val_i(i)));
                    }
                    scanner.release();
                }
            });
        }
    });

    assert!(reader.idle_scanners() >= 1);
}
