//! Mock data
//!
//! Deterministic data sets for tests, benchmarks and the CLI: key `i` is
//! `i` as 4 big-endian bytes, its value is `"value-for-<i>"`.

use std::path::Path;

use crate::config::Config;
use crate::error::Result;
use crate::hfile::{FileSummary, Writer};
use crate::store::ByteSink;

/// Number of keys between progress events
const PROGRESS_EVERY: usize = 10_000;

/// Values written under every odd key of a multi-value data set
const MULTI_VALUES: usize = 3;

/// Key `i`: 4 bytes, big-endian, so byte order matches numeric order
pub fn mock_key_int(i: u32) -> Vec<u8> {
    i.to_be_bytes().to_vec()
}

/// `"value-for-<i>"`
pub fn mock_value_int(i: u32) -> Vec<u8> {
    format!("value-for-{}", i).into_bytes()
}

/// `"value-for-<i>-<k>"`
pub fn mock_multi_value_int(i: u32, k: usize) -> Vec<u8> {
    format!("value-for-{}-{}", i, k).into_bytes()
}

/// Value matching a key made by [`mock_key_int`]; `None` if the key is not
/// 4 bytes long
pub fn mock_value_for_mock_key(key: &[u8]) -> Option<Vec<u8>> {
    let bytes: [u8; 4] = key.try_into().ok()?;
    Some(mock_value_int(u32::from_be_bytes(bytes)))
}

/// Write keys `0..key_count`. With `multi`, odd keys get three values
/// ([`mock_multi_value_int`]) instead of one.
pub fn write_mock_int_pairs<S: ByteSink>(
    writer: &mut Writer<S>,
    key_count: u32,
    multi: bool,
) -> Result<()> {
    for i in 0..key_count {
        if (i as usize) % PROGRESS_EVERY == 0 {
            tracing::debug!(
                written = i,
                percent = i as f64 * 100.0 / key_count as f64,
                "Writing mock data"
            );
        }

        let key = mock_key_int(i);
        if multi && i % 2 == 1 {
            for k in 0..MULTI_VALUES {
                writer.write(&key, &mock_multi_value_int(i, k))?;
            }
        } else {
            writer.write(&key, &mock_value_int(i))?;
        }
    }
    Ok(())
}

/// Write a mock file of `key_count` keys to `path`
pub fn generate_mock_hfile(path: &Path, key_count: u32, config: Config, multi: bool) -> Result<FileSummary> {
    let mut writer = Writer::create(path, config)?;
    write_mock_int_pairs(&mut writer, key_count, multi)?;
    writer.close()
}
