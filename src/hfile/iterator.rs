//! HFile Iterator
//!
//! Sequential iteration over all records of a file, block by block.

use crate::error::Result;

use super::block::{read_record, BlockBuffer};
use super::reader::Reader;
use super::BLOCK_HEADER_SIZE;

/// Iterator over every record in file order
pub struct HFileIterator<'r> {
    reader: &'r Reader,
    /// Next block to load (or the loaded one while `loaded`)
    block: usize,
    loaded: bool,
    pos: usize,
    buf: BlockBuffer,
    /// Set after an error has been yielded
    done: bool,
}

impl<'r> HFileIterator<'r> {
    pub(super) fn new(reader: &'r Reader) -> Self {
        Self {
            reader,
            block: 0,
            loaded: false,
            pos: 0,
            buf: BlockBuffer::with_capacity(reader.scanner_buffer_capacity()),
            done: false,
        }
    }
}

impl<'r> Iterator for HFileIterator<'r> {
    /// (key, value)
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if !self.loaded {
                if self.block >= self.reader.block_count() {
                    return None;
                }
                if let Err(e) = self.reader.get_block(self.block, &mut self.buf) {
                    self.done = true;
                    return Some(Err(e));
                }
                self.pos = BLOCK_HEADER_SIZE;
                self.loaded = true;
            }

            match read_record(self.buf.data(), self.pos) {
                Ok(Some(record)) => {
                    self.pos = record.next;
                    return Some(Ok((record.key.to_vec(), record.value.to_vec())));
                }
                Ok(None) => {
                    self.block += 1;
                    self.loaded = false;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}
