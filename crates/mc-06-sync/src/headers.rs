//! # Header Chain
//!
//! The light node's gap-free header accumulator: heights strictly
//! increasing by one from genesis, each header linking to its parent and
//! passing self-verification before it is appended.

use crate::error::SyncError;
use mc_03_validation::verify_block_header;
use shared_types::{BlockHeader, GENESIS_HEIGHT};
use std::collections::HashMap;

/// Gap-free, single-parent header chain.
#[derive(Debug, Default)]
pub struct HeaderChain {
    by_height: HashMap<u64, BlockHeader>,
    tip_height: Option<u64>,
}

impl HeaderChain {
    /// An empty chain awaiting the genesis header.
    pub fn new() -> Self {
        Self::default()
    }

    /// The tip header, if any.
    pub fn tip(&self) -> Option<&BlockHeader> {
        self.tip_height.and_then(|h| self.by_height.get(&h))
    }

    /// The tip height (0 when empty).
    pub fn height(&self) -> u64 {
        self.tip_height.unwrap_or(0)
    }

    /// A header by height.
    pub fn get(&self, height: u64) -> Option<&BlockHeader> {
        self.by_height.get(&height)
    }

    /// Number of stored headers.
    pub fn len(&self) -> usize {
        self.by_height.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.by_height.is_empty()
    }

    /// Append the next header.
    ///
    /// The first header must be genesis; every later one must extend the
    /// tip by exactly one height with a matching parent hash.
    pub fn append(&mut self, header: BlockHeader) -> Result<(), SyncError> {
        if !verify_block_header(&header) {
            return Err(SyncError::InvalidHeader {
                height: header.height,
            });
        }

        match self.tip() {
            None => {
                if header.height != GENESIS_HEIGHT {
                    return Err(SyncError::NonSequentialHeader {
                        expected: GENESIS_HEIGHT,
                        got: header.height,
                    });
                }
            }
            Some(tip) => {
                if header.height != tip.height + 1 {
                    return Err(SyncError::NonSequentialHeader {
                        expected: tip.height + 1,
                        got: header.height,
                    });
                }
                if header.previous_hash != tip.hash {
                    return Err(SyncError::BrokenLink {
                        height: header.height,
                    });
                }
            }
        }

        self.tip_height = Some(header.height);
        self.by_height.insert(header.height, header);
        Ok(())
    }
}
