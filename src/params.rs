use std::fmt;

use crate::config::TransportConfig;
use crate::error::{Error, Result};

/// Erasure-code parameters chosen for one message.
///
/// A payload is striped across `num_blocks` blocks of `K * fragment_size`
/// bytes each; coding expands every block to `N` fragments, any `K` of which
/// recover it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeParams {
    pub k: u16,
    pub n: u16,
    pub num_blocks: u16,
    pub block_payload_size: usize,
}

impl CodeParams {
    /// Data bytes carried per block before padding.
    pub fn block_payload_size(k: u16, fragment_size: usize) -> usize {
        k as usize * fragment_size
    }

    /// Total bytes this parameter choice puts on the wire, excluding headers.
    pub fn total_coded_bytes(&self, fragment_size: usize) -> usize {
        self.num_blocks as usize * self.n as usize * fragment_size
    }
}

impl fmt::Display for CodeParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "K={} N={} num_blocks={} block_payload_size={}",
            self.k, self.n, self.num_blocks, self.block_payload_size
        )
    }
}

/// Choose `(K, N, num_blocks)` for a payload of `payload_len` bytes.
///
/// Every candidate `K` in `[min_k, max_n)` is expanded to
/// `N = K + floor(K * target_redundancy)` and rejected if `N` exceeds
/// `max_n`. Among the surviving candidates the one wasting the fewest wire
/// bytes wins: larger `K` dilutes the fixed per-block redundancy, but a
/// block much longer than the payload pays for its unused tail in padding.
/// Ties go to the larger `K`.
pub fn select(payload_len: usize, config: &TransportConfig) -> Result<CodeParams> {
    let mut best: Option<CodeParams> = None;
    let mut best_total = usize::MAX;
    let mut any_candidate = false;
    let mut overflowed = 0usize;

    // The data model requires 1 <= K; a zero min_k would divide by zero in
    // the block count below.
    for k in config.min_k.max(1)..config.max_n {
        let n = k as usize + (k as f64 * config.target_redundancy) as usize;
        if n > config.max_n as usize {
            continue;
        }
        any_candidate = true;

        let block_payload_size = CodeParams::block_payload_size(k, config.fragment_size);
        let num_blocks = payload_len.div_ceil(block_payload_size).max(1);
        if num_blocks > u16::MAX as usize {
            overflowed = num_blocks;
            continue;
        }

        let total = num_blocks * n * config.fragment_size;
        // Maximizing payload_len / total over a fixed payload_len is
        // minimizing total; the integer comparison keeps ties exact.
        let better = total < best_total || (total == best_total && best.map_or(true, |b| k > b.k));
        if better {
            best_total = total;
            best = Some(CodeParams {
                k,
                n: n as u16,
                num_blocks: num_blocks as u16,
                block_payload_size,
            });
        }
    }

    match best {
        Some(params) => {
            log::debug!(
                "selected {} for {} payload bytes (efficiency {:.4})",
                params,
                payload_len,
                payload_len as f64 / best_total as f64
            );
            Ok(params)
        }
        None if !any_candidate => Err(Error::ErrParameterSearchFailed),
        None => Err(Error::ErrPayloadTooLarge {
            num_blocks: overflowed,
        }),
    }
}
