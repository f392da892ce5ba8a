use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use bytes::{Bytes, BytesMut};

use crate::config::TransportConfig;
use crate::error::{Error, Result};
use crate::fec;
use crate::fragment::{FragmentHeader, HEADER_SIZE};
use crate::payload;

/// A fully reconstructed message, ready for the sinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredMessage {
    pub message_id: u32,
    pub image: Bytes,
    pub metadata: Bytes,
}

/// What the table did with one accepted datagram. Benign outcomes only;
/// protocol violations and decode failures surface as errors so the receive
/// loop owns the drop/discard/terminate policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// The message was already delivered; late fragment discarded.
    AlreadyDelivered { message_id: u32 },
    /// The fragment's block has already decoded; nothing left to do.
    BlockAlreadyComplete { message_id: u32, block_idx: u32 },
    /// Fragment stored; the block still needs more fragments.
    Stored {
        message_id: u32,
        block_idx: u32,
        received: usize,
        needed: u16,
    },
    /// The fragment completed its block.
    BlockDecoded { message_id: u32, block_idx: u32 },
    /// The fragment completed the whole message.
    Delivered(DeliveredMessage),
}

/// Collection state for one block: nullable fragment slots plus the indices
/// received so far, in arrival order.
#[derive(Debug)]
struct BlockState {
    fragments: Vec<Option<Bytes>>,
    indices: Vec<u16>,
    padlen: u32,
}

impl BlockState {
    fn new(n: u16, padlen: u32) -> Self {
        BlockState {
            fragments: vec![None; n as usize],
            indices: Vec::with_capacity(n as usize),
            padlen,
        }
    }
}

/// Per-message reassembly state. The parameter triple is locked in by the
/// first fragment observed for the message id.
#[derive(Debug)]
struct MessageEntry {
    k: u16,
    n: u16,
    num_blocks: u16,
    blocks: HashMap<u32, BlockState>,
    complete_blocks: BTreeMap<u32, Bytes>,
}

impl MessageEntry {
    fn new(k: u16, n: u16, num_blocks: u16) -> Self {
        MessageEntry {
            k,
            n,
            num_blocks,
            blocks: HashMap::new(),
            complete_blocks: BTreeMap::new(),
        }
    }
}

/// Bounded FIFO window of delivered message ids.
#[derive(Debug)]
struct CompletionWindow {
    ids: HashSet<u32>,
    order: VecDeque<u32>,
    capacity: usize,
}

impl CompletionWindow {
    fn new(capacity: usize) -> Self {
        CompletionWindow {
            ids: HashSet::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    fn contains(&self, message_id: u32) -> bool {
        self.ids.contains(&message_id)
    }

    fn record(&mut self, message_id: u32) {
        if self.ids.insert(message_id) {
            self.order.push_back(message_id);
        }
        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.ids.remove(&evicted);
            }
        }
    }
}

/// The receiver's per-message, per-block fragment accounting.
///
/// One datagram is dispatched at a time; all mutation happens between
/// receives, so the table needs no interior locking.
#[derive(Debug)]
pub struct ReassemblyTable {
    fragment_size: usize,
    max_inflight: usize,
    entries: HashMap<u32, MessageEntry>,
    /// In-flight message ids in creation order, for oldest-first eviction.
    /// May hold ids whose entry is already gone; eviction skips those.
    order: VecDeque<u32>,
    completed: CompletionWindow,
}

impl ReassemblyTable {
    pub fn new(config: &TransportConfig) -> Self {
        ReassemblyTable {
            fragment_size: config.fragment_size,
            max_inflight: config.max_inflight_messages,
            entries: HashMap::new(),
            order: VecDeque::new(),
            completed: CompletionWindow::new(config.completion_window),
        }
    }

    /// Number of messages currently being reassembled.
    pub fn in_flight(&self) -> usize {
        self.entries.len()
    }

    /// Validate and dispatch one raw datagram.
    pub fn handle_datagram(&mut self, datagram: &[u8]) -> Result<Disposition> {
        let expected = HEADER_SIZE + self.fragment_size;
        if datagram.len() != expected {
            return Err(Error::ErrDatagramUnexpectedLength {
                len: datagram.len(),
                expected,
            });
        }

        let raw = Bytes::copy_from_slice(datagram);
        let header = FragmentHeader::unmarshal(&raw)?;
        let fragment = raw.slice(HEADER_SIZE..);
        self.handle_fragment(&header, fragment)
    }

    /// Dispatch one already-parsed fragment.
    pub fn handle_fragment(&mut self, header: &FragmentHeader, fragment: Bytes) -> Result<Disposition> {
        let message_id = header.message_id;
        let block_idx = header.block_idx;

        if self.completed.contains(message_id) {
            return Ok(Disposition::AlreadyDelivered { message_id });
        }

        if header.k == 0 || header.k >= header.n {
            return Err(Error::ErrInvalidCodeParams {
                k: header.k,
                n: header.n,
            });
        }
        if header.frag_idx >= header.n {
            return Err(Error::ErrFragmentIndexOutOfRange {
                frag_idx: header.frag_idx,
                n: header.n,
            });
        }
        if block_idx >= u32::from(header.num_blocks) {
            return Err(Error::ErrBlockIndexOutOfRange {
                block_idx,
                num_blocks: header.num_blocks,
            });
        }

        // The first fragment seen for a message id is the parameter
        // authority; everything after it must agree.
        if let Some(entry) = self.entries.get(&message_id) {
            if entry.k != header.k || entry.n != header.n || entry.num_blocks != header.num_blocks {
                return Err(Error::ErrInconsistentMessageParams {
                    expected_k: entry.k,
                    expected_n: entry.n,
                    expected_num_blocks: entry.num_blocks,
                    got_k: header.k,
                    got_n: header.n,
                    got_num_blocks: header.num_blocks,
                });
            }
        } else {
            self.evict_to_capacity();
            log::debug!(
                "message {} open: K={} N={} num_blocks={}",
                message_id,
                header.k,
                header.n,
                header.num_blocks
            );
            self.entries
                .insert(message_id, MessageEntry::new(header.k, header.n, header.num_blocks));
            self.order.push_back(message_id);
        }

        let (k, n, num_blocks) = (header.k, header.n, header.num_blocks);
        let entry = self
            .entries
            .get_mut(&message_id)
            .ok_or_else(|| Error::Other("reassembly entry missing after insert".into()))?;

        if entry.complete_blocks.contains_key(&block_idx) {
            return Ok(Disposition::BlockAlreadyComplete {
                message_id,
                block_idx,
            });
        }

        if let Some(block) = entry.blocks.get(&block_idx) {
            if block.padlen != header.padlen {
                return Err(Error::ErrInconsistentBlockParams {
                    expected: block.padlen,
                    got: header.padlen,
                });
            }
        } else {
            log::debug!(
                "message {} block {} open (padlen {})",
                message_id,
                block_idx,
                header.padlen
            );
            entry
                .blocks
                .insert(block_idx, BlockState::new(n, header.padlen));
        }

        let block = entry
            .blocks
            .get_mut(&block_idx)
            .ok_or_else(|| Error::Other("block state missing after insert".into()))?;

        let slot = &mut block.fragments[header.frag_idx as usize];
        if slot.is_some() {
            return Err(Error::ErrDuplicateFragment {
                block_idx,
                frag_idx: header.frag_idx,
            });
        }
        *slot = Some(fragment);
        block.indices.push(header.frag_idx);

        let received = block.indices.len();
        if received < k as usize {
            return Ok(Disposition::Stored {
                message_id,
                block_idx,
                received,
                needed: k,
            });
        }

        // First crossing of K received fragments; this block decodes
        // exactly once.
        log::debug!(
            "message {} block {}: {}/{} fragments received, decoding",
            message_id,
            block_idx,
            received,
            n
        );
        let pairs: Vec<(u16, Bytes)> = block
            .indices
            .iter()
            .filter_map(|&i| block.fragments[i as usize].clone().map(|f| (i, f)))
            .collect();
        let padlen = block.padlen;

        match fec::decode_block(&pairs, k, n, self.fragment_size, padlen) {
            Ok(data) => {
                entry.blocks.remove(&block_idx);
                entry.complete_blocks.insert(block_idx, data);
            }
            Err(e) => {
                self.entries.remove(&message_id);
                return Err(Error::ErrBlockDecodeFailed {
                    message_id,
                    block_idx,
                    reason: e.to_string(),
                });
            }
        }

        if entry.complete_blocks.len() < num_blocks as usize {
            log::info!(
                "message {} block {} decoded ({}/{} blocks)",
                message_id,
                block_idx,
                entry.complete_blocks.len(),
                num_blocks
            );
            return Ok(Disposition::BlockDecoded {
                message_id,
                block_idx,
            });
        }

        log::info!(
            "message {}: all {} blocks decoded, reconstructing payload",
            message_id,
            num_blocks
        );
        let mut full = BytesMut::new();
        for data in entry.complete_blocks.values() {
            full.extend_from_slice(data);
        }
        let full = full.freeze();

        // The entry is destroyed whether deframing succeeds or not; only a
        // successful delivery enters the completion window.
        self.entries.remove(&message_id);
        let (image, metadata) = payload::deframe(&full)?;
        self.completed.record(message_id);
        Ok(Disposition::Delivered(DeliveredMessage {
            message_id,
            image,
            metadata,
        }))
    }

    fn evict_to_capacity(&mut self) {
        while self.entries.len() >= self.max_inflight {
            match self.order.pop_front() {
                Some(oldest) => {
                    if self.entries.remove(&oldest).is_some() {
                        log::warn!("in-flight bound reached, evicting message {oldest}");
                    }
                }
                None => break,
            }
        }
    }
}
