use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

///FragmentHeader is prepended to every coded fragment before it is sent as
///one datagram. All fields are little-endian.
///
/// 0                   1                   2                   3
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///|                          Message Id                           |
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///|        Fragment Index         |               N               |
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///|               K               |            Padlen             |
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///|         Padlen (cont.)        |          Block Index          |
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///|      Block Index (cont.)      |          Num Blocks           |
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///
///The datagram body that follows is exactly `fragment_size` bytes, so every
///datagram on the wire has the invariant length `HEADER_SIZE + fragment_size`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentHeader {
    /// Identifier unique among concurrently in-flight messages.
    pub message_id: u32,
    /// Position of this fragment within its block, in `[0, N)`.
    pub frag_idx: u16,
    /// Total fragments per block after coding.
    pub n: u16,
    /// Data fragments per block.
    pub k: u16,
    /// Zero-padding bytes in this block's data region. Nonzero only on the
    /// terminal block.
    pub padlen: u32,
    /// Position of this block within the message, in `[0, num_blocks)`.
    pub block_idx: u32,
    /// Total blocks in this message.
    pub num_blocks: u16,
}

pub const HEADER_SIZE: usize = 20;

/// makes FragmentHeader printable
impl fmt::Display for FragmentHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "msg {} block {}/{} frag {}/{} (K={}, padlen={})",
            self.message_id,
            self.block_idx,
            self.num_blocks,
            self.frag_idx,
            self.n,
            self.k,
            self.padlen,
        )
    }
}

impl FragmentHeader {
    pub fn unmarshal(raw: &Bytes) -> Result<Self> {
        if raw.len() < HEADER_SIZE {
            return Err(Error::ErrHeaderTooSmall);
        }

        let reader = &mut raw.clone();

        let message_id = reader.get_u32_le();
        let frag_idx = reader.get_u16_le();
        let n = reader.get_u16_le();
        let k = reader.get_u16_le();
        let padlen = reader.get_u32_le();
        let block_idx = reader.get_u32_le();
        let num_blocks = reader.get_u16_le();

        Ok(FragmentHeader {
            message_id,
            frag_idx,
            n,
            k,
            padlen,
            block_idx,
            num_blocks,
        })
    }

    pub fn marshal_to(&self, writer: &mut BytesMut) -> Result<usize> {
        writer.put_u32_le(self.message_id);
        writer.put_u16_le(self.frag_idx);
        writer.put_u16_le(self.n);
        writer.put_u16_le(self.k);
        writer.put_u32_le(self.padlen);
        writer.put_u32_le(self.block_idx);
        writer.put_u16_le(self.num_blocks);
        Ok(writer.len())
    }

    pub fn marshal(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE);
        self.marshal_to(&mut buf)?;
        Ok(buf.freeze())
    }
}

#[cfg(test)]
mod fragment_test;
