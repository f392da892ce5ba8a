use bytes::Bytes;
use reed_solomon_erasure::{galois_8, ReedSolomon};

use crate::error::{Error, Result};

/// Maximum total fragments per block (data + parity). The GF(2^8) code
/// cannot address more shards than field elements.
pub const MAX_FRAGMENTS: usize = 256;

fn new_codec(k: u16, n: u16) -> Result<ReedSolomon<galois_8::Field>> {
    if k == 0 || k >= n || n as usize > MAX_FRAGMENTS {
        return Err(Error::ErrInvalidCodeParams { k, n });
    }
    ReedSolomon::<galois_8::Field>::new(k as usize, (n - k) as usize)
        .map_err(|_| Error::ErrInvalidCodeParams { k, n })
}

/// Encode one block of exactly `K * fragment_size` bytes into `N` coded
/// fragments of `fragment_size` bytes each.
///
/// The code is systematic: fragments `0..K` are the block data verbatim and
/// `K..N` are parity, so any `K` distinct fragments recover the block.
pub fn encode_block(block: &[u8], k: u16, n: u16, fragment_size: usize) -> Result<Vec<Bytes>> {
    let codec = new_codec(k, n)?;

    let block_payload_size = k as usize * fragment_size;
    if block.len() != block_payload_size {
        return Err(Error::ErrBlockLengthMismatch {
            got: block.len(),
            want: block_payload_size,
        });
    }

    let mut shards: Vec<Vec<u8>> = block
        .chunks(fragment_size)
        .map(<[u8]>::to_vec)
        .collect();
    shards.resize(n as usize, vec![0u8; fragment_size]);

    codec
        .encode(&mut shards)
        .map_err(|e| Error::Other(format!("fec encode: {e}")))?;

    if shards.len() != n as usize {
        return Err(Error::ErrEncoderFragmentCount {
            got: shards.len(),
            want: n as usize,
        });
    }
    for shard in &shards {
        if shard.len() != fragment_size {
            return Err(Error::ErrEncoderFragmentLength {
                got: shard.len(),
                want: fragment_size,
            });
        }
    }

    Ok(shards.into_iter().map(Bytes::from).collect())
}

/// Recover the data portion of a block from any `K` of its `N` fragments.
///
/// `received` pairs each fragment with its index within the block; `padlen`
/// trailing zero bytes are stripped from the recovered data region. Output
/// is deterministic in the inputs.
pub fn decode_block(
    received: &[(u16, Bytes)],
    k: u16,
    n: u16,
    fragment_size: usize,
    padlen: u32,
) -> Result<Bytes> {
    let codec = new_codec(k, n)?;

    let block_payload_size = k as usize * fragment_size;
    if padlen as usize > block_payload_size {
        return Err(Error::Other(format!(
            "padlen {padlen} exceeds block payload size {block_payload_size}"
        )));
    }

    let mut shards: Vec<Option<Vec<u8>>> = vec![None; n as usize];
    for (frag_idx, fragment) in received {
        if *frag_idx >= n {
            return Err(Error::ErrFragmentIndexOutOfRange { frag_idx: *frag_idx, n });
        }
        if fragment.len() != fragment_size {
            return Err(Error::Other(format!(
                "fragment {frag_idx} is {} bytes, expected {fragment_size}",
                fragment.len()
            )));
        }
        shards[*frag_idx as usize] = Some(fragment.to_vec());
    }

    codec
        .reconstruct_data(&mut shards)
        .map_err(|e| Error::Other(format!("fec reconstruct: {e}")))?;

    let mut block = Vec::with_capacity(block_payload_size);
    for shard in shards.iter().take(k as usize) {
        match shard {
            Some(data) => block.extend_from_slice(data),
            None => return Err(Error::Other("data shard missing after reconstruct".into())),
        }
    }

    block.truncate(block_payload_size - padlen as usize);
    Ok(Bytes::from(block))
}
