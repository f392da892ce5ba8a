use bytes::{Bytes, BytesMut};
use tokio::net::UdpSocket;
use tokio::time::sleep;

use crate::config::TransportConfig;
use crate::error::Result;
use crate::fec;
use crate::fragment::{FragmentHeader, HEADER_SIZE};
use crate::params::{self, CodeParams};
use crate::payload;

/// One message encoded into wire-ready datagrams.
#[derive(Debug, Clone)]
pub struct EncodedMessage {
    pub message_id: u32,
    pub params: CodeParams,
    pub datagrams: Vec<Bytes>,
}

/// Frame an `(image, metadata)` pair, pick code parameters for it, and
/// encode the lot into datagrams.
pub fn encode_message(
    message_id: u32,
    image: &[u8],
    metadata: &[u8],
    config: &TransportConfig,
) -> Result<EncodedMessage> {
    let payload = payload::frame(image, metadata);
    let params = params::select(payload.len(), config)?;
    encode_with_params(message_id, &payload, params, config.fragment_size)
}

/// Stripe a framed payload across blocks and erasure-code each block with
/// the given parameters.
///
/// The terminal block is right-padded with zero bytes to reach the block
/// payload size; its pad length rides in every one of its fragment headers.
pub fn encode_with_params(
    message_id: u32,
    payload: &Bytes,
    params: CodeParams,
    fragment_size: usize,
) -> Result<EncodedMessage> {
    let mut datagrams =
        Vec::with_capacity(params.num_blocks as usize * params.n as usize);

    for block_idx in 0..u32::from(params.num_blocks) {
        let start = block_idx as usize * params.block_payload_size;
        let end = (start + params.block_payload_size).min(payload.len());
        let padlen = (params.block_payload_size - (end - start)) as u32;

        let mut block = BytesMut::with_capacity(params.block_payload_size);
        block.extend_from_slice(&payload[start..end]);
        block.resize(params.block_payload_size, 0);

        let fragments = fec::encode_block(&block, params.k, params.n, fragment_size)?;

        for (frag_idx, fragment) in fragments.into_iter().enumerate() {
            let header = FragmentHeader {
                message_id,
                frag_idx: frag_idx as u16,
                n: params.n,
                k: params.k,
                padlen,
                block_idx,
                num_blocks: params.num_blocks,
            };

            let mut datagram = BytesMut::with_capacity(HEADER_SIZE + fragment_size);
            header.marshal_to(&mut datagram)?;
            datagram.extend_from_slice(&fragment);
            datagrams.push(datagram.freeze());
        }
    }

    Ok(EncodedMessage {
        message_id,
        params,
        datagrams,
    })
}

/// Emit every datagram of a message to the socket's connected peer, pacing
/// with a fixed inter-datagram delay and draining briefly after the last
/// one. No retries, no feedback.
pub async fn send_message(
    sock: &UdpSocket,
    message: &EncodedMessage,
    config: &TransportConfig,
) -> Result<()> {
    log::info!(
        "message {}: sending {} datagrams ({})",
        message.message_id,
        message.datagrams.len(),
        message.params
    );

    for datagram in &message.datagrams {
        sock.send(datagram).await?;
        sleep(config.pacing_delay).await;
    }

    // Let the kernel drain its queue before the caller releases the socket.
    sleep(config.drain_delay).await;
    Ok(())
}

#[cfg(test)]
mod sender_test;
