use std::net::SocketAddr;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

use crate::config::TransportConfig;
use crate::error::{Error, Result};
use crate::fragment::HEADER_SIZE;
use crate::reassembly::{DeliveredMessage, Disposition, ReassemblyTable};

/// The receiving endpoint: a bound socket plus the reassembly table it
/// feeds. Completed messages are handed to the consumer over a channel; the
/// loop itself never touches the sinks.
pub struct Receiver {
    sock: UdpSocket,
    table: ReassemblyTable,
    datagram_size: usize,
}

impl Receiver {
    /// Bind `addr` with an enlarged receive buffer so bursts survive while
    /// the loop is busy decoding.
    pub fn bind(addr: SocketAddr, config: &TransportConfig) -> Result<Self> {
        let domain = Domain::for_address(addr);
        let sock = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
        sock.set_recv_buffer_size(config.recv_buffer_size)?;
        sock.set_nonblocking(true)?;
        sock.bind(&addr.into())?;

        let sock = UdpSocket::from_std(sock.into())?;
        log::info!("listening on {addr}");

        Ok(Receiver {
            sock,
            table: ReassemblyTable::new(config),
            datagram_size: HEADER_SIZE + config.fragment_size,
        })
    }

    /// Local address the socket actually bound.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.sock.local_addr()?)
    }

    /// Run the receive loop until the socket fails or the consumer goes
    /// away. One datagram is consumed per iteration; all table mutation
    /// happens between reads.
    ///
    /// Transport violations are logged and dropped, a failed block decode
    /// discards its message, and a deframe failure on a reconstructed
    /// payload is fatal: that policy lives here, not in the table.
    pub async fn run(mut self, delivery: mpsc::Sender<DeliveredMessage>) -> Result<()> {
        // One byte beyond the invariant datagram length so oversized
        // datagrams show up as a length violation instead of silent
        // truncation.
        let mut buf = vec![0u8; self.datagram_size + 1];

        loop {
            let len = match self.sock.recv(&mut buf).await {
                Ok(len) => len,
                Err(e) => {
                    log::info!("receive socket closed: {e}");
                    return Ok(());
                }
            };

            match self.table.handle_datagram(&buf[..len]) {
                Ok(Disposition::Delivered(message)) => {
                    log::info!(
                        "message {} delivered: {} image bytes, {} metadata bytes",
                        message.message_id,
                        message.image.len(),
                        message.metadata.len()
                    );
                    if delivery.send(message).await.is_err() {
                        log::info!("delivery channel closed, stopping receive loop");
                        return Ok(());
                    }
                }
                Ok(Disposition::AlreadyDelivered { message_id }) => {
                    log::debug!("message {message_id} already delivered, ignoring fragment");
                }
                Ok(Disposition::BlockAlreadyComplete { .. })
                | Ok(Disposition::BlockDecoded { .. })
                | Ok(Disposition::Stored { .. }) => {}
                Err(e @ Error::ErrBlockDecodeFailed { .. }) => {
                    log::warn!("discarding message: {e}");
                }
                Err(
                    e @ (Error::ErrPayloadTooShort | Error::ErrImageLengthOutOfRange { .. }),
                ) => {
                    // A payload that reconstructed but cannot be deframed
                    // means the pipeline's own guarantees were violated.
                    log::error!("fatal: {e}");
                    return Err(e);
                }
                Err(e) => {
                    log::warn!("dropping fragment: {e}");
                }
            }
        }
    }
}

#[cfg(test)]
mod receiver_test;
