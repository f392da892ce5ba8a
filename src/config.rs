use std::time::Duration;

/// Transport-wide parameters, constructed once at startup and shared by the
/// sender and receiver endpoints.
///
/// Both ends of a link must agree on `fragment_size`; everything else is
/// local policy.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Size in bytes of every coded fragment, and therefore of every
    /// datagram body. Identical at both ends.
    pub fragment_size: usize,
    /// Fraction of parity fragments added per block (N = K + floor(K * r)).
    pub target_redundancy: f64,
    /// Upper bound on total fragments per block. The GF(2^8) code cannot
    /// exceed 256 shards.
    pub max_n: u16,
    /// Lower bound on data fragments per block.
    pub min_k: u16,
    /// Delay inserted between consecutive datagrams to smooth bursts.
    pub pacing_delay: Duration,
    /// Delay after the final datagram before the send socket is released,
    /// so the kernel can drain its queue.
    pub drain_delay: Duration,
    /// Requested SO_RCVBUF for the receive socket.
    pub recv_buffer_size: usize,
    /// Maximum messages the reassembly table keeps in flight. A new message
    /// beyond this bound evicts the oldest in-flight entry.
    pub max_inflight_messages: usize,
    /// Capacity of the delivered-message id window used to reject late
    /// fragments.
    pub completion_window: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            fragment_size: 1024,
            target_redundancy: 0.25,
            max_n: 256,
            min_k: 16,
            pacing_delay: Duration::from_millis(1),
            drain_delay: Duration::from_millis(250),
            recv_buffer_size: 4 * 1024 * 1024,
            max_inflight_messages: 64,
            completion_window: 1024,
        }
    }
}
