//! Block-striped FEC transport for lossy one-way datagram links.
//!
//! A sender frames a compressed still image and a small metadata document
//! into one payload, stripes the payload across fixed-size blocks, expands
//! each block with a systematic erasure code, and emits every coded
//! fragment as its own datagram. The receiver accounts fragments per
//! message and per block, decodes each block as soon as any K of its N
//! fragments have arrived, and reassembles the payload. Loss, duplication,
//! reordering, and interleaving of messages are all tolerated with no
//! back-channel for retransmission.

#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod fec;
pub mod fragment;
pub mod params;
pub mod payload;
pub mod reassembly;
pub mod receiver;
pub mod sender;

pub use crate::config::TransportConfig;
pub use crate::error::{Error, Result};
pub use crate::fragment::{FragmentHeader, HEADER_SIZE};
pub use crate::params::CodeParams;
pub use crate::reassembly::{DeliveredMessage, Disposition, ReassemblyTable};
pub use crate::receiver::Receiver;
pub use crate::sender::{encode_message, encode_with_params, send_message, EncodedMessage};
