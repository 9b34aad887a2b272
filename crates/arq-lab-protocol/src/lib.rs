//! Go-Back-N ARQ endpoints for the lab simulator.
//!
//! The sender fragments application messages into sequence-numbered
//! packets, keeps at most [`sender::WINDOW_SIZE`] of them outstanding and
//! retransmits the whole window on timeout; the receiver delivers payloads
//! in order and answers every packet with a cumulative acknowledgment.
//! Both sides talk to the outside world only through
//! [`arq_lab_abstract::SystemContext`].

pub mod checksum;
pub mod receiver;
pub mod sender;

pub use receiver::GbnReceiver;
pub use sender::{GbnSender, MESSAGE_QUEUE_CAPACITY, RETRANSMIT_TIMEOUT, WINDOW_SIZE};

#[cfg(test)]
pub(crate) mod testutil;
