use std::collections::VecDeque;

use arq_lab_abstract::{Endpoint, Message, Packet, SystemContext};

use crate::checksum;

/// Upper bound on outstanding (sent but unacknowledged) packets.
pub const WINDOW_SIZE: u32 = 8;
/// Retransmission timeout in simulated time units.
pub const RETRANSMIT_TIMEOUT: u64 = 40;
/// Messages waiting for a free window slot beyond this count are dropped.
pub const MESSAGE_QUEUE_CAPACITY: usize = 50;

/// Go-Back-N sending side.
///
/// Window state is the classic pair `send_base`/`next_seq_num`; every packet
/// in `[send_base, next_seq_num)` sits in the retransmission buffer, indexed
/// by its raw sequence number. Sequence numbers never wrap and the buffer is
/// never trimmed, so acknowledged packets stay behind `send_base` unused.
/// The single retransmission timer is armed exactly while packets are
/// outstanding.
#[derive(Default)]
pub struct GbnSender {
    send_base: u32,
    next_seq_num: u32,
    packet_buf: Vec<Packet>,
    message_buf: VecDeque<Message>,
}

impl GbnSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oldest unacknowledged sequence number.
    pub fn send_base(&self) -> u32 {
        self.send_base
    }

    /// Next sequence number to assign.
    pub fn next_seq_num(&self) -> u32 {
        self.next_seq_num
    }

    /// Messages waiting for a free window slot.
    pub fn queued_messages(&self) -> usize {
        self.message_buf.len()
    }

    fn window_open(&self) -> bool {
        self.next_seq_num < self.send_base + WINDOW_SIZE
    }

    /// Frame and transmit one message. Caller guarantees a free window slot.
    fn transmit(&mut self, ctx: &mut dyn SystemContext, message: Message) {
        let seq_num = self.next_seq_num;
        let payload = message.into_data();
        // Data packets carry a constant ack field of 0; acknowledgment flows
        // receiver-to-sender only.
        let checksum = checksum::checksum_for(&payload, seq_num, 0);
        let packet = Packet::new(seq_num, 0, checksum, payload);

        ctx.log(&format!("sending packet seq={seq_num}"));
        ctx.send_packet(packet.clone());
        self.packet_buf.push(packet);

        if self.send_base == self.next_seq_num {
            // First outstanding packet: arm the retransmission timer.
            ctx.start_timer(RETRANSMIT_TIMEOUT);
        }
        self.next_seq_num += 1;
    }

    /// Move queued messages into newly freed window slots.
    fn drain_queue(&mut self, ctx: &mut dyn SystemContext) {
        while self.window_open() {
            let Some(message) = self.message_buf.pop_front() else {
                break;
            };
            self.transmit(ctx, message);
        }
    }
}

impl Endpoint for GbnSender {
    fn init(&mut self, _ctx: &mut dyn SystemContext) {
        self.send_base = 0;
        self.next_seq_num = 0;
        self.packet_buf.clear();
        self.message_buf.clear();
    }

    fn on_app_data(&mut self, ctx: &mut dyn SystemContext, message: Message) {
        if self.message_buf.len() >= MESSAGE_QUEUE_CAPACITY {
            // Silent-drop policy: the application gets no failure signal.
            ctx.log("message queue full, refusing to send message");
            return;
        }

        if self.window_open() {
            self.transmit(ctx, message);
        } else {
            self.message_buf.push_back(message);
        }
    }

    fn on_packet(&mut self, ctx: &mut dyn SystemContext, packet: Packet) {
        if checksum::is_valid(&packet) && packet.ack_num >= self.send_base {
            // Cumulative ack: everything up to and including ack_num is done.
            self.send_base = packet.ack_num + 1;
            ctx.stop_timer();
            if self.send_base != self.next_seq_num {
                ctx.start_timer(RETRANSMIT_TIMEOUT);
            }
            ctx.log(&format!(
                "ack {} accepted, window base now {}",
                packet.ack_num, self.send_base
            ));
        } else {
            // Recovery relies entirely on the timeout path.
            ctx.log(&format!("ignoring invalid or stale ack {}", packet.ack_num));
        }

        self.drain_queue(ctx);
    }

    fn on_timer(&mut self, ctx: &mut dyn SystemContext) {
        ctx.start_timer(RETRANSMIT_TIMEOUT);
        ctx.log(&format!(
            "timeout, resending window [{}, {})",
            self.send_base, self.next_seq_num
        ));
        // Go-Back-N: resend the entire outstanding window in order.
        for seq in self.send_base..self.next_seq_num {
            ctx.send_packet(self.packet_buf[seq as usize].clone());
        }
    }
}
