use arq_lab_abstract::{Endpoint, Message, Packet, SystemContext};

use crate::checksum;

/// Go-Back-N receiving side.
///
/// Accepts exactly the packet carrying `expected_seq_num`; everything else
/// (corruption, duplicates, gaps) is answered with a duplicate
/// acknowledgment of the last successfully processed packet. There is no
/// separate NACK: the stale ack plus the sender's timeout drive recovery.
/// Right after `init`, before any success, that recorded state is the
/// degenerate `ack 0` with an empty payload.
#[derive(Default)]
pub struct GbnReceiver {
    expected_seq_num: u32,
    ack_num: u32,
    payload: String,
}

impl GbnReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next sequence number the receiver will accept.
    pub fn expected_seq_num(&self) -> u32 {
        self.expected_seq_num
    }

    /// Acknowledge the last successfully processed packet. The receiver's
    /// own sequence counter is unused and stays 0.
    fn send_ack(&self, ctx: &mut dyn SystemContext) {
        let checksum = checksum::checksum_for(&self.payload, 0, self.ack_num);
        ctx.send_packet(Packet::new(0, self.ack_num, checksum, self.payload.clone()));
    }
}

impl Endpoint for GbnReceiver {
    fn init(&mut self, _ctx: &mut dyn SystemContext) {
        self.expected_seq_num = 0;
        self.ack_num = 0;
        self.payload = String::new();
    }

    fn on_packet(&mut self, ctx: &mut dyn SystemContext, packet: Packet) {
        if packet.seq_num == self.expected_seq_num && checksum::is_valid(&packet) {
            ctx.log(&format!("received packet seq={}, delivering", packet.seq_num));
            ctx.deliver_data(&packet.payload);
            self.ack_num = packet.seq_num;
            self.payload = packet.payload;
            self.expected_seq_num += 1;
        } else {
            ctx.log(&format!(
                "bad packet seq={} (expected {}), re-acking {}",
                packet.seq_num, self.expected_seq_num, self.ack_num
            ));
        }
        // Acknowledge unconditionally, from the current recorded state.
        self.send_ack(ctx);
    }

    fn on_timer(&mut self, _ctx: &mut dyn SystemContext) {
        // The receiver owns no timer.
    }

    fn on_app_data(&mut self, _ctx: &mut dyn SystemContext, _message: Message) {
        // Data flows one way; the receiving application never sends.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::RecordingContext;

    fn receiver() -> (GbnReceiver, RecordingContext) {
        let mut receiver = GbnReceiver::new();
        let mut ctx = RecordingContext::default();
        receiver.init(&mut ctx);
        (receiver, ctx)
    }

    fn data_packet(seq: u32, payload: &str) -> Packet {
        Packet::new(seq, 0, checksum::checksum_for(payload, seq, 0), payload)
    }

    #[test]
    fn delivers_in_order_and_acks_each_packet() {
        let (mut r, mut ctx) = receiver();
        for (seq, data) in ["A", "B", "C"].iter().enumerate() {
            r.on_packet(&mut ctx, data_packet(seq as u32, data));
        }

        assert_eq!(ctx.delivered, vec!["A", "B", "C"]);
        assert_eq!(r.expected_seq_num(), 3);
        let acks: Vec<u32> = ctx.sent.iter().map(|p| p.ack_num).collect();
        assert_eq!(acks, vec![0, 1, 2]);
        for packet in &ctx.sent {
            assert_eq!(packet.seq_num, 0);
            assert!(checksum::is_valid(packet));
        }
    }

    #[test]
    fn corrupted_packet_triggers_duplicate_ack() {
        let (mut r, mut ctx) = receiver();
        r.on_packet(&mut ctx, data_packet(0, "A"));

        let mut corrupted = data_packet(1, "B");
        corrupted.checksum = !corrupted.checksum;
        r.on_packet(&mut ctx, corrupted);

        assert_eq!(ctx.delivered, vec!["A"]);
        assert_eq!(r.expected_seq_num(), 1);
        let dup = ctx.sent.last().unwrap();
        assert_eq!(dup.ack_num, 0);
        assert_eq!(dup.payload, "A");
        assert!(checksum::is_valid(dup));
    }

    #[test]
    fn pre_success_failure_acks_the_degenerate_initial_state() {
        let (mut r, mut ctx) = receiver();
        let mut corrupted = data_packet(0, "A");
        corrupted.checksum = corrupted.checksum.wrapping_add(1);
        r.on_packet(&mut ctx, corrupted);

        assert!(ctx.delivered.is_empty());
        assert_eq!(r.expected_seq_num(), 0);
        let ack = ctx.sent.last().unwrap();
        assert_eq!(ack.seq_num, 0);
        assert_eq!(ack.ack_num, 0);
        assert_eq!(ack.payload, "");
        assert_eq!(ack.checksum, checksum::checksum_for("", 0, 0));
    }

    #[test]
    fn duplicate_packet_is_reacked_but_not_redelivered() {
        let (mut r, mut ctx) = receiver();
        r.on_packet(&mut ctx, data_packet(0, "A"));
        r.on_packet(&mut ctx, data_packet(0, "A"));

        assert_eq!(ctx.delivered, vec!["A"]);
        assert_eq!(r.expected_seq_num(), 1);
        let acks: Vec<u32> = ctx.sent.iter().map(|p| p.ack_num).collect();
        assert_eq!(acks, vec![0, 0]);
        assert!(ctx.logs.iter().any(|l| l.contains("bad packet seq=0")));
    }

    #[test]
    fn gap_leaves_state_untouched() {
        let (mut r, mut ctx) = receiver();
        r.on_packet(&mut ctx, data_packet(0, "A"));
        // seq 1 lost in the channel; 2 arrives next.
        r.on_packet(&mut ctx, data_packet(2, "C"));

        assert_eq!(ctx.delivered, vec!["A"]);
        assert_eq!(r.expected_seq_num(), 1);
        assert_eq!(ctx.sent.last().unwrap().ack_num, 0);
    }
}
