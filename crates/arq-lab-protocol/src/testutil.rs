use arq_lab_abstract::{Packet, SystemContext};

/// Fake host that records everything an endpoint does to it.
#[derive(Default)]
pub struct RecordingContext {
    pub sent: Vec<Packet>,
    pub timer_starts: Vec<u64>,
    pub timer_stops: u32,
    pub delivered: Vec<String>,
    pub logs: Vec<String>,
    pub time: u64,
}

impl SystemContext for RecordingContext {
    fn send_packet(&mut self, packet: Packet) {
        self.sent.push(packet);
    }

    fn start_timer(&mut self, delay: u64) {
        self.timer_starts.push(delay);
    }

    fn stop_timer(&mut self) {
        self.timer_stops += 1;
    }

    fn deliver_data(&mut self, payload: &str) {
        self.delivered.push(payload.to_string());
    }

    fn log(&mut self, message: &str) {
        self.logs.push(message.to_string());
    }

    fn now(&self) -> u64 {
        self.time
    }
}
