use crate::trace::SimulationReport;
use arq_lab_abstract::{Endpoint, Message, Packet, SimConfig, SystemContext};
use rand::Rng;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    Sender,
    Receiver,
}

impl NodeId {
    pub fn peer(&self) -> Self {
        match self {
            NodeId::Sender => NodeId::Receiver,
            NodeId::Receiver => NodeId::Sender,
        }
    }
}

#[derive(Debug)]
pub enum EventType {
    PacketArrival {
        to: NodeId,
        packet: Packet,
    },
    TimerExpiry {
        node: NodeId,
        generation: u64,
    },
    AppSend {
        message: Message,
    },
}

#[derive(Debug)]
struct Event {
    time: u64,
    event_type: EventType,
    id: u64, // Unique ID to differentiate events at same time
}

// Custom Ord for Min-Heap (smallest time pops first)
impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.id == other.id
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse comparison for time: smallest time is Greater in BinaryHeap
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// A compact textual summary of important link-layer events.
#[derive(Debug, Clone, Serialize)]
pub struct LinkEventSummary {
    pub time: u64,
    pub description: String,
}

/// Actions buffered during an endpoint's handler call
#[derive(Default)]
struct ActionBuffer {
    outgoing_packets: Vec<Packet>,
    timer_starts: Vec<u64>,
    timer_cancels: u32,
    logs: Vec<String>,
    delivered_data: Vec<String>,
}

/// Context implementation passed to the endpoint
struct ScopedContext<'a> {
    buffer: &'a mut ActionBuffer,
    now: u64,
}

impl<'a> SystemContext for ScopedContext<'a> {
    fn send_packet(&mut self, packet: Packet) {
        self.buffer.outgoing_packets.push(packet);
    }

    fn start_timer(&mut self, delay: u64) {
        self.buffer.timer_starts.push(delay);
    }

    fn stop_timer(&mut self) {
        self.buffer.timer_cancels += 1;
    }

    fn deliver_data(&mut self, payload: &str) {
        self.buffer.delivered_data.push(payload.to_string());
    }

    fn log(&mut self, message: &str) {
        self.buffer.logs.push(message.to_string());
    }

    fn now(&self) -> u64 {
        self.now
    }
}

pub struct Simulator {
    time: u64,
    event_queue: BinaryHeap<Event>,
    event_id_counter: u64,

    config: SimConfig,
    rng: rand::rngs::StdRng,

    pub sender: Box<dyn Endpoint>,
    pub receiver: Box<dyn Endpoint>,

    // Stats for grading / assertions
    pub delivered_data: Vec<String>,
    pub sender_packet_count: u32,

    // Deterministic fault injection, each consumed on first match
    drop_sender_seq_once: Vec<u32>,
    drop_receiver_ack_once: Vec<u32>,
    corrupt_sender_seq_once: Vec<u32>,

    /// Timeline of link events (drops, corruptions, sends, deliveries).
    pub link_events: Vec<LinkEventSummary>,

    /// One single-shot timer per node; cancellation bumps the generation so
    /// stale expiry events are skipped.
    timer_generations: HashMap<NodeId, u64>,

    /// Latest scheduled arrival per destination. The channel loses and
    /// corrupts packets but never reorders them, so arrivals are clamped to
    /// be nondecreasing per direction.
    last_arrival: HashMap<NodeId, u64>,
}

impl Simulator {
    pub fn new(config: SimConfig, sender: Box<dyn Endpoint>, receiver: Box<dyn Endpoint>) -> Self {
        use rand::SeedableRng;
        let rng = rand::rngs::StdRng::seed_from_u64(config.seed);

        Self {
            time: 0,
            event_queue: BinaryHeap::new(),
            event_id_counter: 0,
            config,
            rng,
            sender,
            receiver,
            delivered_data: Vec::new(),
            sender_packet_count: 0,
            drop_sender_seq_once: Vec::new(),
            drop_receiver_ack_once: Vec::new(),
            corrupt_sender_seq_once: Vec::new(),
            link_events: Vec::new(),
            timer_generations: HashMap::new(),
            last_arrival: HashMap::new(),
        }
    }

    /// Register a deterministic fault: drop the first data packet whose seq equals `seq`.
    pub fn add_drop_sender_seq_once(&mut self, seq: u32) {
        self.drop_sender_seq_once.push(seq);
    }

    /// Register a deterministic fault: drop the first ACK whose ack equals `ack`.
    pub fn add_drop_receiver_ack_once(&mut self, ack: u32) {
        self.drop_receiver_ack_once.push(ack);
    }

    /// Register a deterministic fault: corrupt the first data packet whose seq equals `seq`.
    pub fn add_corrupt_sender_seq_once(&mut self, seq: u32) {
        self.corrupt_sender_seq_once.push(seq);
    }

    /// Expose current simulation config (for diagnostics)
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// All payloads delivered to the receiving application so far, joined.
    pub fn received_data(&self) -> String {
        self.delivered_data.concat()
    }

    fn push_event(&mut self, time: u64, event_type: EventType) {
        self.event_queue.push(Event {
            time,
            event_type,
            id: self.event_id_counter,
        });
        self.event_id_counter += 1;
    }

    pub fn schedule_app_send(&mut self, time: u64, message: Message) {
        self.push_event(time, EventType::AppSend { message });
    }

    pub fn init(&mut self) {
        {
            let mut buffer = ActionBuffer::default();
            let mut ctx = ScopedContext {
                buffer: &mut buffer,
                now: self.time,
            };
            self.sender.init(&mut ctx);
            self.process_actions(NodeId::Sender, buffer);
        }
        {
            let mut buffer = ActionBuffer::default();
            let mut ctx = ScopedContext {
                buffer: &mut buffer,
                now: self.time,
            };
            self.receiver.init(&mut ctx);
            self.process_actions(NodeId::Receiver, buffer);
        }
    }

    pub fn current_time(&self) -> u64 {
        self.time
    }

    /// Process the next event. Returns true if an event was processed, false if queue is empty.
    pub fn step(&mut self) -> bool {
        let event = match self.event_queue.pop() {
            Some(e) => e,
            None => return false,
        };

        self.time = event.time;
        debug!("Processing event at {}: {:?}", self.time, event.event_type);

        match event.event_type {
            EventType::PacketArrival { to, packet } => {
                let mut buffer = ActionBuffer::default();
                {
                    let mut ctx = ScopedContext {
                        buffer: &mut buffer,
                        now: self.time,
                    };
                    match to {
                        NodeId::Sender => self.sender.on_packet(&mut ctx, packet),
                        NodeId::Receiver => self.receiver.on_packet(&mut ctx, packet),
                    }
                }
                self.process_actions(to, buffer);
            }
            EventType::TimerExpiry { node, generation } => {
                // A cancelled timer must never call back; compare generations.
                match self.timer_generations.get(&node) {
                    Some(&current) if current == generation => {}
                    _ => {
                        debug!("Skipping cancelled timer event for {:?}", node);
                        return true; // Event processed (by being ignored)
                    }
                }

                let mut buffer = ActionBuffer::default();
                {
                    let mut ctx = ScopedContext {
                        buffer: &mut buffer,
                        now: self.time,
                    };
                    match node {
                        NodeId::Sender => self.sender.on_timer(&mut ctx),
                        NodeId::Receiver => self.receiver.on_timer(&mut ctx),
                    }
                }
                self.process_actions(node, buffer);
            }
            EventType::AppSend { message } => {
                let mut buffer = ActionBuffer::default();
                {
                    let mut ctx = ScopedContext {
                        buffer: &mut buffer,
                        now: self.time,
                    };
                    self.sender.on_app_data(&mut ctx, message);
                }
                self.process_actions(NodeId::Sender, buffer);
            }
        }
        true
    }

    /// Produce a serializable snapshot of the current simulation state.
    pub fn export_report(&self) -> SimulationReport {
        SimulationReport {
            config: self.config.clone(),
            duration: self.time,
            delivered_data: self.delivered_data.clone(),
            sender_packet_count: self.sender_packet_count,
            link_events: self.link_events.clone(),
        }
    }

    pub fn run_until_complete(&mut self) {
        self.init();
        while self.step() {}
    }

    fn process_actions(&mut self, source_node: NodeId, buffer: ActionBuffer) {
        for log in buffer.logs {
            info!("[{:?}] {}", source_node, log);
        }

        for payload in buffer.delivered_data {
            info!("[{:?}] DELIVERED DATA: {} bytes", source_node, payload.len());
            self.link_events.push(LinkEventSummary {
                time: self.time,
                description: format!(
                    "[{:?}] DELIVERED {:?} to application",
                    source_node, payload
                ),
            });
            self.delivered_data.push(payload);
        }

        // Cancellations first, so a stop-then-start inside one handler
        // re-arms cleanly under the new generation.
        for _ in 0..buffer.timer_cancels {
            let generation = self.timer_generations.entry(source_node).or_insert(0);
            *generation += 1;
        }

        for delay in buffer.timer_starts {
            let generation = *self.timer_generations.entry(source_node).or_insert(0);
            self.push_event(
                self.time + delay,
                EventType::TimerExpiry {
                    node: source_node,
                    generation,
                },
            );
        }

        // Packet transmission logic (channel)
        for mut packet in buffer.outgoing_packets {
            if source_node == NodeId::Sender {
                self.sender_packet_count += 1;

                if let Some(pos) = self
                    .drop_sender_seq_once
                    .iter()
                    .position(|s| *s == packet.seq_num)
                {
                    self.link_events.push(LinkEventSummary {
                        time: self.time,
                        description: format!(
                            "[Sender->Receiver] DROP (deterministic seq) seq={}",
                            packet.seq_num
                        ),
                    });
                    debug!("Deterministically dropping data packet seq={}", packet.seq_num);
                    self.drop_sender_seq_once.remove(pos);
                    continue;
                }

                if let Some(pos) = self
                    .corrupt_sender_seq_once
                    .iter()
                    .position(|s| *s == packet.seq_num)
                {
                    self.link_events.push(LinkEventSummary {
                        time: self.time,
                        description: format!(
                            "[Sender->Receiver] CORRUPT (deterministic seq) seq={}",
                            packet.seq_num
                        ),
                    });
                    debug!("Deterministically corrupting data packet seq={}", packet.seq_num);
                    self.corrupt_sender_seq_once.remove(pos);
                    packet.checksum = !packet.checksum;
                }
            }

            if source_node == NodeId::Receiver
                && let Some(pos) = self
                    .drop_receiver_ack_once
                    .iter()
                    .position(|a| *a == packet.ack_num)
            {
                self.link_events.push(LinkEventSummary {
                    time: self.time,
                    description: format!(
                        "[Receiver->Sender] DROP (deterministic ack) ack={}",
                        packet.ack_num
                    ),
                });
                debug!("Deterministically dropping ACK ack={}", packet.ack_num);
                self.drop_receiver_ack_once.remove(pos);
                continue;
            }

            // 1. Check loss
            if self.rng.random::<f64>() < self.config.loss_rate {
                self.link_events.push(LinkEventSummary {
                    time: self.time,
                    description: format!(
                        "[{:?}->{:?}] DROP (random loss) seq={} ack={}",
                        source_node,
                        source_node.peer(),
                        packet.seq_num,
                        packet.ack_num
                    ),
                });
                debug!("Packet lost in channel");
                continue;
            }

            // 2. Check corruption
            if self.rng.random::<f64>() < self.config.corrupt_rate {
                self.link_events.push(LinkEventSummary {
                    time: self.time,
                    description: format!(
                        "[{:?}->{:?}] CORRUPT seq={} ack={}",
                        source_node,
                        source_node.peer(),
                        packet.seq_num,
                        packet.ack_num
                    ),
                });
                debug!("Packet corrupted in channel");
                // Simple corruption: flip the checksum to make it invalid
                packet.checksum = !packet.checksum;
            }

            // 3. Latency, clamped so the channel never reorders a direction
            let latency = self
                .rng
                .random_range(self.config.min_latency..=self.config.max_latency);
            let target_node = source_node.peer();
            let earliest = self.last_arrival.get(&target_node).copied().unwrap_or(0);
            let arrival_time = (self.time + latency).max(earliest);
            self.last_arrival.insert(target_node, arrival_time);

            self.link_events.push(LinkEventSummary {
                time: self.time,
                description: format!(
                    "[{:?}->{:?}] SEND seq={} ack={} len={} (latency={})",
                    source_node,
                    target_node,
                    packet.seq_num,
                    packet.ack_num,
                    packet.len(),
                    arrival_time - self.time
                ),
            });

            self.push_event(
                arrival_time,
                EventType::PacketArrival {
                    to: target_node,
                    packet,
                },
            );
        }
    }
}
