use arq_lab_abstract::SimConfig;
use serde::Serialize;

use crate::engine::LinkEventSummary;

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub config: SimConfig,
    pub duration: u64,
    pub delivered_data: Vec<String>,
    pub sender_packet_count: u32,
    pub link_events: Vec<LinkEventSummary>,
}
