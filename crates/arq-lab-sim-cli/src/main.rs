use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use arq_lab_abstract::{MAX_DATA_SIZE, Message, SimConfig};
use arq_lab_protocol::{GbnReceiver, GbnSender};
use arq_lab_simulator::{SimulationReport, Simulator, scenario_runner};

#[derive(Parser, Debug)]
#[command(author, version, about = "Go-Back-N ARQ lab simulator")]
struct Args {
    /// Run a TOML scenario from disk (actions, faults, assertions).
    #[arg(long, conflicts_with = "send")]
    scenario: Option<PathBuf>,

    /// Ad-hoc messages to send, one packet's worth each. May be repeated.
    #[arg(long)]
    send: Vec<String>,

    /// Simulated time units between ad-hoc messages.
    #[arg(long, default_value_t = 5)]
    send_interval: u64,

    /// Probability that the channel drops a packet.
    #[arg(long, default_value_t = 0.0)]
    loss_rate: f64,

    /// Probability that the channel corrupts a packet.
    #[arg(long, default_value_t = 0.0)]
    corrupt_rate: f64,

    /// Minimum one-way channel latency in simulated time units.
    #[arg(long, default_value_t = 1)]
    min_latency: u64,

    /// Maximum one-way channel latency in simulated time units.
    #[arg(long, default_value_t = 10)]
    max_latency: u64,

    /// Seed for the channel's random loss, corruption and latency.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Write a JSON trace of the finished simulation.
    #[arg(long)]
    trace_out: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    info!("arq-lab-sim-cli starting…");

    let sender = Box::new(GbnSender::new());
    let receiver = Box::new(GbnReceiver::new());

    let report = if let Some(path) = &args.scenario {
        scenario_runner::run_scenario(path, sender, receiver)
            .with_context(|| format!("Scenario {} failed", path.display()))?
    } else {
        run_adhoc(&args, sender, receiver)
    };

    info!(
        "Simulation complete: {} payloads delivered, {} packets sent, {} time units",
        report.delivered_data.len(),
        report.sender_packet_count,
        report.duration
    );

    if let Some(trace_path) = &args.trace_out {
        write_trace(trace_path, &report)?;
    }

    Ok(())
}

fn run_adhoc(
    args: &Args,
    sender: Box<GbnSender>,
    receiver: Box<GbnReceiver>,
) -> SimulationReport {
    let config = SimConfig {
        loss_rate: args.loss_rate,
        corrupt_rate: args.corrupt_rate,
        min_latency: args.min_latency,
        max_latency: args.max_latency,
        seed: args.seed,
    };
    let mut sim = Simulator::new(config, sender, receiver);

    let messages: Vec<String> = if args.send.is_empty() {
        (1..=3).map(|i| format!("Packet {i}")).collect()
    } else {
        args.send.clone()
    };
    for (i, data) in messages.into_iter().enumerate() {
        if data.len() > MAX_DATA_SIZE {
            warn!("message {i} exceeds {MAX_DATA_SIZE} bytes, skipping");
            continue;
        }
        sim.schedule_app_send(i as u64 * args.send_interval, Message::new(data));
    }

    info!("Starting headless simulation…");
    sim.run_until_complete();
    sim.export_report()
}

fn write_trace(path: &Path, report: &SimulationReport) -> Result<()> {
    let data = serde_json::to_vec_pretty(report).context("Failed to serialize simulation trace")?;
    fs::write(path, &data)
        .with_context(|| format!("Failed to write trace file {}", path.display()))?;
    Ok(())
}
