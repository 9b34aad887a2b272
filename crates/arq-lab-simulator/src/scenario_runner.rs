//! Load a TOML test scenario, drive a simulation and check its assertions.

use std::fs;
use std::path::Path;

use arq_lab_abstract::{Endpoint, Message, SimConfig, TestAction, TestAssertion, TestScenario};
use thiserror::Error;
use tracing::info;

use crate::engine::Simulator;
use crate::trace::SimulationReport;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("scenario '{scenario}': {detail}")]
    AssertionFailed { scenario: String, detail: String },
}

pub fn run_scenario(
    path: &Path,
    sender: Box<dyn Endpoint>,
    receiver: Box<dyn Endpoint>,
) -> Result<SimulationReport, ScenarioError> {
    let content = fs::read_to_string(path)?;
    run_scenario_str(&content, sender, receiver)
}

pub fn run_scenario_str(
    toml_text: &str,
    sender: Box<dyn Endpoint>,
    receiver: Box<dyn Endpoint>,
) -> Result<SimulationReport, ScenarioError> {
    let scenario: TestScenario = toml::from_str(toml_text)?;

    let mut config = SimConfig::default();
    scenario.config.apply_to(&mut config);

    let mut sim = Simulator::new(config, sender, receiver);
    configure_actions(&mut sim, &scenario.actions);

    info!("running scenario '{}': {}", scenario.name, scenario.description);
    sim.run_until_complete();

    let report = sim.export_report();
    check_assertions(&scenario, &report)?;
    Ok(report)
}

pub fn configure_actions(sim: &mut Simulator, actions: &[TestAction]) {
    for action in actions {
        match action {
            TestAction::AppSend { time, data } => {
                sim.schedule_app_send(*time, Message::new(data.clone()));
            }
            TestAction::DropNextFromSenderSeq { seq } => {
                sim.add_drop_sender_seq_once(*seq);
            }
            TestAction::DropNextFromReceiverAck { ack } => {
                sim.add_drop_receiver_ack_once(*ack);
            }
            TestAction::CorruptNextFromSenderSeq { seq } => {
                sim.add_corrupt_sender_seq_once(*seq);
            }
        }
    }
}

fn check_assertions(
    scenario: &TestScenario,
    report: &SimulationReport,
) -> Result<(), ScenarioError> {
    let fail = |detail: String| ScenarioError::AssertionFailed {
        scenario: scenario.name.clone(),
        detail,
    };

    for assertion in &scenario.assertions {
        match assertion {
            TestAssertion::DataDelivered { data } => {
                if !report.delivered_data.iter().any(|d| d == data) {
                    return Err(fail(format!("expected {data:?} to be delivered")));
                }
            }
            TestAssertion::SenderPacketCount { min, max } => {
                let count = report.sender_packet_count;
                if count < *min {
                    return Err(fail(format!("sender sent {count} packets, expected >= {min}")));
                }
                if let Some(max) = max
                    && count > *max
                {
                    return Err(fail(format!("sender sent {count} packets, expected <= {max}")));
                }
            }
            TestAssertion::MaxDuration { time } => {
                if report.duration > *time {
                    return Err(fail(format!(
                        "simulation took {} units, expected <= {time}",
                        report.duration
                    )));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arq_lab_abstract::Packet;

    const SCENARIO: &str = r#"
        name = "smoke"
        description = "one message over a clean channel"

        [config]
        seed = 1
        min_latency = 1
        max_latency = 1

        [[actions]]
        type = "app_send"
        time = 0
        data = "hello"

        [[assertions]]
        type = "data_delivered"
        data = "hello"

        [[assertions]]
        type = "max_duration"
        time = 100
    "#;

    struct Forwarder;

    impl Endpoint for Forwarder {
        fn on_packet(&mut self, ctx: &mut dyn arq_lab_abstract::SystemContext, packet: Packet) {
            ctx.deliver_data(&packet.payload);
        }

        fn on_timer(&mut self, _ctx: &mut dyn arq_lab_abstract::SystemContext) {}

        fn on_app_data(
            &mut self,
            ctx: &mut dyn arq_lab_abstract::SystemContext,
            message: Message,
        ) {
            ctx.send_packet(Packet::new(0, 0, 0, message.into_data()));
        }
    }

    #[test]
    fn scenario_toml_round_trips_through_the_engine() {
        let report = run_scenario_str(SCENARIO, Box::new(Forwarder), Box::new(Forwarder))
            .expect("scenario should pass");
        assert_eq!(report.delivered_data, vec!["hello"]);
    }

    const DROPPED_SCENARIO: &str = r#"
        name = "dropped"
        description = "the only packet is dropped, so delivery must fail"

        [config]
        seed = 1
        min_latency = 1
        max_latency = 1

        [[actions]]
        type = "app_send"
        time = 0
        data = "hello"

        [[actions]]
        type = "drop_next_from_sender_seq"
        seq = 0

        [[assertions]]
        type = "data_delivered"
        data = "hello"
    "#;

    #[test]
    fn failed_assertion_is_reported() {
        let err = run_scenario_str(DROPPED_SCENARIO, Box::new(Forwarder), Box::new(Forwarder))
            .expect_err("dropped packet cannot be delivered");
        assert!(matches!(err, ScenarioError::AssertionFailed { .. }));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = run_scenario_str("not toml at all [", Box::new(Forwarder), Box::new(Forwarder))
            .expect_err("parse must fail");
        assert!(matches!(err, ScenarioError::Parse(_)));
    }
}
