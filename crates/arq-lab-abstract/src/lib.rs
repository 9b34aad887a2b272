pub mod config;
pub mod interface;
pub mod message;
pub mod packet;
pub mod scenario;

pub use interface::{Endpoint, SystemContext};
pub use message::Message;
pub use packet::{MAX_DATA_SIZE, Packet};

pub use config::SimConfig;
pub use scenario::{SimConfigOverride, TestAction, TestAssertion, TestScenario};
