// Orchestration drivers
//
// The pieces that sit between external triggers and the core components:
// intake for inbound messages, the publish driver for the periodic tick,
// and the lineup reporter for the schedule snapshot.

pub mod intake;
pub mod lineup;
pub mod publish_driver;

pub use intake::{InboundTrigger, IntakeError, IntakeOutcome, IntakeProcessor, IntakeResult};
pub use lineup::{CategoryLineup, LineupEntry, LineupError, LineupReport, LineupReporter};
pub use publish_driver::{PublishDriver, PublishError, TickOutcome};
