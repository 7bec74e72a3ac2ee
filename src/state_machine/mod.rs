// State machine module for the content lifecycle
//
// Owns the legal states and transitions for a content item, independent of
// how a transition is requested. The queue engine, approval resolution and
// publish driver all go through this module rather than writing `state`.

pub mod content_state_machine;
pub mod errors;
pub mod events;
pub mod states;

pub use content_state_machine::ContentStateMachine;
pub use errors::{StateMachineError, StateMachineResult};
pub use events::ContentEvent;
pub use states::ContentState;
