pub mod completion_instruction;
pub mod fired_bundle;
pub mod priority;

pub use completion_instruction::CompletionInstruction;
pub use fired_bundle::TriggerFiredBundle;
pub use priority::{Priority, DEFAULT_PRIORITY};
