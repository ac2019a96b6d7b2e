pub mod git;
pub mod hygiene;
pub mod redact;
pub mod render;

mod dispatch;
mod manual;
mod parse;

pub use dispatch::{
    gate, hook_entrypoint_from_stdin, CheckpointOutcome, Dispatcher, HookResult, Reply,
    SessionHooks, SessionPhase, SkipReason,
};
pub use manual::{SessionStatus, SessionTarget};
pub use parse::events_from_hook;
pub use render::Trigger;
