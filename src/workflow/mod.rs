pub mod session;
pub mod task_session;

pub use session::{Phase, SessionController, SessionDeps, SessionEvent, SessionState};
pub use task_session::{
    ItemState, JudgmentDraft, JudgmentField, StepOutcome, TaskSession, ValidationErrors,
};
