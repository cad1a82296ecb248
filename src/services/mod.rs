pub mod export;
pub mod introduction;
pub mod qualification;
pub mod shuffler;
pub mod work_assigner;

pub use export::ResultExporter;
pub use introduction::{IntroProgress, IntroductionSequencer};
pub use qualification::{QualificationEvaluator, QualificationOutcome};
pub use shuffler::{SeededShuffler, Shuffler};
pub use work_assigner::{BatchWindow, WorkAssigner};
