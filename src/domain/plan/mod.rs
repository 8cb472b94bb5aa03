pub mod entity;
pub mod invariants;

pub use entity::{
    ExecutionReport, PlanStatus, RecognizeMediaFilePlan, RecognizedFile, RejectionReason,
    RenameFilesPlan, RenameTask, TaskResult,
};
pub use invariants::{validate_recognize_plan, validate_rename_plan};
