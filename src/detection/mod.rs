pub mod controller;
pub mod debouncer;
pub mod state;

pub use controller::{DetectionController, SubmitError, SubmitOutcome};
pub use debouncer::{DebounceFire, Debouncer};
pub use state::{DetectionRequest, DetectionSnapshot, DetectionState};
