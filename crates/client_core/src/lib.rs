pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod narration;
pub mod session;
pub mod trivia;
pub mod types;

pub use backend::{BackendApi, HttpBackend};
pub use config::{load_settings, Settings};
pub use controller::UploadResultController;
pub use error::ClientError;
pub use session::{SelectOutcome, UploadSession, REJECTION_MESSAGE};
pub use shared::domain::{SelectionId, SubmitMode};
pub use trivia::{TriviaPoller, TriviaUpdate};
pub use types::{AnalysisResult, ControllerSnapshot, FileCandidate, ProcessingState};
