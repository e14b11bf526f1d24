mod verification_orchestrator;

pub use verification_orchestrator::{PipelineStage, VerificationOrchestrator};
