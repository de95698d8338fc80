// Domain-layer modules and shared errors/models
pub mod classifier {
    pub use crate::classifier::*;
}

pub mod engine {
    pub use crate::engine::*;
}

pub mod normalizer {
    pub use crate::normalizer::*;
}

pub mod orchestrator {
    pub use crate::orchestrator::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod errors {
    pub use crate::errors::*;
}
