//! External registry integrations.

pub mod gateway_client {
    pub use crate::gateway_client::*;
}

pub mod registry_models {
    pub use crate::registry_models::*;
}
