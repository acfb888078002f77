mod farm_api;

use std::sync::Arc;

pub use farm_api::FarmApi;

use crate::domain::models::BackendBox;

pub struct BackendManager {}

impl BackendManager {
    /// The configured farm assistant server.
    pub fn get() -> BackendBox {
        return Arc::new(FarmApi::default());
    }
}
