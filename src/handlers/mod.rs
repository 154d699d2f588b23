pub mod common;
pub mod productos;
pub mod usuarios;
pub mod ventas;

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::services::{AuthService, ProductoService, VentaService};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub productos: Arc<ProductoService>,
    pub ventas: Arc<VentaService>,
    pub auth: Arc<AuthService>,
}

impl AppServices {
    /// Build the service container from an injected pool and configuration.
    pub fn new(db: Arc<DbPool>, cfg: &AppConfig) -> Self {
        let op_timeout = Duration::from_secs(cfg.db_operation_timeout_secs);
        Self {
            productos: Arc::new(ProductoService::new(db.clone(), op_timeout)),
            ventas: Arc::new(VentaService::new(db.clone(), op_timeout)),
            auth: Arc::new(AuthService::new(db, cfg)),
        }
    }
}
