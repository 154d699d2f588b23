pub mod auth;
pub mod productos;
pub mod ventas;

pub use auth::AuthService;
pub use productos::ProductoService;
pub use ventas::VentaService;
