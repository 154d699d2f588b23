pub mod producto;
pub mod usuario;
pub mod venta;

pub use producto::Entity as Producto;
pub use usuario::Entity as Usuario;
pub use venta::Entity as Venta;
