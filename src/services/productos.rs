use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};

use crate::db::with_deadline;
use crate::entities::{producto, venta, Producto, Venta};
use crate::errors::ServiceError;

/// Fields for creating a product. `descripcion` and `categoria` are optional.
#[derive(Debug, Clone)]
pub struct CreateProductoInput {
    pub nombre: String,
    pub descripcion: Option<String>,
    pub precio: Decimal,
    pub stock: i32,
    pub categoria: Option<String>,
}

/// Partial update: only supplied fields change.
#[derive(Debug, Clone, Default)]
pub struct UpdateProductoInput {
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    pub precio: Option<Decimal>,
    pub stock: Option<i32>,
    pub categoria: Option<String>,
}

/// Plain CRUD over the product catalog. No transactional coupling except for
/// deletion, which must not race against sale creation.
#[derive(Clone)]
pub struct ProductoService {
    db: Arc<DatabaseConnection>,
    op_timeout: Duration,
}

impl ProductoService {
    pub fn new(db: Arc<DatabaseConnection>, op_timeout: Duration) -> Self {
        Self { db, op_timeout }
    }

    #[instrument(skip(self))]
    pub async fn listar_productos(&self) -> Result<Vec<producto::Model>, ServiceError> {
        let db = self.db.clone();
        with_deadline("listar productos", self.op_timeout, async move {
            Producto::find().all(&*db).await.map_err(|e| {
                error!(error = %e, "Failed to list products");
                ServiceError::DatabaseError(e)
            })
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn obtener_producto(&self, id: i32) -> Result<producto::Model, ServiceError> {
        let db = self.db.clone();
        with_deadline("obtener producto", self.op_timeout, async move {
            Producto::find_by_id(id)
                .one(&*db)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Producto".to_string()))
        })
        .await
    }

    /// Creates a product and returns its generated id.
    #[instrument(skip(self))]
    pub async fn crear_producto(&self, input: CreateProductoInput) -> Result<i32, ServiceError> {
        validar_campos(Some(input.nombre.as_str()), Some(input.precio), Some(input.stock))?;

        let db = self.db.clone();
        with_deadline("crear producto", self.op_timeout, async move {
            let nuevo = producto::ActiveModel {
                nombre: Set(input.nombre),
                descripcion: Set(input.descripcion),
                precio: Set(input.precio),
                stock: Set(input.stock),
                categoria: Set(input.categoria),
                ..Default::default()
            };
            let producto = nuevo.insert(&*db).await?;
            info!(producto_id = producto.id, "Product created");
            Ok(producto.id)
        })
        .await
    }

    /// Applies a partial update; absent id fails with `NotFound`.
    #[instrument(skip(self))]
    pub async fn actualizar_producto(
        &self,
        id: i32,
        input: UpdateProductoInput,
    ) -> Result<producto::Model, ServiceError> {
        validar_campos(input.nombre.as_deref(), input.precio, input.stock)?;

        let db = self.db.clone();
        with_deadline("actualizar producto", self.op_timeout, async move {
            let producto = Producto::find_by_id(id)
                .one(&*db)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Producto".to_string()))?;

            let mut activo: producto::ActiveModel = producto.into();
            if let Some(nombre) = input.nombre {
                activo.nombre = Set(nombre);
            }
            if let Some(descripcion) = input.descripcion {
                activo.descripcion = Set(Some(descripcion));
            }
            if let Some(precio) = input.precio {
                activo.precio = Set(precio);
            }
            if let Some(stock) = input.stock {
                activo.stock = Set(stock);
            }
            if let Some(categoria) = input.categoria {
                activo.categoria = Set(Some(categoria));
            }

            let producto = activo.update(&*db).await?;
            info!(producto_id = id, "Product updated");
            Ok(producto)
        })
        .await
    }

    /// Deletes a product unless sales still reference it.
    ///
    /// Runs under the same product row lock the sale transaction takes, so a
    /// concurrent sale cannot slip in between the reference check and the
    /// delete.
    #[instrument(skip(self))]
    pub async fn eliminar_producto(&self, id: i32) -> Result<(), ServiceError> {
        let db = self.db.clone();
        with_deadline("eliminar producto", self.op_timeout, async move {
            let txn = db.begin().await?;

            let producto = Producto::find_by_id(id)
                .lock_exclusive()
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Producto".to_string()))?;

            let referencias = Venta::find()
                .filter(venta::Column::ProductoId.eq(id))
                .count(&txn)
                .await?;
            if referencias > 0 {
                return Err(ServiceError::Conflict(format!(
                    "el producto '{}' tiene {} ventas registradas",
                    producto.nombre, referencias
                )));
            }

            producto.delete(&txn).await?;
            txn.commit().await?;
            info!(producto_id = id, "Product deleted");
            Ok(())
        })
        .await
    }
}

fn validar_campos(
    nombre: Option<&str>,
    precio: Option<Decimal>,
    stock: Option<i32>,
) -> Result<(), ServiceError> {
    if let Some(nombre) = nombre {
        if nombre.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "El nombre no puede estar vacío".to_string(),
            ));
        }
    }
    if let Some(precio) = precio {
        if precio < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "El precio debe ser un número positivo".to_string(),
            ));
        }
    }
    if let Some(stock) = stock {
        if stock < 0 {
            return Err(ServiceError::ValidationError(
                "El stock debe ser un número positivo o cero".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn field_validation_rejects_bad_values() {
        assert!(validar_campos(Some(""), None, None).is_err());
        assert!(validar_campos(Some("   "), None, None).is_err());
        assert!(validar_campos(None, Some(dec!(-0.01)), None).is_err());
        assert!(validar_campos(None, None, Some(-1)).is_err());
        assert!(validar_campos(Some("Camisa"), Some(dec!(20.00)), Some(0)).is_ok());
    }
}
