use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};

use crate::db::with_deadline;
use crate::entities::{producto, venta, Producto, Venta};
use crate::errors::ServiceError;

/// Sale row joined with the product it references, as listed by the API.
#[derive(Debug, Clone, Serialize)]
pub struct VentaConProducto {
    pub venta_id: i32,
    pub producto_id: i32,
    pub producto_nombre: String,
    pub producto_precio: Decimal,
    pub cantidad: i32,
    pub fecha_venta: DateTime<Utc>,
}

/// Service for recording sales and keeping product stock consistent.
///
/// Every mutating operation runs inside one transaction that takes an
/// exclusive lock on the affected rows, so concurrent sales against the same
/// product serialize at the database and can never both observe stale stock.
/// An uncommitted transaction rolls back when dropped, which also covers the
/// deadline-expired path.
#[derive(Clone)]
pub struct VentaService {
    db: Arc<DatabaseConnection>,
    op_timeout: Duration,
}

impl VentaService {
    pub fn new(db: Arc<DatabaseConnection>, op_timeout: Duration) -> Self {
        Self { db, op_timeout }
    }

    /// Lists all sales joined with product name and price, newest first.
    #[instrument(skip(self))]
    pub async fn listar_ventas(&self) -> Result<Vec<VentaConProducto>, ServiceError> {
        let db = self.db.clone();
        with_deadline("listar ventas", self.op_timeout, async move {
            let rows = Venta::find()
                .find_also_related(Producto)
                .order_by_desc(venta::Column::FechaVenta)
                .all(&*db)
                .await
                .map_err(|e| {
                    error!(error = %e, "Failed to list sales");
                    ServiceError::DatabaseError(e)
                })?;

            // The FK guarantees a product per sale; a missing one means the
            // row predates the restrict policy and is skipped with a log.
            let ventas = rows
                .into_iter()
                .filter_map(|(v, p)| match p {
                    Some(p) => Some(VentaConProducto {
                        venta_id: v.id,
                        producto_id: v.producto_id,
                        producto_nombre: p.nombre,
                        producto_precio: p.precio,
                        cantidad: v.cantidad,
                        fecha_venta: v.fecha_venta,
                    }),
                    None => {
                        error!(venta_id = v.id, "Sale references a missing product");
                        None
                    }
                })
                .collect();
            Ok(ventas)
        })
        .await
    }

    /// Records a sale and decrements the product's stock in one transaction.
    ///
    /// Returns the new sale's id. Fails with `NotFound` if the product does
    /// not exist and `InsufficientStock` if fewer than `cantidad` units
    /// remain; in both cases stock is left untouched.
    #[instrument(skip(self))]
    pub async fn crear_venta(&self, producto_id: i32, cantidad: i32) -> Result<i32, ServiceError> {
        if cantidad <= 0 {
            return Err(ServiceError::ValidationError(
                "La cantidad debe ser mayor que cero".to_string(),
            ));
        }

        let db = self.db.clone();
        with_deadline("crear venta", self.op_timeout, async move {
            let txn = db.begin().await?;

            let producto = lock_producto(&txn, producto_id).await?;
            if producto.stock < cantidad {
                return Err(ServiceError::InsufficientStock(format!(
                    "quedan {} unidades de '{}'",
                    producto.stock, producto.nombre
                )));
            }

            let nueva = venta::ActiveModel {
                producto_id: Set(producto_id),
                cantidad: Set(cantidad),
                fecha_venta: Set(Utc::now()),
                ..Default::default()
            };
            let venta = nueva.insert(&txn).await?;

            ajustar_stock(&txn, producto_id, -cantidad).await?;

            txn.commit().await?;
            info!(venta_id = venta.id, producto_id, cantidad, "Sale recorded");
            Ok(venta.id)
        })
        .await
    }

    /// Changes a sale's quantity and applies exactly the delta to stock.
    ///
    /// A shrinking sale restores stock; a growing one re-checks availability
    /// under the product row lock before committing.
    #[instrument(skip(self))]
    pub async fn actualizar_venta(&self, id: i32, cantidad: i32) -> Result<(), ServiceError> {
        if cantidad <= 0 {
            return Err(ServiceError::ValidationError(
                "La cantidad debe ser mayor que cero".to_string(),
            ));
        }

        let db = self.db.clone();
        with_deadline("actualizar venta", self.op_timeout, async move {
            let txn = db.begin().await?;

            let venta = Venta::find_by_id(id)
                .lock_exclusive()
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Venta".to_string()))?;

            let producto_id = venta.producto_id;
            let diff = cantidad - venta.cantidad;

            if diff > 0 {
                let producto = lock_producto(&txn, producto_id).await?;
                if producto.stock < diff {
                    return Err(ServiceError::InsufficientStock(format!(
                        "quedan {} unidades de '{}'",
                        producto.stock, producto.nombre
                    )));
                }
            }

            let mut activa: venta::ActiveModel = venta.into();
            activa.cantidad = Set(cantidad);
            activa.update(&txn).await?;

            ajustar_stock(&txn, producto_id, -diff).await?;

            txn.commit().await?;
            info!(venta_id = id, cantidad, diff, "Sale updated");
            Ok(())
        })
        .await
    }

    /// Deletes a sale and restores the product's stock by its recorded
    /// quantity. Exact inverse of `crear_venta`.
    #[instrument(skip(self))]
    pub async fn eliminar_venta(&self, id: i32) -> Result<(), ServiceError> {
        let db = self.db.clone();
        with_deadline("eliminar venta", self.op_timeout, async move {
            let txn = db.begin().await?;

            let venta = Venta::find_by_id(id)
                .lock_exclusive()
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Venta".to_string()))?;

            let producto_id = venta.producto_id;
            let cantidad = venta.cantidad;

            Venta::delete_by_id(id).exec(&txn).await?;
            ajustar_stock(&txn, producto_id, cantidad).await?;

            txn.commit().await?;
            info!(venta_id = id, producto_id, cantidad, "Sale deleted, stock restored");
            Ok(())
        })
        .await
    }
}

/// Fetches the product row under an exclusive lock (`SELECT ... FOR UPDATE`),
/// or fails with `NotFound`.
async fn lock_producto(
    txn: &DatabaseTransaction,
    producto_id: i32,
) -> Result<producto::Model, ServiceError> {
    Producto::find_by_id(producto_id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Producto".to_string()))
}

/// Applies a relative stock adjustment (`stock = stock + delta`) to the
/// already-locked product row.
async fn ajustar_stock(
    txn: &DatabaseTransaction,
    producto_id: i32,
    delta: i32,
) -> Result<(), ServiceError> {
    Producto::update_many()
        .col_expr(
            producto::Column::Stock,
            Expr::col(producto::Column::Stock).add(delta),
        )
        .filter(producto::Column::Id.eq(producto_id))
        .exec(txn)
        .await?;
    Ok(())
}
