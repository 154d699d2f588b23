// `SchemaManager` lifetimes must stay elided to match sea-orm-migration's
// trait signatures; spelling them out trips E0195.
#![allow(elided_lifetimes_in_paths)]

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250810_000001_create_productos_table::Migration),
            Box::new(m20250810_000002_create_ventas_table::Migration),
            Box::new(m20250810_000003_create_usuarios_table::Migration),
        ]
    }
}

mod m20250810_000001_create_productos_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250810_000001_create_productos_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Productos::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Productos::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Productos::Nombre)
                                .string_len(255)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Productos::Descripcion).text().null())
                        .col(
                            ColumnDef::new(Productos::Precio)
                                .decimal_len(10, 2)
                                .not_null()
                                .check(Expr::col(Productos::Precio).gte(0)),
                        )
                        // Stock invariant is enforced here as a backstop; the
                        // sale transaction checks it first under a row lock.
                        .col(
                            ColumnDef::new(Productos::Stock)
                                .integer()
                                .not_null()
                                .check(Expr::col(Productos::Stock).gte(0)),
                        )
                        .col(ColumnDef::new(Productos::Categoria).string_len(100).null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Productos::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum Productos {
        Table,
        Id,
        Nombre,
        Descripcion,
        Precio,
        Stock,
        Categoria,
    }
}

mod m20250810_000002_create_ventas_table {
    use sea_orm_migration::prelude::*;

    use super::m20250810_000001_create_productos_table::Productos;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250810_000002_create_ventas_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Ventas::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Ventas::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Ventas::ProductoId).integer().not_null())
                        .col(
                            ColumnDef::new(Ventas::Cantidad)
                                .integer()
                                .not_null()
                                .check(Expr::col(Ventas::Cantidad).gt(0)),
                        )
                        .col(
                            ColumnDef::new(Ventas::FechaVenta)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_ventas_producto_id")
                                .from(Ventas::Table, Ventas::ProductoId)
                                .to(Productos::Table, Productos::Id)
                                // Products with recorded sales cannot be
                                // deleted; the service surfaces this as 409.
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_ventas_producto_id")
                        .table(Ventas::Table)
                        .col(Ventas::ProductoId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_ventas_fecha_venta")
                        .table(Ventas::Table)
                        .col(Ventas::FechaVenta)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Ventas::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum Ventas {
        Table,
        Id,
        ProductoId,
        Cantidad,
        FechaVenta,
    }
}

mod m20250810_000003_create_usuarios_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250810_000003_create_usuarios_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Usuarios::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Usuarios::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Usuarios::Usuario)
                                .string_len(100)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Usuarios::ContrasenaHash)
                                .string_len(255)
                                .null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Usuarios::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum Usuarios {
        Table,
        Id,
        Usuario,
        ContrasenaHash,
    }
}
