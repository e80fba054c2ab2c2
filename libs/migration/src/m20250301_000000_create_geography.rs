use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Countries::Table)
                    .if_not_exists()
                    .col(pk_auto(Countries::Id))
                    .col(string(Countries::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Provinces::Table)
                    .if_not_exists()
                    .col(pk_auto(Provinces::Id))
                    .col(string(Provinces::Name))
                    .col(integer(Provinces::CountryId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_provinces_country_id")
                            .from(Provinces::Table, Provinces::CountryId)
                            .to(Countries::Table, Countries::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Localities::Table)
                    .if_not_exists()
                    .col(string(Localities::Id).primary_key())
                    .col(string(Localities::Name))
                    .col(integer(Localities::ProvinceId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_localities_province_id")
                            .from(Localities::Table, Localities::ProvinceId)
                            .to(Provinces::Table, Provinces::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_localities_province_id")
                    .table(Localities::Table)
                    .col(Localities::ProvinceId)
                    .to_owned(),
            )
            .await?;

        // Case-insensitive uniqueness needs expression indexes
        let db = manager.get_connection();
        db.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS uq_countries_name ON countries (LOWER(name))",
        )
        .await?;
        db.execute_unprepared(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS uq_provinces_name_country
                ON provinces (LOWER(name), country_id)
            "#,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Localities::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Provinces::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Countries::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Countries {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Provinces {
    Table,
    Id,
    Name,
    CountryId,
}

#[derive(DeriveIden)]
enum Localities {
    Table,
    Id,
    Name,
    ProvinceId,
}
