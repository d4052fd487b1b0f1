// connexion BD + synchronisation du schéma

use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
};
use tracing::info;

use crate::config::AppConfig;
use crate::models::{category, comment, ingredient, recipe, recipe_category, recipe_ingredient, users};

pub async fn establish_connection(config: &AppConfig) -> Result<DatabaseConnection, DbErr> {
    Database::connect(&config.database_url).await
}

/// Crée les tables manquantes à partir des entités (CREATE TABLE IF NOT EXISTS)
/// Additif uniquement: aucune table ni colonne existante n'est modifiée
pub async fn sync_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Parents d'abord, pour que les clés étrangères soient valides
    create_table(db, users::Entity).await?;
    create_table(db, category::Entity).await?;
    create_table(db, ingredient::Entity).await?;
    create_table(db, recipe::Entity).await?;
    create_table(db, comment::Entity).await?;
    create_table(db, recipe_ingredient::Entity).await?;
    create_table(db, recipe_category::Entity).await?;

    info!("database schema synchronized");
    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();

    db.execute(backend.build(&statement)).await?;
    Ok(())
}
