use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

use crate::utils::password;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)] // Jamais exposé en JSON, même hashé
    pub password: String, // Format: pbkdf2:sha256:iterations$salt$hash
    pub avatar: Option<String>,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    pub is_active: bool,
    pub last_login: Option<DateTimeUtc>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTimeUtc,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::recipe::Entity")]
    Recipe,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
}

impl Related<super::recipe::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recipe.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    /// Hash le mot de passe dès qu'il est assigné (inscription ou changement)
    /// et maintient created_at / updated_at
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if let ActiveValue::Set(plain) = &self.password {
            let hashed = password::hash_password(plain).map_err(DbErr::Custom)?;
            self.password = Set(hashed);
        }

        let now = Utc::now();
        if insert {
            self.created_at = Set(now);
            if self.is_admin.is_not_set() {
                self.is_admin = Set(false);
            }
            if self.is_active.is_not_set() {
                self.is_active = Set(true);
            }
        }
        self.updated_at = Set(now);

        Ok(self)
    }
}
