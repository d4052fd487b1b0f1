use chrono::{DateTime, Duration, Months, Utc};
use sea_orm::*;

use crate::models::dto::{EntityCounts, GlobalStats, PersonalStats, UserCounts, UserStats};
use crate::models::{comment, recipe, users};

pub struct StatsService;

impl StatsService {
    /// Statistiques utilisateurs pour /auth/stats ("nouveaux" = dernières 24h)
    pub async fn user_stats(db: &DatabaseConnection) -> Result<UserStats, DbErr> {
        let since = Utc::now() - Duration::hours(24);

        Ok(UserStats {
            total_users: users::Entity::find().count(db).await?,
            active_users: Self::active_users(db).await?,
            new_users: users::Entity::find()
                .filter(users::Column::CreatedAt.gte(since))
                .count(db)
                .await?,
        })
    }

    /// Statistiques globales pour /stats ("nouveaux" = depuis un mois calendaire)
    pub async fn global_stats(db: &DatabaseConnection) -> Result<GlobalStats, DbErr> {
        let since = one_month_ago(Utc::now());

        Ok(GlobalStats {
            users: UserCounts {
                total: users::Entity::find().count(db).await?,
                active: Self::active_users(db).await?,
                new: users::Entity::find()
                    .filter(users::Column::CreatedAt.gte(since))
                    .count(db)
                    .await?,
            },
            recipes: EntityCounts {
                total: recipe::Entity::find().count(db).await?,
                new: recipe::Entity::find()
                    .filter(recipe::Column::CreatedAt.gte(since))
                    .count(db)
                    .await?,
            },
            comments: EntityCounts {
                total: comment::Entity::find().count(db).await?,
                new: comment::Entity::find()
                    .filter(comment::Column::CreatedAt.gte(since))
                    .count(db)
                    .await?,
            },
        })
    }

    pub async fn personal_stats(
        db: &DatabaseConnection,
        user_id: i32,
    ) -> Result<PersonalStats, DbErr> {
        Ok(PersonalStats {
            recipes: recipe::Entity::find()
                .filter(recipe::Column::UserId.eq(user_id))
                .count(db)
                .await?,
            comments: comment::Entity::find()
                .filter(comment::Column::UserId.eq(user_id))
                .count(db)
                .await?,
        })
    }

    async fn active_users(db: &DatabaseConnection) -> Result<u64, DbErr> {
        users::Entity::find()
            .filter(users::Column::IsActive.eq(true))
            .count(db)
            .await
    }
}

/// Maintenant moins un mois calendaire (31 mars → 28/29 février)
fn one_month_ago(now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(1))
        .unwrap_or_else(|| now - Duration::days(30))
}
