use sea_orm::sea_query::{Expr, Func, LikeExpr, Query};
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, DbErr};
use serde::Deserialize;

use crate::error::ApiError;
use crate::models::dto::RecipePage;
use crate::models::recipe::{self, Difficulty};
use crate::models::{category, recipe_category};
use crate::services::recipe_service::RecipeService;
use crate::utils::pagination::{PageQuery, Pagination};

/// Paramètres bruts de GET /search/recipes
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub duration: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl SearchQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::from_query(&PageQuery {
            page: self.page.clone(),
            limit: self.limit.clone(),
        })
    }
}

/// Filtres validés, tous optionnels et combinés en ET
#[derive(Debug, Default, PartialEq)]
pub struct SearchFilters {
    pub keyword: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub max_duration: Option<i32>,
}

impl TryFrom<&SearchQuery> for SearchFilters {
    type Error = ApiError;

    fn try_from(query: &SearchQuery) -> Result<Self, Self::Error> {
        let difficulty = non_empty(&query.difficulty)
            .map(|raw| raw.parse::<Difficulty>().map_err(ApiError::Validation))
            .transpose()?;

        let max_duration = non_empty(&query.duration)
            .map(|raw| {
                raw.parse::<i32>()
                    .map_err(|_| ApiError::validation(format!("Durée invalide: {}", raw)))
            })
            .transpose()?;

        Ok(Self {
            keyword: non_empty(&query.q).map(str::to_string),
            category: non_empty(&query.category).map(str::to_string),
            difficulty,
            max_duration,
        })
    }
}

impl SearchFilters {
    pub fn condition(&self) -> Condition {
        let mut condition = Condition::all();

        // Mot-clé: sous-chaîne insensible à la casse dans le titre OU la description
        if let Some(keyword) = &self.keyword {
            let pattern = format!("%{}%", escape_like(&keyword.to_lowercase()));
            condition = condition.add(
                Condition::any()
                    .add(lower_like(recipe::Column::Title, &pattern))
                    .add(lower_like(recipe::Column::Description, &pattern)),
            );
        }

        // Catégorie: recettes liées à une catégorie de ce nom
        if let Some(name) = &self.category {
            let linked_recipes = Query::select()
                .column((recipe_category::Entity, recipe_category::Column::RecipeId))
                .from(recipe_category::Entity)
                .inner_join(
                    category::Entity,
                    Expr::col((category::Entity, category::Column::Id))
                        .equals((recipe_category::Entity, recipe_category::Column::CategoryId)),
                )
                .and_where(Expr::col((category::Entity, category::Column::Name)).eq(name.as_str()))
                .to_owned();
            condition = condition.add(recipe::Column::Id.in_subquery(linked_recipes));
        }

        if let Some(difficulty) = self.difficulty {
            condition = condition.add(recipe::Column::Difficulty.eq(difficulty));
        }

        if let Some(max_duration) = self.max_duration {
            condition = condition.add(recipe::Column::Duration.lte(max_duration));
        }

        condition
    }
}

pub struct SearchService;

impl SearchService {
    pub async fn search_recipes(
        db: &DatabaseConnection,
        filters: &SearchFilters,
        pagination: Pagination,
    ) -> Result<RecipePage, DbErr> {
        RecipeService::fetch_page(db, filters.condition(), pagination).await
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn lower_like(column: recipe::Column, pattern: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::expr(Func::lower(Expr::col((recipe::Entity, column))))
        .like(LikeExpr::new(pattern).escape('\\'))
}

/// Échappe les jokers LIKE (% et _) saisis par l'utilisateur
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
