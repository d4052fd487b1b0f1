// Formes des réponses JSON construites par les services
// (forme fixe par cas d'usage, pas d'include dynamique)
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use super::recipe::Difficulty;
use super::{category, comment, recipe, users};

/// Auteur réduit à id / name / avatar
#[derive(Debug, Clone, Serialize)]
pub struct AuthorInfo {
    pub id: i32,
    pub name: String,
    pub avatar: Option<String>,
}

impl From<&users::Model> for AuthorInfo {
    fn from(user: &users::Model) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryInfo {
    pub id: i32,
    pub name: String,
}

impl From<category::Model> for CategoryInfo {
    fn from(category: category::Model) -> Self {
        Self {
            id: category.id,
            name: category.name,
        }
    }
}

/// Ligne d'ingrédient: l'ingrédient + quantité/unité de la table pivot
#[derive(Debug, Clone, Serialize)]
pub struct IngredientLine {
    pub id: i32,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeWithAssociations {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub duration: i32,
    pub difficulty: Difficulty,
    pub image: Option<String>,
    pub video: Option<String>,
    pub user_id: i32,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    pub user: Option<AuthorInfo>,
    pub categories: Vec<CategoryInfo>,
    pub ingredients: Vec<IngredientLine>,
}

impl RecipeWithAssociations {
    pub fn new(
        recipe: recipe::Model,
        user: Option<AuthorInfo>,
        categories: Vec<CategoryInfo>,
        ingredients: Vec<IngredientLine>,
    ) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            description: recipe.description,
            duration: recipe.duration,
            difficulty: recipe.difficulty,
            image: recipe.image,
            video: recipe.video,
            user_id: recipe.user_id,
            created_at: recipe.created_at,
            updated_at: recipe.updated_at,
            user,
            categories,
            ingredients,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentWithAuthor {
    pub id: i32,
    pub content: String,
    pub user_id: i32,
    pub recipe_id: i32,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    pub user: Option<AuthorInfo>,
}

impl CommentWithAuthor {
    pub fn new(comment: comment::Model, user: Option<AuthorInfo>) -> Self {
        Self {
            id: comment.id,
            content: comment.content,
            user_id: comment.user_id,
            recipe_id: comment.recipe_id,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
            user,
        }
    }
}

/// Détail d'une recette: associations + commentaires avec leur auteur
#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: RecipeWithAssociations,
    pub comments: Vec<CommentWithAuthor>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipePage {
    pub recipes: Vec<RecipeWithAssociations>,
    pub total: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
    #[serde(rename = "currentPage")]
    pub current_page: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeRef {
    pub id: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryWithRecipes {
    pub id: i32,
    pub name: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    pub recipes: Vec<RecipeRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    #[serde(rename = "totalUsers")]
    pub total_users: u64,
    #[serde(rename = "activeUsers")]
    pub active_users: u64,
    #[serde(rename = "newUsers")]
    pub new_users: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserCounts {
    pub total: u64,
    pub active: u64,
    pub new: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityCounts {
    pub total: u64,
    pub new: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GlobalStats {
    pub users: UserCounts,
    pub recipes: EntityCounts,
    pub comments: EntityCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonalStats {
    pub recipes: u64,
    pub comments: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub time: DateTime<Utc>,
}

// ----------------------------------------------------------------------------
// Requêtes
// ----------------------------------------------------------------------------

/// Ligne d'ingrédient reçue: { name, quantity, unit }
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IngredientInput {
    #[validate(length(min = 1, message = "Le nom de l'ingrédient est requis"))]
    pub name: String,
    #[validate(range(min = 0.0, message = "La quantité doit être positive"))]
    pub quantity: f64,
    #[validate(length(min = 1, message = "L'unité est requise"))]
    pub unit: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRecipeRequest {
    #[validate(length(min = 1, message = "Le titre est requis"))]
    pub title: String,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "La durée doit être positive"))]
    pub duration: i32,
    pub difficulty: Option<Difficulty>,
    pub image: Option<String>,
    pub video: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<IngredientInput>,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Champs absents = inchangés; `null` efface description / image / video;
/// ingredients/categories présents = remplacement complet
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateRecipeRequest {
    #[validate(length(min = 1, message = "Le titre est requis"))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[validate(range(min = 0, message = "La durée doit être positive"))]
    pub duration: Option<i32>,
    pub difficulty: Option<Difficulty>,
    #[serde(default, deserialize_with = "nullable")]
    pub image: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub video: Option<Option<String>>,
    pub ingredients: Option<Vec<IngredientInput>>,
    pub categories: Option<Vec<String>>,
}

// Champ présent (même à null) => Some(..), absent => None via serde(default)
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddCommentRequest {
    #[validate(length(min = 1, message = "Le commentaire est vide"))]
    pub content: String,
}
