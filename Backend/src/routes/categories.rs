use actix_web::{delete, get, post, put, web, HttpResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::category::{self, ActiveModel as CategoryActiveModel, Entity as Category};
use crate::models::dto::{CategoryWithRecipes, RecipeRef};
use crate::models::{recipe, recipe_category};

const CATEGORY_NOT_FOUND: &str = "Catégorie non trouvée";

#[derive(Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, message = "Le nom est requis"))]
    pub name: String,
}

// Le nom sert de clé naturelle au find-or-create des recettes: il reste unique
async fn name_taken(db: &DatabaseConnection, name: &str, except: Option<i32>) -> ApiResult<bool> {
    let mut query = Category::find().filter(category::Column::Name.eq(name));
    if let Some(id) = except {
        query = query.filter(category::Column::Id.ne(id));
    }
    Ok(query.one(db).await?.is_some())
}

fn validated_name(body: CategoryRequest) -> ApiResult<String> {
    body.validate()?;
    let name = body.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::validation("Le nom est requis"));
    }
    Ok(name)
}

/// GET /api/categories - Toutes les catégories avec les ids de leurs recettes (PUBLIC)
#[get("")]
pub async fn list_categories(db: web::Data<DatabaseConnection>) -> ApiResult<HttpResponse> {
    let categories = Category::find()
        .order_by_asc(category::Column::Id)
        .find_with_related(recipe::Entity)
        .all(db.get_ref())
        .await?;

    let response: Vec<CategoryWithRecipes> = categories
        .into_iter()
        .map(|(category, recipes)| CategoryWithRecipes {
            id: category.id,
            name: category.name,
            created_at: category.created_at,
            updated_at: category.updated_at,
            recipes: recipes.into_iter().map(|r| RecipeRef { id: r.id }).collect(),
        })
        .collect();

    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/categories - Créer une catégorie (ADMIN)
#[post("")]
pub async fn create_category(
    auth_user: AuthUser,
    body: web::Json<CategoryRequest>,
    db: web::Data<DatabaseConnection>,
) -> ApiResult<HttpResponse> {
    auth_user.require_admin()?;
    let name = validated_name(body.into_inner())?;

    if name_taken(db.get_ref(), &name, None).await? {
        return Err(ApiError::validation("Cette catégorie existe déjà"));
    }

    let category = CategoryActiveModel {
        name: Set(name),
        ..Default::default()
    }
    .insert(db.get_ref())
    .await?;

    Ok(HttpResponse::Created().json(category))
}

/// PUT /api/categories/{id} - Renommer une catégorie (ADMIN)
#[put("/{id}")]
pub async fn update_category(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<CategoryRequest>,
    db: web::Data<DatabaseConnection>,
) -> ApiResult<HttpResponse> {
    auth_user.require_admin()?;
    let id = path.into_inner();

    let category = Category::find_by_id(id)
        .one(db.get_ref())
        .await?
        .ok_or_else(|| ApiError::not_found(CATEGORY_NOT_FOUND))?;

    let name = validated_name(body.into_inner())?;
    if name_taken(db.get_ref(), &name, Some(id)).await? {
        return Err(ApiError::validation("Cette catégorie existe déjà"));
    }

    let mut active_model: CategoryActiveModel = category.into();
    active_model.name = Set(name);
    let category = active_model.update(db.get_ref()).await?;

    Ok(HttpResponse::Ok().json(category))
}

/// DELETE /api/categories/{id} - Supprimer une catégorie et ses liens (ADMIN)
#[delete("/{id}")]
pub async fn delete_category(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> ApiResult<HttpResponse> {
    auth_user.require_admin()?;
    let id = path.into_inner();

    Category::find_by_id(id)
        .one(db.get_ref())
        .await?
        .ok_or_else(|| ApiError::not_found(CATEGORY_NOT_FOUND))?;

    let txn = db.begin().await?;
    recipe_category::Entity::delete_many()
        .filter(recipe_category::Column::CategoryId.eq(id))
        .exec(&txn)
        .await?;
    Category::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    Ok(HttpResponse::NoContent().finish())
}

pub fn categories_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/categories")
            .service(list_categories)
            .service(create_category)
            .service(update_category)
            .service(delete_category)
    );
}
