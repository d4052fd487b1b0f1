use std::collections::HashMap;

use sea_orm::*;
use tracing::debug;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::models::dto::{
    AddCommentRequest, AuthorInfo, CategoryInfo, CommentWithAuthor, CreateRecipeRequest,
    IngredientInput, IngredientLine, RecipeDetail, RecipePage, RecipeWithAssociations,
    UpdateRecipeRequest,
};
use crate::models::{category, comment, ingredient, recipe, recipe_category, recipe_ingredient, users};
use crate::utils::pagination::Pagination;

const RECIPE_NOT_FOUND: &str = "Recette non trouvée";

pub struct RecipeService;

impl RecipeService {
    // ------------------------------------------------------------------------
    // Lecture
    // ------------------------------------------------------------------------

    /// Page de recettes filtrée, triée par date de création décroissante
    /// (égalités départagées par id décroissant)
    pub async fn fetch_page(
        db: &DatabaseConnection,
        condition: Condition,
        pagination: Pagination,
    ) -> Result<RecipePage, DbErr> {
        let paginator = recipe::Entity::find()
            .filter(condition)
            .order_by_desc(recipe::Column::CreatedAt)
            .order_by_desc(recipe::Column::Id)
            .paginate(db, pagination.limit);

        let total = paginator.num_items().await?;
        let rows = match pagination.offset() {
            Some(_) => paginator.fetch_page(pagination.page_index()).await?,
            None => Vec::new(),
        };
        let recipes = Self::load_associations(db, rows).await?;

        Ok(RecipePage {
            recipes,
            total,
            total_pages: pagination.total_pages(total),
            current_page: pagination.page,
        })
    }

    /// Recette + auteur, catégories et ingrédients (None si l'id n'existe pas)
    pub async fn fetch_recipe_with_associations<C>(
        db: &C,
        recipe_id: i32,
    ) -> Result<Option<RecipeWithAssociations>, DbErr>
    where
        C: ConnectionTrait,
    {
        let Some(recipe) = recipe::Entity::find_by_id(recipe_id).one(db).await? else {
            return Ok(None);
        };

        Ok(Self::load_associations(db, vec![recipe]).await?.pop())
    }

    /// Détail d'une recette: associations + commentaires avec leur auteur
    pub async fn fetch_recipe_detail(
        db: &DatabaseConnection,
        recipe_id: i32,
    ) -> Result<Option<RecipeDetail>, DbErr> {
        let Some(recipe) = Self::fetch_recipe_with_associations(db, recipe_id).await? else {
            return Ok(None);
        };

        let comments = comment::Entity::find()
            .filter(comment::Column::RecipeId.eq(recipe_id))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .find_also_related(users::Entity)
            .all(db)
            .await?
            .into_iter()
            .map(|(comment, author)| {
                CommentWithAuthor::new(comment, author.as_ref().map(AuthorInfo::from))
            })
            .collect();

        Ok(Some(RecipeDetail { recipe, comments }))
    }

    /// Charge auteurs, catégories et ingrédients pour un lot de recettes
    /// en 3 requêtes (au lieu de 3 par recette), l'ordre du lot est conservé
    pub async fn load_associations<C>(
        db: &C,
        recipes: Vec<recipe::Model>,
    ) -> Result<Vec<RecipeWithAssociations>, DbErr>
    where
        C: ConnectionTrait,
    {
        if recipes.is_empty() {
            return Ok(Vec::new());
        }

        let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();
        let mut owner_ids: Vec<i32> = recipes.iter().map(|r| r.user_id).collect();
        owner_ids.sort_unstable();
        owner_ids.dedup();

        // 1. Auteurs
        let owners: HashMap<i32, AuthorInfo> = users::Entity::find()
            .filter(users::Column::Id.is_in(owner_ids))
            .all(db)
            .await?
            .iter()
            .map(|user| (user.id, AuthorInfo::from(user)))
            .collect();

        // 2. Catégories via la table pivot
        let mut categories: HashMap<i32, Vec<CategoryInfo>> = HashMap::new();
        let category_rows = recipe_category::Entity::find()
            .filter(recipe_category::Column::RecipeId.is_in(recipe_ids.clone()))
            .order_by_asc(recipe_category::Column::Id)
            .find_also_related(category::Entity)
            .all(db)
            .await?;
        for (link, category) in category_rows {
            if let Some(category) = category {
                categories
                    .entry(link.recipe_id)
                    .or_default()
                    .push(CategoryInfo::from(category));
            }
        }

        // 3. Ingrédients avec quantité/unité de la ligne pivot
        let mut ingredients: HashMap<i32, Vec<IngredientLine>> = HashMap::new();
        let ingredient_rows = recipe_ingredient::Entity::find()
            .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids))
            .order_by_asc(recipe_ingredient::Column::Id)
            .find_also_related(ingredient::Entity)
            .all(db)
            .await?;
        for (line, ingredient) in ingredient_rows {
            if let Some(ingredient) = ingredient {
                ingredients.entry(line.recipe_id).or_default().push(IngredientLine {
                    id: ingredient.id,
                    name: ingredient.name,
                    quantity: line.quantity,
                    unit: line.unit,
                });
            }
        }

        Ok(recipes
            .into_iter()
            .map(|recipe| {
                let user = owners.get(&recipe.user_id).cloned();
                let recipe_categories = categories.remove(&recipe.id).unwrap_or_default();
                let recipe_ingredients = ingredients.remove(&recipe.id).unwrap_or_default();
                RecipeWithAssociations::new(recipe, user, recipe_categories, recipe_ingredients)
            })
            .collect())
    }

    // ------------------------------------------------------------------------
    // Écriture (chaque opération multi-lignes est une transaction)
    // ------------------------------------------------------------------------

    pub async fn create_recipe(
        db: &DatabaseConnection,
        user_id: i32,
        request: CreateRecipeRequest,
    ) -> ApiResult<RecipeWithAssociations> {
        request.validate()?;
        validate_lines(&request.ingredients, &request.categories)?;

        let txn = db.begin().await?;

        let recipe = recipe::ActiveModel {
            title: Set(request.title),
            description: Set(request.description),
            duration: Set(request.duration),
            difficulty: Set(request.difficulty.unwrap_or_default()),
            image: Set(request.image),
            video: Set(request.video),
            user_id: Set(user_id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        Self::attach_ingredients(&txn, recipe.id, &request.ingredients).await?;
        Self::attach_categories(&txn, recipe.id, &request.categories).await?;

        txn.commit().await?;

        Self::fetch_recipe_with_associations(db, recipe.id)
            .await?
            .ok_or_else(|| ApiError::internal("Created recipe vanished"))
    }

    /// Met à jour les champs fournis. Une liste d'ingrédients ou de catégories
    /// fournie remplace entièrement les lignes pivot existantes
    pub async fn update_recipe(
        db: &DatabaseConnection,
        user_id: i32,
        recipe_id: i32,
        request: UpdateRecipeRequest,
    ) -> ApiResult<RecipeWithAssociations> {
        let recipe = Self::find_owned(db, user_id, recipe_id).await?;

        request.validate()?;
        validate_lines(
            request.ingredients.as_deref().unwrap_or_default(),
            request.categories.as_deref().unwrap_or_default(),
        )?;

        let txn = db.begin().await?;

        let mut active: recipe::ActiveModel = recipe.into();
        if let Some(title) = request.title {
            active.title = Set(title);
        }
        if let Some(description) = request.description {
            active.description = Set(description);
        }
        if let Some(duration) = request.duration {
            active.duration = Set(duration);
        }
        if let Some(difficulty) = request.difficulty {
            active.difficulty = Set(difficulty);
        }
        if let Some(image) = request.image {
            active.image = Set(image);
        }
        if let Some(video) = request.video {
            active.video = Set(video);
        }
        active.update(&txn).await?;

        if let Some(lines) = &request.ingredients {
            Self::replace_ingredients(&txn, recipe_id, lines).await?;
        }
        if let Some(names) = &request.categories {
            Self::replace_categories(&txn, recipe_id, names).await?;
        }

        txn.commit().await?;

        Self::fetch_recipe_with_associations(db, recipe_id)
            .await?
            .ok_or_else(|| ApiError::not_found(RECIPE_NOT_FOUND))
    }

    /// Supprime la recette, ses lignes pivot et ses commentaires.
    /// Les ingrédients et catégories restent (vocabulaire partagé)
    pub async fn delete_recipe(
        db: &DatabaseConnection,
        user_id: i32,
        recipe_id: i32,
    ) -> ApiResult<()> {
        let recipe = Self::find_owned(db, user_id, recipe_id).await?;

        let txn = db.begin().await?;

        recipe_ingredient::Entity::delete_many()
            .filter(recipe_ingredient::Column::RecipeId.eq(recipe.id))
            .exec(&txn)
            .await?;
        recipe_category::Entity::delete_many()
            .filter(recipe_category::Column::RecipeId.eq(recipe.id))
            .exec(&txn)
            .await?;
        comment::Entity::delete_many()
            .filter(comment::Column::RecipeId.eq(recipe.id))
            .exec(&txn)
            .await?;
        recipe::Entity::delete_by_id(recipe.id).exec(&txn).await?;

        txn.commit().await?;
        debug!(recipe_id, "recipe deleted");
        Ok(())
    }

    pub async fn add_comment(
        db: &DatabaseConnection,
        author: &users::Model,
        recipe_id: i32,
        request: AddCommentRequest,
    ) -> ApiResult<CommentWithAuthor> {
        request.validate()?;

        recipe::Entity::find_by_id(recipe_id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found(RECIPE_NOT_FOUND))?;

        let comment = comment::ActiveModel {
            content: Set(request.content),
            user_id: Set(author.id),
            recipe_id: Set(recipe_id),
            ..Default::default()
        }
        .insert(db)
        .await?;

        Ok(CommentWithAuthor::new(comment, Some(AuthorInfo::from(author))))
    }

    // ------------------------------------------------------------------------
    // Associations
    // ------------------------------------------------------------------------

    /// Retourne l'ingrédient portant ce nom, le crée sinon (unité de la 1re ligne)
    pub async fn find_or_create_ingredient<C>(
        db: &C,
        name: &str,
        unit: &str,
    ) -> Result<ingredient::Model, DbErr>
    where
        C: ConnectionTrait,
    {
        let existing = ingredient::Entity::find()
            .filter(ingredient::Column::Name.eq(name))
            .one(db)
            .await?;
        if let Some(existing) = existing {
            return Ok(existing);
        }

        debug!(name, "creating ingredient");
        ingredient::ActiveModel {
            name: Set(name.to_string()),
            unit: Set(unit.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    /// Retourne la catégorie portant ce nom, la crée sinon
    pub async fn find_or_create_category<C>(db: &C, name: &str) -> Result<category::Model, DbErr>
    where
        C: ConnectionTrait,
    {
        let existing = category::Entity::find()
            .filter(category::Column::Name.eq(name))
            .order_by_asc(category::Column::Id)
            .one(db)
            .await?;
        if let Some(existing) = existing {
            return Ok(existing);
        }

        debug!(name, "creating category");
        category::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    /// Une ligne pivot par ingrédient fourni
    pub async fn attach_ingredients<C>(
        db: &C,
        recipe_id: i32,
        lines: &[IngredientInput],
    ) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        for line in lines {
            let ingredient =
                Self::find_or_create_ingredient(db, line.name.trim(), line.unit.trim()).await?;

            recipe_ingredient::ActiveModel {
                recipe_id: Set(recipe_id),
                ingredient_id: Set(ingredient.id),
                quantity: Set(line.quantity),
                unit: Set(line.unit.trim().to_string()),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }

        debug!(recipe_id, count = lines.len(), "ingredients attached");
        Ok(())
    }

    /// Une ligne pivot par nom de catégorie fourni
    pub async fn attach_categories<C>(
        db: &C,
        recipe_id: i32,
        names: &[String],
    ) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        for name in names {
            let category = Self::find_or_create_category(db, name.trim()).await?;

            recipe_category::ActiveModel {
                recipe_id: Set(recipe_id),
                category_id: Set(category.id),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }

        debug!(recipe_id, count = names.len(), "categories attached");
        Ok(())
    }

    pub async fn replace_ingredients<C>(
        db: &C,
        recipe_id: i32,
        lines: &[IngredientInput],
    ) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        recipe_ingredient::Entity::delete_many()
            .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
            .exec(db)
            .await?;
        Self::attach_ingredients(db, recipe_id, lines).await
    }

    pub async fn replace_categories<C>(
        db: &C,
        recipe_id: i32,
        names: &[String],
    ) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        recipe_category::Entity::delete_many()
            .filter(recipe_category::Column::RecipeId.eq(recipe_id))
            .exec(db)
            .await?;
        Self::attach_categories(db, recipe_id, names).await
    }

    /// 404 si la recette n'existe pas, 403 si l'appelant n'en est pas l'auteur
    async fn find_owned(
        db: &DatabaseConnection,
        user_id: i32,
        recipe_id: i32,
    ) -> ApiResult<recipe::Model> {
        let recipe = recipe::Entity::find_by_id(recipe_id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found(RECIPE_NOT_FOUND))?;

        if recipe.user_id != user_id {
            return Err(ApiError::not_owner());
        }
        Ok(recipe)
    }
}

fn validate_lines(ingredients: &[IngredientInput], categories: &[String]) -> ApiResult<()> {
    for line in ingredients {
        line.validate()?;
        if line.name.trim().is_empty() || line.unit.trim().is_empty() {
            return Err(ApiError::validation("Ingrédient incomplet (nom et unité requis)"));
        }
        if !line.quantity.is_finite() {
            return Err(ApiError::validation("La quantité doit être un nombre"));
        }
    }
    if categories.iter().any(|name| name.trim().is_empty()) {
        return Err(ApiError::validation("Nom de catégorie vide"));
    }
    Ok(())
}
