use actix_web::{delete, get, post, put, web, HttpResponse};
use sea_orm::{Condition, DatabaseConnection};

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::dto::{AddCommentRequest, CreateRecipeRequest, UpdateRecipeRequest};
use crate::services::recipe_service::RecipeService;
use crate::utils::pagination::{PageQuery, Pagination};

/// GET /api/recipes?page&limit - Liste paginée (PUBLIC)
#[get("")]
pub async fn list_recipes(
    query: web::Query<PageQuery>,
    db: web::Data<DatabaseConnection>,
) -> ApiResult<HttpResponse> {
    let pagination = Pagination::from_query(&query);
    let page = RecipeService::fetch_page(db.get_ref(), Condition::all(), pagination).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// POST /api/recipes - Créer une recette (PROTÉGÉE)
#[post("")]
pub async fn create_recipe(
    auth_user: AuthUser,
    body: web::Json<CreateRecipeRequest>,
    db: web::Data<DatabaseConnection>,
) -> ApiResult<HttpResponse> {
    let recipe = RecipeService::create_recipe(db.get_ref(), auth_user.id(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(recipe))
}

/// GET /api/recipes/{id} - Détail avec commentaires (PUBLIC)
#[get("/{id}")]
pub async fn get_recipe(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> ApiResult<HttpResponse> {
    let recipe = RecipeService::fetch_recipe_detail(db.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("Recette non trouvée"))?;
    Ok(HttpResponse::Ok().json(recipe))
}

/// PUT /api/recipes/{id} - Mise à jour par l'auteur (PROTÉGÉE)
#[put("/{id}")]
pub async fn update_recipe(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<UpdateRecipeRequest>,
    db: web::Data<DatabaseConnection>,
) -> ApiResult<HttpResponse> {
    let recipe = RecipeService::update_recipe(
        db.get_ref(),
        auth_user.id(),
        path.into_inner(),
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(recipe))
}

/// DELETE /api/recipes/{id} - Suppression par l'auteur (PROTÉGÉE)
#[delete("/{id}")]
pub async fn delete_recipe(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> ApiResult<HttpResponse> {
    RecipeService::delete_recipe(db.get_ref(), auth_user.id(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/recipes/{id}/comments - Commenter une recette (PROTÉGÉE)
#[post("/{id}/comments")]
pub async fn add_comment(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<AddCommentRequest>,
    db: web::Data<DatabaseConnection>,
) -> ApiResult<HttpResponse> {
    let comment = RecipeService::add_comment(
        db.get_ref(),
        &auth_user.user,
        path.into_inner(),
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Created().json(comment))
}

pub fn recipes_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/recipes")
            .service(list_recipes)
            .service(create_recipe)
            .service(get_recipe)
            .service(update_recipe)
            .service(delete_recipe)
            .service(add_comment)
    );
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use actix_web::http::StatusCode;
    use actix_web::test;
    use sea_orm::{EntityTrait, PaginatorTrait};
    use serde_json::{json, Value};

    use crate::models::{category, comment, ingredient, recipe_category, recipe_ingredient};
    use crate::test_support::{
        bearer, create_recipe, recipe_payload, register, test_app, test_config, test_db,
    };

    fn names(values: &Value) -> Vec<String> {
        let mut names: Vec<String> = values
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["name"].as_str().unwrap().to_string())
            .collect();
        names.sort();
        names
    }

    #[actix_web::test]
    async fn test_create_recipe_with_associations() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db().await;
        let app = test::init_service(test_app(db.clone(), test_config(dir.path().into()))).await;
        let (user, token) = register(&app, "Alice", "alice@example.com", "secret1").await;

        let created = create_recipe(&app, &token, json!({
            "title": "Crêpes",
            "description": "Pâte à crêpes",
            "duration": 20,
            "difficulty": "Facile",
            "ingredients": [
                { "name": "Farine", "quantity": 250, "unit": "g" },
                { "name": "Lait", "quantity": 0.5, "unit": "l" }
            ],
            "categories": ["Dessert", "Rapide"]
        }))
        .await;

        assert_eq!(created["title"], "Crêpes");
        assert_eq!(created["difficulty"], "Facile");
        assert_eq!(created["user_id"], user["id"]);
        assert_eq!(created["user"]["name"], "Alice");
        assert!(created["user"].get("email").is_none());
        assert_eq!(names(&created["categories"]), vec!["Dessert", "Rapide"]);
        assert_eq!(names(&created["ingredients"]), vec!["Farine", "Lait"]);

        let lait = created["ingredients"]
            .as_array()
            .unwrap()
            .iter()
            .find(|line| line["name"] == "Lait")
            .unwrap();
        assert_eq!(lait["quantity"], 0.5);
        assert_eq!(lait["unit"], "l");

        // Les noms existants sont réutilisés (espaces autour ignorés)
        let second = create_recipe(&app, &token, json!({
            "title": "Gâteau",
            "duration": 45,
            "ingredients": [{ "name": " Farine ", "quantity": 200, "unit": "g" }],
            "categories": ["Dessert "]
        }))
        .await;
        assert_eq!(second["difficulty"], "Moyen");
        assert_eq!(names(&second["categories"]), vec!["Dessert"]);
        assert_eq!(ingredient::Entity::find().count(&db).await.unwrap(), 2);
        assert_eq!(category::Entity::find().count(&db).await.unwrap(), 2);

        // La casse compte: "dessert" est une autre catégorie
        create_recipe(&app, &token, json!({
            "title": "Sorbet",
            "duration": 5,
            "categories": ["dessert"]
        }))
        .await;
        assert_eq!(category::Entity::find().count(&db).await.unwrap(), 3);
        assert_eq!(recipe_ingredient::Entity::find().count(&db).await.unwrap(), 3);
    }

    #[actix_web::test]
    async fn test_create_recipe_requires_auth_and_title() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(test_app(test_db().await, test_config(dir.path().into()))).await;
        let (_, token) = register(&app, "Alice", "alice@example.com", "secret1").await;

        let request = test::TestRequest::post()
            .uri("/api/recipes")
            .set_json(recipe_payload("Soupe", 30))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let request = test::TestRequest::post()
            .uri("/api/recipes")
            .insert_header(bearer(&token))
            .set_json(json!({ "title": "", "duration": 10 }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let request = test::TestRequest::post()
            .uri("/api/recipes")
            .insert_header(bearer(&token))
            .set_json(json!({ "title": "Soupe", "duration": 10, "difficulty": "Extrême" }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_update_replaces_associations() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(test_app(test_db().await, test_config(dir.path().into()))).await;
        let (_, token) = register(&app, "Alice", "alice@example.com", "secret1").await;

        let created = create_recipe(&app, &token, json!({
            "title": "Salade",
            "duration": 10,
            "ingredients": [{ "name": "Tomate", "quantity": 2, "unit": "pièce" }],
            "categories": ["Entrée"]
        }))
        .await;
        let id = created["id"].as_i64().unwrap();

        let request = test::TestRequest::put()
            .uri(&format!("/api/recipes/{}", id))
            .insert_header(bearer(&token))
            .set_json(json!({
                "duration": 15,
                "ingredients": [
                    { "name": "Concombre", "quantity": 1, "unit": "pièce" },
                    { "name": "Feta", "quantity": 100, "unit": "g" }
                ],
                "categories": ["Été"]
            }))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, request).await;

        assert_eq!(updated["title"], "Salade");
        assert_eq!(updated["duration"], 15);
        assert_eq!(names(&updated["ingredients"]), vec!["Concombre", "Feta"]);
        assert_eq!(names(&updated["categories"]), vec!["Été"]);

        // Listes absentes: associations inchangées
        let request = test::TestRequest::put()
            .uri(&format!("/api/recipes/{}", id))
            .insert_header(bearer(&token))
            .set_json(json!({ "title": "Salade grecque" }))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(updated["title"], "Salade grecque");
        assert_eq!(names(&updated["ingredients"]), vec!["Concombre", "Feta"]);
    }

    #[actix_web::test]
    async fn test_update_null_clears_optional_fields() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(test_app(test_db().await, test_config(dir.path().into()))).await;
        let (_, token) = register(&app, "Alice", "alice@example.com", "secret1").await;

        let created = create_recipe(&app, &token, json!({
            "title": "Velouté",
            "description": "Potimarron",
            "duration": 35,
            "image": "/uploads/veloute.jpg",
            "video": "https://example.com/veloute"
        }))
        .await;

        let request = test::TestRequest::put()
            .uri(&format!("/api/recipes/{}", created["id"]))
            .insert_header(bearer(&token))
            .set_json(json!({ "description": null, "video": null }))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, request).await;

        assert!(updated["description"].is_null());
        assert!(updated["video"].is_null());
        assert_eq!(updated["image"], "/uploads/veloute.jpg");
        assert_eq!(updated["title"], "Velouté");
    }

    #[actix_web::test]
    async fn test_only_author_can_modify() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db().await;
        let app = test::init_service(test_app(db.clone(), test_config(dir.path().into()))).await;
        let (_, alice) = register(&app, "Alice", "alice@example.com", "secret1").await;
        let (_, bob) = register(&app, "Bob", "bob@example.com", "secret1").await;

        let created = create_recipe(&app, &alice, json!({
            "title": "Ratatouille",
            "duration": 60,
            "ingredients": [{ "name": "Courgette", "quantity": 2, "unit": "pièce" }],
            "categories": ["Plat"]
        }))
        .await;
        let uri = format!("/api/recipes/{}", created["id"]);

        let request = test::TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(&bob))
            .set_json(json!({ "title": "Volée" }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let request = test::TestRequest::delete()
            .uri(&uri)
            .insert_header(bearer(&bob))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // Commentaire de Bob, puis suppression par l'autrice
        let request = test::TestRequest::post()
            .uri(&format!("{}/comments", uri))
            .insert_header(bearer(&bob))
            .set_json(json!({ "content": "Miam" }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let request = test::TestRequest::delete()
            .uri(&uri)
            .insert_header(bearer(&alice))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let request = test::TestRequest::get().uri(&uri).to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        assert_eq!(comment::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(recipe_ingredient::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(recipe_category::Entity::find().count(&db).await.unwrap(), 0);
        // Vocabulaire partagé conservé
        assert_eq!(ingredient::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[actix_web::test]
    async fn test_get_recipe_with_comments() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(test_app(test_db().await, test_config(dir.path().into()))).await;
        let (_, alice) = register(&app, "Alice", "alice@example.com", "secret1").await;
        let (_, bob) = register(&app, "Bob", "bob@example.com", "secret1").await;

        let created = create_recipe(&app, &alice, recipe_payload("Quiche", 50)).await;
        let uri = format!("/api/recipes/{}", created["id"]);

        for (token, content) in [(&bob, "Premier"), (&alice, "Merci")] {
            let request = test::TestRequest::post()
                .uri(&format!("{}/comments", uri))
                .insert_header(bearer(token))
                .set_json(json!({ "content": content }))
                .to_request();
            let comment: Value = test::call_and_read_body_json(&app, request).await;
            assert_eq!(comment["content"], content);
        }

        let request = test::TestRequest::get().uri(&uri).to_request();
        let detail: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(detail["title"], "Quiche");
        assert_eq!(detail["user"]["name"], "Alice");

        let comments = detail["comments"].as_array().unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0]["content"], "Premier");
        assert_eq!(comments[0]["user"]["name"], "Bob");
        assert_eq!(comments[1]["user"]["name"], "Alice");
    }

    #[actix_web::test]
    async fn test_missing_recipe() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(test_app(test_db().await, test_config(dir.path().into()))).await;
        let (_, token) = register(&app, "Alice", "alice@example.com", "secret1").await;

        let request = test::TestRequest::get().uri("/api/recipes/999").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["error"], "Recette non trouvée");

        let request = test::TestRequest::post()
            .uri("/api/recipes/999/comments")
            .insert_header(bearer(&token))
            .set_json(json!({ "content": "Perdu" }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let request = test::TestRequest::get().uri("/api/recipes/abc").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_pagination_covers_every_recipe_once() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(test_app(test_db().await, test_config(dir.path().into()))).await;
        let (_, token) = register(&app, "Alice", "alice@example.com", "secret1").await;

        let mut created_ids = Vec::new();
        for i in 0..7 {
            let recipe = create_recipe(&app, &token, recipe_payload(&format!("Recette {}", i), 10 + i)).await;
            created_ids.push(recipe["id"].as_i64().unwrap());
        }

        let mut listed_ids = Vec::new();
        for page in 1..=3 {
            let request = test::TestRequest::get()
                .uri(&format!("/api/recipes?page={}&limit=3", page))
                .to_request();
            let body: Value = test::call_and_read_body_json(&app, request).await;
            assert_eq!(body["total"], 7);
            assert_eq!(body["totalPages"], 3);
            assert_eq!(body["currentPage"], page);

            let recipes = body["recipes"].as_array().unwrap();
            assert!(recipes.len() <= 3);
            listed_ids.extend(recipes.iter().map(|r| r["id"].as_i64().unwrap()));
        }

        // Plus récente d'abord, sans doublon ni oubli
        created_ids.reverse();
        assert_eq!(listed_ids, created_ids);
        assert_eq!(listed_ids.iter().collect::<HashSet<_>>().len(), 7);

        // Valeurs invalides: page 1, limite par défaut
        let request = test::TestRequest::get()
            .uri("/api/recipes?page=abc&limit=-4")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["currentPage"], 1);
        assert_eq!(body["recipes"].as_array().unwrap().len(), 7);
    }

    #[actix_web::test]
    async fn test_page_beyond_any_offset_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(test_app(test_db().await, test_config(dir.path().into()))).await;
        let (_, token) = register(&app, "Alice", "alice@example.com", "secret1").await;
        create_recipe(&app, &token, recipe_payload("Soupe", 15)).await;

        for uri in [
            "/api/recipes?page=18446744073709551615&limit=100",
            "/api/search/recipes?q=soupe&page=18446744073709551615&limit=100",
        ] {
            let request = test::TestRequest::get().uri(uri).to_request();
            let response = test::call_service(&app, request).await;
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);

            let body: Value = test::read_body_json(response).await;
            assert_eq!(body["total"], 1);
            assert!(body["recipes"].as_array().unwrap().is_empty());
        }
    }
}
