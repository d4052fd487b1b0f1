use actix_web::{get, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::error::ApiResult;
use crate::services::search_service::{SearchFilters, SearchQuery, SearchService};

/// GET /api/search/recipes?q&category&difficulty&duration&page&limit (PUBLIC)
#[get("/recipes")]
pub async fn search_recipes(
    query: web::Query<SearchQuery>,
    db: web::Data<DatabaseConnection>,
) -> ApiResult<HttpResponse> {
    let filters = SearchFilters::try_from(&*query)?;
    let page = SearchService::search_recipes(db.get_ref(), &filters, query.pagination()).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub fn search_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/search").service(search_recipes));
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{json, Value};

    use crate::test_support::{create_recipe, register, test_app, test_config, test_db};

    fn titles(body: &Value) -> Vec<String> {
        let mut titles: Vec<String> = body["recipes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["title"].as_str().unwrap().to_string())
            .collect();
        titles.sort();
        titles
    }

    #[actix_web::test]
    async fn test_search_filters() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(test_app(test_db().await, test_config(dir.path().into()))).await;
        let (_, token) = register(&app, "Alice", "alice@example.com", "secret1").await;

        for (title, description, duration, difficulty, category) in [
            ("Tarte aux pommes", "Dessert de grand-mère", 45, "Moyen", "Dessert"),
            ("Compote", "Pommes cuites", 20, "Facile", "Dessert"),
            ("Omelette", "Oeufs battus", 10, "Facile", "Plat"),
            ("Boeuf bourguignon", "Mijoté", 180, "Difficile", "Plat"),
        ] {
            create_recipe(&app, &token, json!({
                "title": title,
                "description": description,
                "duration": duration,
                "difficulty": difficulty,
                "categories": [category]
            }))
            .await;
        }

        let cases = [
            ("/api/search/recipes?duration=30", vec!["Compote", "Omelette"]),
            ("/api/search/recipes?q=POMME", vec!["Compote", "Tarte aux pommes"]),
            ("/api/search/recipes?q=pomme&difficulty=Facile", vec!["Compote"]),
            ("/api/search/recipes?category=Plat", vec!["Boeuf bourguignon", "Omelette"]),
            ("/api/search/recipes?q=&difficulty=", vec![
                "Boeuf bourguignon", "Compote", "Omelette", "Tarte aux pommes",
            ]),
            ("/api/search/recipes?q=100%25", vec![]),
        ];

        for (uri, expected) in cases {
            let request = test::TestRequest::get().uri(uri).to_request();
            let body: Value = test::call_and_read_body_json(&app, request).await;
            assert_eq!(titles(&body), expected, "{}", uri);
            assert_eq!(body["total"], expected.len());
        }
    }

    #[actix_web::test]
    async fn test_search_rejects_invalid_filters() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(test_app(test_db().await, test_config(dir.path().into()))).await;

        for uri in [
            "/api/search/recipes?difficulty=Extreme",
            "/api/search/recipes?duration=longtemps",
        ] {
            let request = test::TestRequest::get().uri(uri).to_request();
            let response = test::call_service(&app, request).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        }
    }
}
