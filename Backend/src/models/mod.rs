// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque modèle correspond à une table créée par db::sync_schema.
//
// Liste des modules:
//   - users : Utilisateurs (mot de passe hashé dans before_save)
//   - recipe : Recettes (+ enum Difficulty: Facile/Moyen/Difficile)
//   - ingredient : Ingrédients, nom unique (clé du find-or-create)
//   - category : Catégories, nom = clé du find-or-create
//   - comment : Commentaires d'un utilisateur sur une recette
//   - recipe_ingredient : Pivot Recipe <-> Ingredient (quantité, unité)
//   - recipe_category : Pivot Recipe <-> Category
//   - dto : Formes des réponses API
//
// Points d'attention:
//   - Les tables pivot ont un id technique, les doublons ne sont pas bloqués
//   - Supprimer une recette ne supprime jamais d'Ingredient ni de Category
//
// ============================================================================

pub mod users;
pub mod recipe;
pub mod ingredient;
pub mod category;
pub mod comment;
pub mod recipe_ingredient;
pub mod recipe_category;
pub mod dto;
