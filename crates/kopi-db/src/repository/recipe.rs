//! # Recipe Repository
//!
//! Database operations for recipes and their ingredient lines.
//!
//! ## Ownership
//! Ingredient lines are exclusively owned by their recipe: they are
//! inserted in the same transaction as the header and cascade-deleted
//! with it (FK `ON DELETE CASCADE`). Ingredient *products* are referenced
//! by id only; deleting a recipe never touches them.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use kopi_core::{Recipe, RecipeIngredient};

const RECIPE_COLUMNS: &str =
    "id, product_id, product_name, created_at, updated_at, sync_version";

const INGREDIENT_COLUMNS: &str = "id, recipe_id, ingredient_product_id, ingredient_name, \
     quantity_needed, unit, created_at";

/// Repository for recipe database operations.
#[derive(Debug, Clone)]
pub struct RecipeRepository {
    pool: SqlitePool,
}

impl RecipeRepository {
    /// Creates a new RecipeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RecipeRepository { pool }
    }

    /// Inserts a recipe header and all its ingredient lines in one
    /// transaction: either the whole bill of materials lands or none of
    /// it does.
    pub async fn insert_recipe(
        &self,
        recipe: &Recipe,
        ingredients: &[RecipeIngredient],
    ) -> DbResult<()> {
        debug!(
            id = %recipe.id,
            product_id = %recipe.product_id,
            lines = ingredients.len(),
            "Inserting recipe"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO recipes (
                id, product_id, product_name, created_at, updated_at, sync_version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&recipe.id)
        .bind(&recipe.product_id)
        .bind(&recipe.product_name)
        .bind(recipe.created_at)
        .bind(recipe.updated_at)
        .bind(recipe.sync_version)
        .execute(&mut *tx)
        .await?;

        for ingredient in ingredients {
            sqlx::query(
                r#"
                INSERT INTO recipe_ingredients (
                    id, recipe_id, ingredient_product_id, ingredient_name,
                    quantity_needed, unit, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&ingredient.id)
            .bind(&ingredient.recipe_id)
            .bind(&ingredient.ingredient_product_id)
            .bind(&ingredient.ingredient_name)
            .bind(ingredient.quantity_needed)
            .bind(&ingredient.unit)
            .bind(ingredient.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Finds the recipe for a finished product.
    ///
    /// One recipe per product is an application assumption, not a schema
    /// constraint; lookups take the first match (oldest wins).
    pub async fn get_by_product_id(&self, product_id: &str) -> DbResult<Option<Recipe>> {
        let sql = format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes \
             WHERE product_id = ?1 ORDER BY created_at LIMIT 1"
        );
        let recipe = sqlx::query_as::<_, Recipe>(&sql)
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(recipe)
    }

    /// Gets all ingredient lines for a recipe.
    pub async fn get_ingredients(&self, recipe_id: &str) -> DbResult<Vec<RecipeIngredient>> {
        let sql = format!(
            "SELECT {INGREDIENT_COLUMNS} FROM recipe_ingredients \
             WHERE recipe_id = ?1 ORDER BY created_at"
        );
        let ingredients = sqlx::query_as::<_, RecipeIngredient>(&sql)
            .bind(recipe_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(ingredients)
    }

    /// Lists all recipes sorted by product name.
    pub async fn list(&self) -> DbResult<Vec<Recipe>> {
        let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes ORDER BY product_name");
        let recipes = sqlx::query_as::<_, Recipe>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(recipes)
    }

    /// Deletes a recipe. Ingredient lines go with it via FK cascade.
    pub async fn delete(&self, recipe_id: &str) -> DbResult<()> {
        debug!(id = %recipe_id, "Deleting recipe");

        let result = sqlx::query("DELETE FROM recipes WHERE id = ?1")
            .bind(recipe_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Recipe", recipe_id));
        }

        Ok(())
    }
}

/// Generates a new recipe id.
pub fn generate_recipe_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new recipe ingredient id.
pub fn generate_ingredient_id() -> String {
    Uuid::new_v4().to_string()
}
