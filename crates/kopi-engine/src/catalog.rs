//! # Catalog Management
//!
//! Creating and editing products and recipes.
//!
//! Deletion policy differs between the two:
//! - products soft-delete (ledger rows keep their name snapshots, and
//!   the deactivation mirrors to the remote store like any other edit)
//! - recipes hard-delete, cascading their ingredient lines; the remote
//!   copy is removed through a tombstone payload in the outbox

use chrono::Utc;
use serde_json::json;
use tracing::info;

use kopi_core::validation::{
    validate_price_cents, validate_product_name, validate_quantity_needed,
};
use kopi_core::{
    AuditAction, AuditStatus, CoreError, Product, Recipe, RecipeIngredient, ValidationError,
    ENTITY_RECIPE, ENTITY_RECIPE_INGREDIENT,
};
use kopi_db::repository::product::generate_product_id;
use kopi_db::repository::recipe::{generate_ingredient_id, generate_recipe_id};
use kopi_db::Database;

use crate::audit;
use crate::error::{EngineError, EngineResult};
use crate::mirror;
use crate::session::SessionHandle;

/// Input for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub price_cents: i64,
    pub cost_per_unit_cents: i64,
    pub inventory_bulk: i64,
    pub inventory_display: i64,
    pub image_ref: Option<String>,
}

/// Input for one recipe ingredient line.
#[derive(Debug, Clone)]
pub struct NewIngredient {
    pub ingredient_product_id: String,
    pub quantity_needed: f64,
    pub unit: String,
}

/// Product and recipe management.
#[derive(Debug, Clone)]
pub struct CatalogService {
    db: Database,
    session: SessionHandle,
}

impl CatalogService {
    /// Creates a new CatalogService.
    pub fn new(db: Database, session: SessionHandle) -> Self {
        CatalogService { db, session }
    }

    /// Creates a product.
    pub async fn create_product(&self, input: NewProduct) -> EngineResult<Product> {
        validate_product_name(&input.name).map_err(CoreError::from)?;
        validate_price_cents(input.price_cents).map_err(CoreError::from)?;
        validate_price_cents(input.cost_per_unit_cents).map_err(CoreError::from)?;
        validate_stock_level("inventory_bulk", input.inventory_bulk)?;
        validate_stock_level("inventory_display", input.inventory_display)?;

        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            name: input.name.trim().to_string(),
            category: input.category,
            price_cents: input.price_cents,
            cost_per_unit_cents: input.cost_per_unit_cents,
            inventory_bulk: input.inventory_bulk,
            inventory_display: input.inventory_display,
            quantity: input.inventory_bulk + input.inventory_display,
            image_ref: input.image_ref,
            is_active: true,
            created_at: now,
            updated_at: now,
            sync_version: 0,
        };
        self.db.products().insert(&product).await?;

        info!(id = %product.id, name = %product.name, "Created product");

        audit::record(
            &self.db,
            &self.session.actor(),
            AuditAction::ProductAdd,
            format!("Added product {}", product.name),
            AuditStatus::Success,
        )
        .await?;
        mirror::queue_product(&self.db, &product.id).await?;

        Ok(product)
    }

    /// Updates a product's descriptive fields. Stock levels go through
    /// the inventory engine, never through here.
    pub async fn update_product(&self, product: &Product) -> EngineResult<()> {
        validate_product_name(&product.name).map_err(CoreError::from)?;
        validate_price_cents(product.price_cents).map_err(CoreError::from)?;
        validate_price_cents(product.cost_per_unit_cents).map_err(CoreError::from)?;

        self.db.products().update(product).await?;

        audit::record(
            &self.db,
            &self.session.actor(),
            AuditAction::ProductEdit,
            format!("Edited product {}", product.name),
            AuditStatus::Success,
        )
        .await?;
        mirror::queue_product(&self.db, &product.id).await?;

        Ok(())
    }

    /// Soft-deletes a product.
    pub async fn delete_product(&self, product_id: &str) -> EngineResult<()> {
        let product = self
            .db
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| EngineError::product_not_found(product_id))?;

        self.db.products().soft_delete(product_id).await?;

        info!(id = %product_id, name = %product.name, "Soft-deleted product");

        audit::record(
            &self.db,
            &self.session.actor(),
            AuditAction::ProductDelete,
            format!("Deleted product {}", product.name),
            AuditStatus::Success,
        )
        .await?;
        // The deactivated row mirrors like any other edit.
        mirror::queue_product(&self.db, product_id).await?;

        Ok(())
    }

    /// Creates a recipe for a finished product.
    ///
    /// Ingredient references are resolved up front so every line carries
    /// a denormalized name; an unknown ingredient rejects the whole
    /// recipe before anything is written.
    pub async fn create_recipe(
        &self,
        product_id: &str,
        lines: Vec<NewIngredient>,
    ) -> EngineResult<Recipe> {
        if lines.is_empty() {
            return Err(CoreError::from(ValidationError::Required {
                field: "ingredients".to_string(),
            })
            .into());
        }

        let products = self.db.products();
        let product = products
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| EngineError::product_not_found(product_id))?;

        let now = Utc::now();
        let recipe = Recipe {
            id: generate_recipe_id(),
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            created_at: now,
            updated_at: now,
            sync_version: 0,
        };

        let mut ingredients = Vec::with_capacity(lines.len());
        for line in lines {
            validate_quantity_needed(line.quantity_needed).map_err(CoreError::from)?;

            let ingredient = products
                .get_by_id(&line.ingredient_product_id)
                .await?
                .ok_or_else(|| EngineError::product_not_found(&line.ingredient_product_id))?;

            ingredients.push(RecipeIngredient {
                id: generate_ingredient_id(),
                recipe_id: recipe.id.clone(),
                ingredient_product_id: ingredient.id,
                ingredient_name: ingredient.name,
                quantity_needed: line.quantity_needed,
                unit: line.unit,
                created_at: now,
            });
        }

        self.db.recipes().insert_recipe(&recipe, &ingredients).await?;

        info!(
            id = %recipe.id,
            product = %recipe.product_name,
            lines = ingredients.len(),
            "Created recipe"
        );

        audit::record(
            &self.db,
            &self.session.actor(),
            AuditAction::RecipeAdd,
            format!("Added recipe for {}", recipe.product_name),
            AuditStatus::Success,
        )
        .await?;
        mirror::queue_entity(&self.db, ENTITY_RECIPE, &recipe.id, &recipe).await?;
        for ingredient in &ingredients {
            mirror::queue_entity(&self.db, ENTITY_RECIPE_INGREDIENT, &ingredient.id, ingredient)
                .await?;
        }

        Ok(recipe)
    }

    /// Deletes a recipe and its ingredient lines.
    pub async fn delete_recipe(&self, recipe_id: &str) -> EngineResult<()> {
        self.db.recipes().delete(recipe_id).await?;

        info!(id = %recipe_id, "Deleted recipe");

        audit::record(
            &self.db,
            &self.session.actor(),
            AuditAction::RecipeDelete,
            format!("Deleted recipe {recipe_id}"),
            AuditStatus::Success,
        )
        .await?;
        // Tombstone: the outbox worker removes the remote copy.
        mirror::queue_entity(
            &self.db,
            ENTITY_RECIPE,
            recipe_id,
            &json!({ "id": recipe_id, "deleted": true }),
        )
        .await?;

        Ok(())
    }
}

fn validate_stock_level(field: &str, value: i64) -> EngineResult<()> {
    if value < 0 {
        return Err(CoreError::from(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        })
        .into());
    }

    Ok(())
}
