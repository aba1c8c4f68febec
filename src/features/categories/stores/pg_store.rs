use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::categories::models::{Category, CategoryInput, CategoryListRow};
use crate::features::categories::rules;
use crate::features::categories::stores::CategoryStore;

const CATEGORY_COLUMNS: &str = "id, name, status, parent_id, created_at, updated_at";
const NOT_OWN_PARENT_CONSTRAINT: &str = "categories_not_own_parent";

/// PostgreSQL-backed category store
pub struct PgCategoryStore {
    pool: PgPool,
}

impl PgCategoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn read_error(context: &str, e: sqlx::Error) -> AppError {
    tracing::error!("Failed to {}: {:?}", context, e);
    AppError::Database(e)
}

/// Constraint violations that slipped past the service's pre-checks
/// (concurrent writers) become the same field errors the checks produce.
fn write_error(context: &str, e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_unique_violation() {
            return AppError::Validation(rules::name_taken());
        }
        if db.is_foreign_key_violation() {
            return AppError::Validation(rules::parent_invalid());
        }
        if db.constraint() == Some(NOT_OWN_PARENT_CONSTRAINT) {
            return AppError::Validation(rules::self_parent());
        }
    }
    read_error(context, e)
}

#[async_trait]
impl CategoryStore for PgCategoryStore {
    async fn find(&self, id: i64) -> Result<Option<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {} FROM categories WHERE id = $1",
            CATEGORY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| read_error("get category", e))
    }

    async fn count(&self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| read_error("count categories", e))
    }

    async fn all(&self) -> Result<Vec<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {} FROM categories ORDER BY name, id",
            CATEGORY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| read_error("list categories", e))
    }

    async fn children(&self, parent_id: i64) -> Result<Vec<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {} FROM categories WHERE parent_id = $1 ORDER BY name, id",
            CATEGORY_COLUMNS
        ))
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| read_error("list child categories", e))
    }

    async fn name_taken(
        &self,
        name: &str,
        parent_id: Option<i64>,
        exclude_id: Option<i64>,
    ) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM categories
                WHERE name = $1
                  AND parent_id IS NOT DISTINCT FROM $2
                  AND ($3::BIGINT IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(name)
        .bind(parent_id)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| read_error("check category name", e))
    }

    async fn insert(&self, input: &CategoryInput) -> Result<Category> {
        sqlx::query_as::<_, Category>(&format!(
            r#"
            INSERT INTO categories (name, status, parent_id)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        ))
        .bind(&input.name)
        .bind(input.status)
        .bind(input.parent_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error("create category", e))
    }

    async fn update(&self, id: i64, input: &CategoryInput) -> Result<Option<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            r#"
            UPDATE categories
            SET name = $1, status = $2, parent_id = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        ))
        .bind(&input.name)
        .bind(input.status)
        .bind(input.parent_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| write_error("update category", e))
    }

    async fn delete_reassigning_children(&self, id: i64) -> Result<Option<u64>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| read_error("begin delete transaction", e))?;

        // Lock the row so nobody re-parents onto it mid-delete
        let parent_id = match sqlx::query_scalar::<_, Option<i64>>(
            "SELECT parent_id FROM categories WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| read_error("lock category", e))?
        {
            Some(parent_id) => parent_id,
            None => return Ok(None),
        };

        let clash = sqlx::query_scalar::<_, String>(
            r#"
            SELECT c.name FROM categories c
            WHERE c.parent_id = $1
              AND EXISTS (
                  SELECT 1 FROM categories s
                  WHERE s.name = c.name
                    AND s.parent_id IS NOT DISTINCT FROM $2
                    AND s.id <> $1
              )
            ORDER BY c.name
            LIMIT 1
            "#,
        )
        .bind(id)
        .bind(parent_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| read_error("check sibling names", e))?;

        if let Some(name) = clash {
            return Err(AppError::Conflict(format!(
                "Cannot delete category {}: child '{}' would clash with an existing sibling",
                id, name
            )));
        }

        sqlx::query("SET CONSTRAINTS categories_parent_fk DEFERRED")
            .execute(&mut *tx)
            .await
            .map_err(|e| read_error("defer parent constraint", e))?;

        // Row first: a child named like the deleted row must not collide with it
        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| write_error("delete category", e))?;

        let moved = sqlx::query(
            "UPDATE categories SET parent_id = $2, updated_at = NOW() WHERE parent_id = $1",
        )
        .bind(id)
        .bind(parent_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error("reassign child categories", e))?
        .rows_affected();

        tx.commit()
            .await
            .map_err(|e| read_error("commit delete transaction", e))?;

        Ok(Some(moved))
    }

    async fn page(&self, offset: i64, limit: i64) -> Result<(Vec<CategoryListRow>, i64)> {
        let total = self.count().await?;

        let rows = sqlx::query_as::<_, CategoryListRow>(
            r#"
            SELECT
                c.id, c.name, c.status, c.parent_id,
                p.name AS parent_name,
                c.created_at, c.updated_at
            FROM categories c
            LEFT JOIN categories p ON p.id = c.parent_id
            ORDER BY c.name, c.id
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| read_error("list categories page", e))?;

        Ok((rows, total))
    }
}

/// Runs against the database in `DATABASE_URL`, each test in its own
/// throwaway schema. Skipped when the variable is unset.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::database::run_migrations;
    use crate::features::categories::models::CategoryStatus;
    use sqlx::{postgres::PgPoolOptions, Executor};
    use uuid::Uuid;

    struct Scratch {
        store: PgCategoryStore,
        pool: PgPool,
        schema: String,
    }

    impl Scratch {
        async fn drop_schema(self) {
            self.pool
                .execute(format!("DROP SCHEMA {} CASCADE", self.schema).as_str())
                .await
                .unwrap();
            self.pool.close().await;
        }
    }

    async fn scratch() -> Option<Scratch> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping Postgres store test");
            return None;
        };

        let schema = format!("category_test_{}", Uuid::new_v4().simple());
        let admin = PgPool::connect(&url).await.unwrap();
        admin
            .execute(format!("CREATE SCHEMA {}", schema).as_str())
            .await
            .unwrap();
        admin.close().await;

        let search_path = format!("SET search_path TO {}", schema);
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .after_connect(move |conn, _meta| {
                let search_path = search_path.clone();
                Box::pin(async move {
                    conn.execute(search_path.as_str()).await?;
                    Ok(())
                })
            })
            .connect(&url)
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();

        Some(Scratch {
            store: PgCategoryStore::new(pool.clone()),
            pool,
            schema,
        })
    }

    fn input(name: &str, parent_id: Option<i64>) -> CategoryInput {
        CategoryInput::new(name, CategoryStatus::Enabled, parent_id)
    }

    fn is_field_error(err: &AppError, field: &str, message: &str) -> bool {
        matches!(err, AppError::Validation(e) if e.messages(field) == [message])
    }

    #[tokio::test]
    async fn test_delete_moves_children_to_grandparent() {
        let Some(db) = scratch().await else { return };
        let store = &db.store;

        let bedroom = store.insert(&input("Bedroom", None)).await.unwrap();
        let beds = store.insert(&input("Beds", Some(bedroom.id))).await.unwrap();
        let panel = store.insert(&input("Panel Bed", Some(beds.id))).await.unwrap();
        let frame = store.insert(&input("Frames", Some(beds.id))).await.unwrap();

        assert_eq!(store.delete_reassigning_children(beds.id).await.unwrap(), Some(2));

        assert!(store.find(beds.id).await.unwrap().is_none());
        for id in [panel.id, frame.id] {
            let child = store.find(id).await.unwrap().unwrap();
            assert_eq!(child.parent_id, Some(bedroom.id));
        }

        assert_eq!(store.delete_reassigning_children(beds.id).await.unwrap(), None);
        db.drop_schema().await;
    }

    #[tokio::test]
    async fn test_delete_root_promotes_children() {
        let Some(db) = scratch().await else { return };
        let store = &db.store;

        let kitchen = store.insert(&input("Kitchen", None)).await.unwrap();
        let cookware = store.insert(&input("Cookware", Some(kitchen.id))).await.unwrap();

        assert_eq!(store.delete_reassigning_children(kitchen.id).await.unwrap(), Some(1));
        assert_eq!(store.find(cookware.id).await.unwrap().unwrap().parent_id, None);
        db.drop_schema().await;
    }

    #[tokio::test]
    async fn test_delete_child_named_like_deleted_row() {
        let Some(db) = scratch().await else { return };
        let store = &db.store;

        let living = store.insert(&input("Living Room", None)).await.unwrap();
        let outer = store.insert(&input("Tables", Some(living.id))).await.unwrap();
        let inner = store.insert(&input("Tables", Some(outer.id))).await.unwrap();

        assert_eq!(store.delete_reassigning_children(outer.id).await.unwrap(), Some(1));

        assert!(store.find(outer.id).await.unwrap().is_none());
        let inner = store.find(inner.id).await.unwrap().unwrap();
        assert_eq!(inner.parent_id, Some(living.id));
        db.drop_schema().await;
    }

    #[tokio::test]
    async fn test_delete_sibling_clash_rolls_back() {
        let Some(db) = scratch().await else { return };
        let store = &db.store;

        let bedroom = store.insert(&input("Bedroom", None)).await.unwrap();
        let beds = store.insert(&input("Beds", Some(bedroom.id))).await.unwrap();
        store.insert(&input("Tables", Some(bedroom.id))).await.unwrap();
        let nested = store.insert(&input("Tables", Some(beds.id))).await.unwrap();
        let lamp = store.insert(&input("Lamps", Some(beds.id))).await.unwrap();

        let err = store.delete_reassigning_children(beds.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        assert!(store.find(beds.id).await.unwrap().is_some());
        for id in [nested.id, lamp.id] {
            assert_eq!(
                store.find(id).await.unwrap().unwrap().parent_id,
                Some(beds.id)
            );
        }
        db.drop_schema().await;
    }

    #[tokio::test]
    async fn test_constraint_violations_become_field_errors() {
        let Some(db) = scratch().await else { return };
        let store = &db.store;

        let bedroom = store.insert(&input("Bedroom", None)).await.unwrap();
        store.insert(&input("Beds", Some(bedroom.id))).await.unwrap();

        let err = store.insert(&input("Beds", Some(bedroom.id))).await.unwrap_err();
        assert!(is_field_error(&err, rules::FIELD_NAME, rules::NAME_TAKEN));

        let err = store.insert(&input("Bedroom", None)).await.unwrap_err();
        assert!(is_field_error(&err, rules::FIELD_NAME, rules::NAME_TAKEN));

        let err = store.insert(&input("Orphan", Some(999_999))).await.unwrap_err();
        assert!(is_field_error(&err, rules::FIELD_PARENT_ID, rules::PARENT_INVALID));

        let err = store
            .update(bedroom.id, &input("Bedroom", Some(bedroom.id)))
            .await
            .unwrap_err();
        assert!(is_field_error(&err, rules::FIELD_PARENT_ID, rules::SELF_PARENT));
        db.drop_schema().await;
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_insert() {
        let Some(db) = scratch().await else { return };
        let store = &db.store;

        let root = store.insert(&input("Living Room", None)).await.unwrap();
        let sofa = input("Sofas", Some(root.id));
        let (first, second) = tokio::join!(store.insert(&sofa), store.insert(&sofa));

        let results = [first, second];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let err = results.into_iter().find_map(|r| r.err()).unwrap();
        assert!(is_field_error(&err, rules::FIELD_NAME, rules::NAME_TAKEN));
        db.drop_schema().await;
    }

    #[tokio::test]
    async fn test_name_taken_scopes_to_parent() {
        let Some(db) = scratch().await else { return };
        let store = &db.store;

        let bedroom = store.insert(&input("Bedroom", None)).await.unwrap();
        let beds = store.insert(&input("Beds", Some(bedroom.id))).await.unwrap();

        assert!(store.name_taken("Bedroom", None, None).await.unwrap());
        assert!(!store.name_taken("Bedroom", None, Some(bedroom.id)).await.unwrap());
        assert!(store.name_taken("Beds", Some(bedroom.id), None).await.unwrap());
        assert!(!store.name_taken("Beds", None, None).await.unwrap());
        assert!(!store
            .name_taken("Beds", Some(bedroom.id), Some(beds.id))
            .await
            .unwrap());
        db.drop_schema().await;
    }

    #[tokio::test]
    async fn test_page_orders_by_name_with_parent_name() {
        let Some(db) = scratch().await else { return };
        let store = &db.store;

        let kitchen = store.insert(&input("Kitchen", None)).await.unwrap();
        store.insert(&input("Appliances", Some(kitchen.id))).await.unwrap();
        store.insert(&input("Bedroom", None)).await.unwrap();

        let (rows, total) = store.page(0, 2).await.unwrap();
        assert_eq!(total, 3);
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Appliances", "Bedroom"]);
        assert_eq!(rows[0].parent_name.as_deref(), Some("Kitchen"));
        assert_eq!(rows[1].parent_name, None);

        let (rest, _) = store.page(2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);

        let (far, _) = store.page(i64::MAX, 10).await.unwrap();
        assert!(far.is_empty());
        db.drop_schema().await;
    }
}
