//! SeaORM-backed sales store
//!
//! Works with any backend sea-orm is built for here (PostgreSQL in
//! deployments, SQLite for local files and tests). Filters are translated
//! into a sea-orm [`Condition`]; `between` becomes `gte(lower) AND lt(upper)`
//! because SQL `BETWEEN` includes its upper bound.

use std::time::Duration;

use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ActiveValue::Set, ColumnTrait, Condition,
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Schema, UpdateMany,
};

use super::{SalesStore, StoreError, StoreResult};
use crate::Sales;
use crate::entity::sales;
use crate::filter::{Direction, Field, FieldValue, Filter, Predicate, Where};
use crate::model::{SalesData, SalesPatch};

pub struct DatabaseSalesStore {
    db: DatabaseConnection,
}

impl DatabaseSalesStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Connect with a pooled connection. SQLite in-memory URLs are pinned to
    /// a single connection so every query sees the same database.
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let max_connections = if url.contains(":memory:") {
            1
        } else {
            max_connections.max(1)
        };

        let mut opt = ConnectOptions::new(url.to_owned());
        opt.max_connections(max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(8))
            .sqlx_logging(false);

        let db = Database::connect(opt).await?;
        tracing::info!(
            backend = ?db.get_database_backend(),
            max_connections,
            "Connected to sales database"
        );
        Ok(Self::new(db))
    }

    /// Create the `sales` table and its lookup indexes if they are missing.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        let backend = self.db.get_database_backend();
        let schema = Schema::new(backend);

        let mut table = schema.create_table_from_entity(sales::Entity);
        table.if_not_exists();
        self.db.execute(backend.build(&table)).await?;

        for mut index in schema.create_index_from_entity(sales::Entity) {
            index.if_not_exists();
            self.db.execute(backend.build(&index)).await?;
        }

        Ok(())
    }

}

fn column(field: Field) -> sales::Column {
    match field {
        Field::Id => sales::Column::Id,
        Field::Description => sales::Column::Description,
        Field::Date => sales::Column::Date,
        Field::Country => sales::Column::Country,
        Field::Total => sales::Column::Total,
    }
}

/// Bind value for a non-null operand. Null operands never reach the binder:
/// a NULL bound as text breaks typed comparisons on PostgreSQL.
fn value(value: &FieldValue) -> Option<sea_orm::Value> {
    match value {
        FieldValue::Null => None,
        FieldValue::Int(id) => Some((*id).into()),
        FieldValue::Number(number) => Some((*number).into()),
        FieldValue::Text(text) => Some(text.clone().into()),
        FieldValue::Date(date) => Some((*date).into()),
    }
}

/// Matches no row; ordered comparisons against null are never true.
fn never() -> SimpleExpr {
    Expr::val(1).eq(0)
}

fn compare(
    operand: &FieldValue,
    op: impl FnOnce(sea_orm::Value) -> SimpleExpr,
) -> SimpleExpr {
    value(operand).map(op).unwrap_or_else(never)
}

fn predicate(field: Field, predicate: &Predicate) -> SimpleExpr {
    let col = column(field);
    match predicate {
        Predicate::Eq(FieldValue::Null) => col.is_null(),
        Predicate::Neq(FieldValue::Null) => col.is_not_null(),
        Predicate::Eq(operand) => compare(operand, |v| col.eq(v)),
        Predicate::Neq(operand) => compare(operand, |v| col.ne(v)),
        Predicate::Gt(operand) => compare(operand, |v| col.gt(v)),
        Predicate::Gte(operand) => compare(operand, |v| col.gte(v)),
        Predicate::Lt(operand) => compare(operand, |v| col.lt(v)),
        Predicate::Lte(operand) => compare(operand, |v| col.lte(v)),
        Predicate::Between(lower, upper) => match (value(lower), value(upper)) {
            (Some(lower), Some(upper)) => col.gte(lower).and(col.lt(upper)),
            _ => never(),
        },
        // Null list entries never compare equal, so they are dropped.
        Predicate::Inq(options) => col.is_in(options.iter().filter_map(value)),
        Predicate::Nin(options) => col
            .is_not_null()
            .and(col.is_not_in(options.iter().filter_map(value))),
    }
}

fn condition(where_clause: &Where) -> Condition {
    match where_clause {
        Where::All(clauses) => clauses
            .iter()
            .fold(Condition::all(), |acc, clause| acc.add(condition(clause))),
        Where::Any(clauses) => clauses
            .iter()
            .fold(Condition::any(), |acc, clause| acc.add(condition(clause))),
        Where::Field(field, p) => Condition::all().add(predicate(*field, p)),
    }
}

fn with_patch(
    mut update: UpdateMany<sales::Entity>,
    patch: &SalesPatch,
) -> UpdateMany<sales::Entity> {
    if let Some(description) = &patch.description {
        update = update.col_expr(sales::Column::Description, Expr::value(description.clone()));
    }
    if let Some(date) = patch.date {
        update = update.col_expr(sales::Column::Date, Expr::value(date));
    }
    if let Some(country) = &patch.country {
        update = update.col_expr(sales::Column::Country, Expr::value(country.clone()));
    }
    if let Some(total) = patch.total {
        update = update.col_expr(sales::Column::Total, Expr::value(total));
    }
    update
}

#[async_trait::async_trait]
impl SalesStore for DatabaseSalesStore {
    async fn create(&self, data: SalesData) -> StoreResult<Sales> {
        let record = sales::ActiveModel {
            id: NotSet,
            description: Set(data.description),
            date: Set(data.date),
            country: Set(data.country),
            total: Set(data.total),
        };

        Ok(record.insert(&self.db).await?)
    }

    async fn find(&self, filter: &Filter) -> StoreResult<Vec<Sales>> {
        let mut query = sales::Entity::find();

        if let Some(where_clause) = &filter.where_clause {
            query = query.filter(condition(where_clause));
        }

        for order in &filter.order {
            query = match order.direction {
                Direction::Asc => query.order_by_asc(column(order.field)),
                Direction::Desc => query.order_by_desc(column(order.field)),
            };
        }
        // Ties fall back to id order, as in the in-memory store
        query = query.order_by_asc(sales::Column::Id);

        // SQLite rejects OFFSET without LIMIT
        let limit = match (filter.limit, filter.skip) {
            (None, Some(_)) => Some(i64::MAX as u64),
            (limit, _) => limit,
        };
        query = query.limit(limit).offset(filter.skip);

        Ok(query.all(&self.db).await?)
    }

    async fn find_by_id(&self, id: i32) -> StoreResult<Sales> {
        sales::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    async fn count(&self, where_clause: Option<&Where>) -> StoreResult<u64> {
        let mut query = sales::Entity::find();
        if let Some(where_clause) = where_clause {
            query = query.filter(condition(where_clause));
        }
        Ok(query.count(&self.db).await?)
    }

    async fn update_all(
        &self,
        patch: &SalesPatch,
        where_clause: Option<&Where>,
    ) -> StoreResult<u64> {
        if patch.is_empty() {
            return self.count(where_clause).await;
        }

        let mut update = with_patch(sales::Entity::update_many(), patch);
        if let Some(where_clause) = where_clause {
            update = update.filter(condition(where_clause));
        }

        Ok(update.exec(&self.db).await?.rows_affected)
    }

    async fn update_by_id(&self, id: i32, patch: &SalesPatch) -> StoreResult<()> {
        if patch.is_empty() {
            return self.find_by_id(id).await.map(|_| ());
        }

        let result = with_patch(sales::Entity::update_many(), patch)
            .filter(sales::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn replace_by_id(&self, id: i32, data: SalesData) -> StoreResult<()> {
        let replacement = SalesPatch {
            description: Some(data.description),
            date: Some(data.date),
            country: Some(data.country),
            total: Some(data.total),
        };
        self.update_by_id(id, &replacement).await
    }

    async fn delete_by_id(&self, id: i32) -> StoreResult<()> {
        let result = sales::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(self.db.ping().await?)
    }
}
