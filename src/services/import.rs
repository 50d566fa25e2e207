use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        product::{self, Entity as Product},
        product_variant::{self, Entity as ProductVariant},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::ledger::StockLedger,
};

/// File store the importer reads from. Production binds this to object
/// storage; tests use [`InMemoryObjectStore`].
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_object(&self, key: &str) -> Result<Vec<u8>, ServiceError>;
    async fn get_header(&self, key: &str) -> Result<String, ServiceError>;
}

/// Map-backed store for tests and local tooling.
#[derive(Debug, Default, Clone)]
pub struct InMemoryObjectStore {
    objects: HashMap<String, (String, Vec<u8>)>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: &str, content_type: &str, bytes: Vec<u8>) {
        self.objects
            .insert(key.to_string(), (content_type.to_string(), bytes));
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get_object(&self, key: &str) -> Result<Vec<u8>, ServiceError> {
        self.objects
            .get(key)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| ServiceError::NotFound(format!("Object {} not found", key)))
    }

    async fn get_header(&self, key: &str) -> Result<String, ServiceError> {
        self.objects
            .get(key)
            .map(|(content_type, _)| content_type.clone())
            .ok_or_else(|| ServiceError::NotFound(format!("Object {} not found", key)))
    }
}

/// Store rooted at a local directory. Keys are paths relative to the root;
/// the content type is inferred from the file extension.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: std::path::PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> Result<std::path::PathBuf, ServiceError> {
        if key.contains("..") {
            return Err(ServiceError::InvalidInput(format!(
                "Object key {} must not traverse directories",
                key
            )));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn get_object(&self, key: &str) -> Result<Vec<u8>, ServiceError> {
        let path = self.resolve(key)?;
        tokio::fs::read(&path)
            .await
            .map_err(|_| ServiceError::NotFound(format!("Object {} not found", key)))
    }

    async fn get_header(&self, key: &str) -> Result<String, ServiceError> {
        let path = self.resolve(key)?;
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(ServiceError::NotFound(format!("Object {} not found", key)));
        }
        let content_type = match path.extension().and_then(|e| e.to_str()) {
            Some("csv") => "text/csv",
            _ => "application/octet-stream",
        };
        Ok(content_type.to_string())
    }
}

/// One parsed import row: a variant under a product, with the quantity to
/// stock at the target warehouse.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRow {
    /// Existing product id; when present and known, product creation is
    /// skipped and the row only contributes its variant.
    #[serde(default)]
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub product_sku: String,
    pub variant_name: String,
    pub variant_sku: String,
    pub barcode: String,
    pub price: Decimal,
    #[serde(default)]
    pub sale_price: Option<Decimal>,
    pub quantity: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub products_created: usize,
    pub variants_created: usize,
    pub variants_updated: usize,
}

/// Bulk import of products, variants, and stock.
///
/// The whole file is one transaction: a failure on any row rolls back every
/// product, variant, and stock entry the run created. Imported quantities are
/// cumulative — an existing variant's stock is incremented, never overwritten.
#[derive(Clone)]
pub struct ImportService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ImportService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Fetches the file at `key`, parses it as CSV, and upserts its rows into
    /// the given warehouse. Runs under the extended import timeout, not the
    /// default request timeout.
    #[instrument(skip(self, store))]
    pub async fn import_products<S: ObjectStore + ?Sized>(
        &self,
        store: &S,
        key: &str,
        warehouse_id: Uuid,
    ) -> Result<ImportSummary, ServiceError> {
        let db = self.db_pool.as_ref();
        StockLedger::require_warehouse(db, warehouse_id, "Import").await?;

        let content_type = store.get_header(key).await?;
        if !content_type.contains("csv") {
            return Err(ServiceError::InvalidInput(format!(
                "Unsupported import content type: {}",
                content_type
            )));
        }
        let bytes = store.get_object(key).await?;
        let rows = parse_rows(&bytes)?;

        let summary = db
            .transaction::<_, ImportSummary, ServiceError>(move |txn| {
                Box::pin(async move {
                    let mut summary = ImportSummary::default();
                    // Product ids resolved earlier in this run, keyed by the
                    // row's product SKU. Discarded when the run ends.
                    let mut run_products: HashMap<String, Uuid> = HashMap::new();

                    for row in &rows {
                        if row.quantity < 0 {
                            return Err(ServiceError::InvalidInput(format!(
                                "Imported quantity for barcode {} must not be negative",
                                row.barcode
                            )));
                        }

                        let existing = ProductVariant::find()
                            .filter(product_variant::Column::Barcode.eq(row.barcode.clone()))
                            .one(txn)
                            .await
                            .map_err(ServiceError::db_error)?;

                        let variant_id = match existing {
                            Some(variant) => {
                                summary.variants_updated += 1;
                                variant.id
                            }
                            None => {
                                let product_id = Self::resolve_product(
                                    txn,
                                    row,
                                    &mut run_products,
                                    &mut summary,
                                )
                                .await?;
                                let now = Utc::now();
                                let variant = product_variant::ActiveModel {
                                    id: Set(Uuid::new_v4()),
                                    product_id: Set(product_id),
                                    name: Set(row.variant_name.clone()),
                                    sku: Set(row.variant_sku.clone()),
                                    barcode: Set(row.barcode.clone()),
                                    price: Set(row.price),
                                    sale_price: Set(row.sale_price),
                                    total_received_quantity: Set(0),
                                    total_warehouse_quantity: Set(0),
                                    is_archived: Set(false),
                                    created_at: Set(now),
                                    updated_at: Set(now),
                                }
                                .insert(txn)
                                .await
                                .map_err(ServiceError::db_error)?;
                                summary.variants_created += 1;
                                variant.id
                            }
                        };

                        StockLedger::apply_delta(txn, variant_id, warehouse_id, row.quantity)
                            .await?;
                        StockLedger::apply_received_delta(txn, variant_id, row.quantity).await?;
                    }

                    Ok(summary)
                })
            })
            .await?;

        info!(
            products_created = summary.products_created,
            variants_created = summary.variants_created,
            variants_updated = summary.variants_updated,
            "import completed"
        );
        self.emit(Event::ImportCompleted {
            products_created: summary.products_created,
            variants_created: summary.variants_created,
            variants_updated: summary.variants_updated,
        })
        .await;
        Ok(summary)
    }

    /// Resolves the product for a row: referenced by id, already created in
    /// this run, or created fresh with a collision-suffixed SKU.
    async fn resolve_product<C: ConnectionTrait>(
        txn: &C,
        row: &ImportRow,
        run_products: &mut HashMap<String, Uuid>,
        summary: &mut ImportSummary,
    ) -> Result<Uuid, ServiceError> {
        if let Some(id) = row.product_id {
            if let Some(found) = Product::find_by_id(id)
                .one(txn)
                .await
                .map_err(ServiceError::db_error)?
            {
                return Ok(found.id);
            }
        }

        if let Some(id) = run_products.get(&row.product_sku) {
            return Ok(*id);
        }

        let sku = Self::resolve_sku(txn, &row.product_sku).await?;
        let now = Utc::now();
        let created = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(row.product_name.clone()),
            sku: Set(sku),
            total_received_quantity: Set(0),
            total_warehouse_quantity: Set(0),
            is_archived: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(txn)
        .await
        .map_err(ServiceError::db_error)?;

        summary.products_created += 1;
        run_products.insert(row.product_sku.clone(), created.id);
        Ok(created.id)
    }

    /// SKU collisions are suffixed `-{n}`, n being the count of products
    /// whose SKU starts with the candidate.
    async fn resolve_sku<C: ConnectionTrait>(
        txn: &C,
        candidate: &str,
    ) -> Result<String, ServiceError> {
        let colliding = Product::find()
            .filter(product::Column::Sku.starts_with(candidate))
            .count(txn)
            .await
            .map_err(ServiceError::db_error)?;
        if colliding == 0 {
            Ok(candidate.to_string())
        } else {
            Ok(format!("{}-{}", candidate, colliding))
        }
    }

    async fn emit(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            error!("Failed to send event: {}", e);
        }
    }
}

fn parse_rows(bytes: &[u8]) -> Result<Vec<ImportRow>, ServiceError> {
    let mut reader = csv::Reader::from_reader(bytes);
    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<ImportRow>().enumerate() {
        let row = record.map_err(|e| {
            ServiceError::InvalidInput(format!("Import row {} is malformed: {}", index + 1, e))
        })?;
        rows.push(row);
    }
    Ok(rows)
}
