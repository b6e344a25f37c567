use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::application::history_service::{HistoryService, MAX_PAGE_SIZE};
use crate::domain::history::{HistoryEntry, HistoryPage, SortDirection};
use crate::errors::AppError;
use crate::infrastructure::DieselHistoryStore;
use crate::presentation::{format, DisplayEntry, FormatOptions};

pub type HistoryServiceData = web::Data<HistoryService<DieselHistoryStore>>;

// ── Response DTOs ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryEntryResponse {
    pub id: i64,
    pub order_id: Uuid,
    pub sequence: i64,
    /// INSERT, UPDATE, DELETE or BATCH.
    pub operation: String,
    pub changed_by: Option<Uuid>,
    pub changed_at: String,
    pub recorded_at: String,
    /// Stored snapshot, diff or batch document, tagged by `kind`.
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
}

impl TryFrom<HistoryEntry> for HistoryEntryResponse {
    type Error = AppError;

    fn try_from(entry: HistoryEntry) -> Result<Self, Self::Error> {
        let payload = serde_json::to_value(&entry.payload)
            .map_err(|e| AppError::Internal(format!("Unserializable payload: {}", e)))?;
        Ok(Self {
            id: entry.id,
            order_id: entry.order_id,
            sequence: entry.sequence,
            operation: entry.operation.to_string(),
            changed_by: entry.changed_by,
            changed_at: entry.changed_at.to_rfc3339(),
            recorded_at: entry.recorded_at.to_rfc3339(),
            payload,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListHistoryResponse {
    pub items: Vec<HistoryEntryResponse>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DisplayHistoryResponse {
    /// Entries rendered for staff: translated labels, formatted values.
    #[schema(value_type = Vec<Object>)]
    pub items: Vec<DisplayEntry>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListHistoryParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of entries per page. Defaults to 20, maximum 100.
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    #[serde(default)]
    pub direction: SortDirection,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

impl ListHistoryParams {
    fn effective_page_size(&self) -> i64 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }
}

async fn fetch_page(
    service: HistoryServiceData,
    order_id: Uuid,
    params: &ListHistoryParams,
) -> Result<HistoryPage, AppError> {
    let (page, page_size, direction) = (params.page, params.page_size, params.direction);
    let result = web::block(move || service.list_history(order_id, page, page_size, direction))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(result)
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /orders/{id}/history
///
/// Returns the stored history of an order in sequence order. An order with
/// no recorded changes yields an empty page.
#[utoipa::path(
    get,
    path = "/orders/{id}/history",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("page_size" = Option<i64>, Query, description = "Entries per page (default 20, max 100)"),
        ("direction" = Option<String>, Query, description = "asc (default) or desc"),
    ),
    responses(
        (status = 200, description = "Paginated order history", body = ListHistoryResponse),
        (status = 400, description = "Invalid pagination parameters"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "history"
)]
pub async fn list_history(
    service: HistoryServiceData,
    path: web::Path<Uuid>,
    query: web::Query<ListHistoryParams>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let params = query.into_inner();

    let page = fetch_page(service, order_id, &params).await?;
    let items = page
        .items
        .into_iter()
        .map(HistoryEntryResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(HttpResponse::Ok().json(ListHistoryResponse {
        items,
        total: page.total,
        page: params.page,
        page_size: params.effective_page_size(),
    }))
}

/// GET /orders/{id}/history/display
///
/// Same page as `/orders/{id}/history`, rendered for display.
#[utoipa::path(
    get,
    path = "/orders/{id}/history/display",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("page_size" = Option<i64>, Query, description = "Entries per page (default 20, max 100)"),
        ("direction" = Option<String>, Query, description = "asc (default) or desc"),
    ),
    responses(
        (status = 200, description = "Formatted order history", body = DisplayHistoryResponse),
        (status = 400, description = "Invalid pagination parameters"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "history"
)]
pub async fn display_history(
    service: HistoryServiceData,
    options: web::Data<FormatOptions>,
    path: web::Path<Uuid>,
    query: web::Query<ListHistoryParams>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let params = query.into_inner();

    let page = fetch_page(service, order_id, &params).await?;
    let items = page
        .items
        .iter()
        .map(|entry| format(entry, &options))
        .collect();

    Ok(HttpResponse::Ok().json(DisplayHistoryResponse {
        items,
        total: page.total,
        page: params.page,
        page_size: params.effective_page_size(),
    }))
}

#[derive(OpenApi)]
#[openapi(
    paths(list_history, display_history),
    components(schemas(HistoryEntryResponse, ListHistoryResponse, DisplayHistoryResponse)),
    tags((name = "history", description = "Order change history"))
)]
pub struct ApiDoc;
