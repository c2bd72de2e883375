use actix_web::{
    HttpRequest, HttpResponse, delete, get, post, put,
    web::{self, Path},
};
use tracing::{Instrument, instrument};

use crate::{
    api::{
        rest::{FilterQuery, PageQuery, RecordListRequest, RecordListResponse, RecordRequest, json_error_handler, query_error_handler},
        state::AppState,
    },
    model::{
        apperror::ApplicationError,
        models::{RecordFields, RecordFilter},
    },
    service::{
        analytics::{aggregate_cases_by_region, comparison_series, correlation_heatmap},
        listview::{ListViewEvent, ListViewState},
        records::unique_regions,
    },
};

/**
 * Registers every endpoint of the API together with the extractor error handlers.
 */
pub fn configure(config: &mut web::ServiceConfig) {
    config
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .service(add_record)
        .service(list_all_records)
        .service(list_records)
        .service(update_record)
        .service(delete_record)
        .service(import_records)
        .service(list_regions)
        .service(comparison_chart)
        .service(correlation_chart)
        .service(region_totals)
        .service(choropleth_map);
}

/**
 * Endpoint to add a record.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "addRecord", trace_id = get_trace_id(&http_request), result))]
#[post("/api/services/v1_0/records")]
pub async fn add_record(http_request: HttpRequest, request_body: web::Json<RecordRequest>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let record = app_state.record_service.add_record(RecordFields::from(request_body.into_inner())).instrument(span).await?;
    Ok(HttpResponse::Created().json(record))
}

/**
 * Endpoint to retrieve the entire record collection.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "listAllRecords", trace_id = get_trace_id(&http_request), result))]
#[get("/api/services/v1_0/records")]
pub async fn list_all_records(http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let records = app_state.record_service.list_records().instrument(span).await?;
    Ok(HttpResponse::Ok().json(records))
}

/**
 * Endpoint to retrieve a filtered page of records.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "listRecords", trace_id = get_trace_id(&http_request), result))]
#[post("/api/services/v1_0/records:list")]
pub async fn list_records(
    http_request: HttpRequest,
    request_body: web::Json<RecordListRequest>,
    page: web::Query<PageQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let records = app_state.record_service.list_records().instrument(span).await?;
    let request = request_body.into_inner();
    let view = ListViewState::new(app_state.page_size)
        .apply(ListViewEvent::RecordsLoaded(records))
        .apply(ListViewEvent::FilterTextChanged(request.filter_text))
        .apply(ListViewEvent::FilterRegionChanged(request.region))
        .apply(ListViewEvent::PageRequested(page.page.unwrap_or(1)));
    Ok(HttpResponse::Ok().json(RecordListResponse::from(&view)))
}

/**
 * Endpoint to update a record.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "updateRecord", trace_id = get_trace_id(&http_request), result))]
#[put("/api/services/v1_0/records/{recordId}")]
pub async fn update_record(path: Path<String>, http_request: HttpRequest, request_body: web::Json<RecordRequest>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let record_id = path.into_inner();
    let record = app_state.record_service.update_record(&record_id, RecordFields::from(request_body.into_inner())).instrument(span).await?;
    Ok(HttpResponse::Ok().json(record))
}

/**
 * Endpoint to delete a record.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "deleteRecord", trace_id = get_trace_id(&http_request), result))]
#[delete("/api/services/v1_0/records/{recordId}")]
pub async fn delete_record(path: Path<String>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let record_id = path.into_inner();
    app_state.record_service.delete_record(&record_id).instrument(span).await?;
    Ok(HttpResponse::NoContent().finish())
}

/**
 * Endpoint to import records from CSV text.
 */
#[instrument(level = "info", skip(http_request, app_state, request_body), fields(service = "importRecords", trace_id = get_trace_id(&http_request), result))]
#[post("/api/services/v1_0/records:import")]
pub async fn import_records(http_request: HttpRequest, request_body: String, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let report = app_state.record_service.import_csv(&request_body).instrument(span).await;
    Ok(HttpResponse::Ok().json(report))
}

/**
 * Endpoint to retrieve the regions used by records.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "listRegions", trace_id = get_trace_id(&http_request), result))]
#[get("/api/services/v1_0/regions")]
pub async fn list_regions(http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let records = app_state.record_service.list_records().instrument(span).await?;
    Ok(HttpResponse::Ok().json(unique_regions(&records)))
}

/**
 * Endpoint for the cases/deaths comparison chart.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "comparisonChart", trace_id = get_trace_id(&http_request), result))]
#[get("/api/services/v1_0/analytics/comparison")]
pub async fn comparison_chart(http_request: HttpRequest, query: web::Query<FilterQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let records = app_state.record_service.list_records().instrument(span).await?;
    let query = query.into_inner();
    let filter = RecordFilter { text: query.filter_text.unwrap_or_default(), region: query.region.unwrap_or_default() };
    Ok(HttpResponse::Ok().json(comparison_series(&records, &filter)))
}

/**
 * Endpoint for the correlation heatmap.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "correlationChart", trace_id = get_trace_id(&http_request), result))]
#[get("/api/services/v1_0/analytics/correlation")]
pub async fn correlation_chart(http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let records = app_state.record_service.list_records().instrument(span).await?;
    Ok(HttpResponse::Ok().json(correlation_heatmap(&records)))
}

/**
 * Endpoint for case totals per region.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "regionTotals", trace_id = get_trace_id(&http_request), result))]
#[get("/api/services/v1_0/analytics/region-totals")]
pub async fn region_totals(http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let records = app_state.record_service.list_records().instrument(span).await?;
    Ok(HttpResponse::Ok().json(aggregate_cases_by_region(&records)))
}

/**
 * Endpoint for the choropleth map.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "choroplethMap", trace_id = get_trace_id(&http_request), result))]
#[get("/api/services/v1_0/analytics/choropleth")]
pub async fn choropleth_map(http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let records = app_state.record_service.list_records().instrument(span).await?;
    Ok(HttpResponse::Ok().json(app_state.analytics_service.choropleth(&records)))
}

/**
 * Retrieves the trace ID from the HTTP request headers.
 * If the trace ID is not present, a new UUID is generated.
 */
fn get_trace_id(http_request: &HttpRequest) -> String {
    http_request.headers().get("X-Trace-ID").and_then(|v| v.to_str().ok().map(std::string::ToString::to_string)).unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}
