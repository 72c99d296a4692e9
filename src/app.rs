use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use chrono::Local;
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::dashboard::{self, Metrics};
use crate::downloader;
use crate::editor::{self, EditAction, GridRow};
use crate::entry::{EntryError, submit_entry};
use crate::graph::ReportChart;
use crate::login::{self, SessionStore};
use crate::record::NewEntry;
use crate::report::{self, ReportOptions};
use crate::saving::FileStore;
use crate::store::SheetStore;

pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn SheetStore>,
    pub sessions: SessionStore,
    templates: Handlebars<'static>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn SheetStore>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let mut templates = Handlebars::new();
        templates.register_partial("head", include_str!("./static/head.hbs"))?;
        templates.register_template_string("entry", include_str!("./static/entry.hbs"))?;
        templates.register_template_string("login", include_str!("./static/login.hbs"))?;
        templates
            .register_template_string("dashboard", include_str!("./static/dashboard.hbs"))?;

        Ok(Self {
            sessions: SessionStore::new(config.session_ttl),
            config,
            store,
            templates,
        })
    }

    fn render(&self, name: &str, data: &serde_json::Value) -> Response {
        match self.templates.render(name, data) {
            Ok(html) => Html(html).into_response(),
            Err(e) => {
                log::error!("failed to render {}: {}", name, e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
            }
        }
    }
}

/// Notice carried across a redirect
#[derive(Debug, Default, Deserialize)]
struct Notice {
    success: Option<String>,
    error: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// The editable grid as posted by the manager console
///
/// Every row contributes one value to each column list; `delete` holds the
/// ids of the rows whose checkbox was ticked.
#[derive(Debug, Deserialize)]
struct GridForm {
    version: u64,
    action: String,
    #[serde(default)]
    id: Vec<Uuid>,
    #[serde(default)]
    date: Vec<String>,
    #[serde(default)]
    branch: Vec<String>,
    #[serde(default)]
    employee: Vec<String>,
    #[serde(default)]
    category: Vec<String>,
    #[serde(default)]
    item: Vec<String>,
    #[serde(default)]
    note: Vec<String>,
    #[serde(default)]
    delete: Vec<Uuid>,
}

impl GridForm {
    fn into_rows(self) -> Result<(EditAction, u64, Vec<GridRow>), String> {
        let action = match self.action.as_str() {
            "save" => EditAction::Save,
            "delete" => EditAction::DeleteSelected,
            other => return Err(format!("unknown action '{}'", other)),
        };

        let n = self.id.len();
        let columns = [
            self.date.len(),
            self.branch.len(),
            self.employee.len(),
            self.category.len(),
            self.item.len(),
            self.note.len(),
        ];
        if columns.iter().any(|&len| len != n) {
            return Err("grid columns have different lengths".to_string());
        }

        let rows = self
            .id
            .into_iter()
            .zip(self.date)
            .zip(self.branch)
            .zip(self.employee)
            .zip(self.category)
            .zip(self.item)
            .zip(self.note)
            .map(
                |((((((id, date), branch), employee), category), item), note)| GridRow {
                    id,
                    date,
                    branch,
                    employee,
                    category,
                    item,
                    // textareas submit CRLF line breaks
                    note: note.replace("\r\n", "\n"),
                    delete: self.delete.contains(&id),
                },
            )
            .collect();

        Ok((action, self.version, rows))
    }
}

/// Build the application router
///
/// Manager routes other than the console page itself sit behind the session
/// check.
pub fn router(state: Arc<AppState>) -> Router {
    let manager = Router::new()
        .route("/manager/report.pdf", get(download_pdf))
        .route("/manager/data.xlsx", get(download_xlsx))
        .route("/manager/charts/:chart", get(serve_chart))
        .route("/manager/rows", post(update_rows))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            login::require_manager,
        ));

    Router::new()
        .route("/", get(serve_entry))
        .route("/entry", post(handle_entry))
        .route("/manager", get(serve_manager))
        .route("/manager/login", post(login::handle_login))
        .route("/manager/logout", post(login::handle_logout))
        .route("/health", get(health_check))
        .merge(manager)
        .with_state(state)
}

pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store: Arc<dyn SheetStore> = Arc::new(FileStore::new(config.data_dir.clone()));
    let bind = config.bind.clone();

    log::info!(
        "using sheet '{}' worksheet '{}' under {}",
        config.sheet_id,
        config.worksheet,
        config.data_dir.display()
    );

    let state = Arc::new(AppState::new(config, store)?);
    let app = router(state);

    let listener = TcpListener::bind(&bind).await?;
    log::info!("Listening on http://{}", bind);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        log::info!("shutting down");
    }
}

fn redirect_with(path: &str, key: &str, message: &str) -> Redirect {
    Redirect::to(&format!("{}?{}={}", path, key, urlencoding::encode(message)))
}

async fn health_check() -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn serve_entry(State(state): State<Arc<AppState>>, Query(notice): Query<Notice>) -> Response {
    let vocabulary = &state.config.vocabulary;
    state.render(
        "entry",
        &json!({
            "title": "Staff entry",
            "tab_entry": true,
            "brand": state.config.brand,
            "branches": vocabulary.branches,
            "categories": vocabulary.category_labels(),
            "success": notice.success,
            "error": notice.error,
        }),
    )
}

async fn handle_entry(State(state): State<Arc<AppState>>, Form(entry): Form<NewEntry>) -> Redirect {
    match submit_entry(state.store.as_ref(), &state.config, entry) {
        Ok(record) => redirect_with("/", "success", &format!("Saved: {}", record.item)),
        Err(EntryError::Validation(msg)) => redirect_with("/", "error", &msg),
        Err(EntryError::Store(e)) => {
            log::warn!("entry not stored: {}", e);
            redirect_with("/", "error", &e.to_string())
        }
    }
}

async fn serve_manager(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(notice): Query<Notice>,
) -> Response {
    if !login::is_manager(&state, &jar) {
        return state.render(
            "login",
            &json!({
                "title": "Manager login",
                "tab_manager": true,
                "brand": state.config.brand,
                "error": notice.error,
            }),
        );
    }

    let table = dashboard::load_or_empty(state.store.as_ref(), &state.config);
    let metrics = Metrics::compute(&table.records, &state.config.vocabulary);
    let rows = editor::grid_for(&table);

    state.render(
        "dashboard",
        &json!({
            "title": "Manager console",
            "tab_manager": true,
            "brand": state.config.brand,
            "metrics": metrics,
            "rows": rows,
            "has_rows": !rows.is_empty(),
            "version": table.version,
            "success": notice.success,
            "error": notice.error,
        }),
    )
}

/// Read the table for an export, or explain why not
fn load_for_export(state: &AppState) -> Result<crate::record::Table, Response> {
    state
        .store
        .read(&state.config.sheet_id, &state.config.worksheet)
        .map_err(|e| {
            log::warn!("export aborted: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
        })
}

fn attachment(mime: &'static str, file_name: String, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response()
}

async fn download_pdf(State(state): State<Arc<AppState>>) -> Response {
    let table = match load_for_export(&state) {
        Ok(table) => table,
        Err(response) => return response,
    };

    let now = Local::now();
    let options = ReportOptions::from_config(&state.config, now.naive_local());
    match report::to_pdf(&table.records, &state.config.vocabulary, &options) {
        Ok(bytes) => attachment(
            downloader::PDF_MIME,
            downloader::report_file_name(&state.config.brand, now.date_naive()),
            bytes,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error generating PDF: {}", e),
        )
            .into_response(),
    }
}

async fn download_xlsx(State(state): State<Arc<AppState>>) -> Response {
    let table = match load_for_export(&state) {
        Ok(table) => table,
        Err(response) => return response,
    };

    match downloader::to_xlsx(&table.records) {
        Ok(bytes) => attachment(
            downloader::XLSX_MIME,
            downloader::data_file_name(&state.config.brand, Local::now().date_naive()),
            bytes,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error generating Excel: {}", e),
        )
            .into_response(),
    }
}

async fn serve_chart(State(state): State<Arc<AppState>>, Path(chart): Path<String>) -> Response {
    let Some(chart) = chart
        .strip_suffix(".png")
        .and_then(ReportChart::from_name)
    else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let table = dashboard::load_or_empty(state.store.as_ref(), &state.config);
    match chart.render(&table.records).and_then(|raster| raster.to_png()) {
        Ok(png) => ([(header::CONTENT_TYPE, "image/png")], png).into_response(),
        Err(e) => {
            log::debug!("{:?} chart unavailable: {}", chart, e);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

async fn update_rows(
    State(state): State<Arc<AppState>>,
    form: Result<axum_extra::extract::Form<GridForm>, axum_extra::extract::FormRejection>,
) -> Redirect {
    let form = match form {
        Ok(axum_extra::extract::Form(form)) => form,
        Err(rejection) => {
            log::warn!("malformed grid submission: {}", rejection);
            return redirect_with("/manager", "error", "Error: malformed grid submission");
        }
    };

    let (action, version, rows) = match form.into_rows() {
        Ok(parts) => parts,
        Err(msg) => return redirect_with("/manager", "error", &msg),
    };

    match editor::commit_grid(state.store.as_ref(), &state.config, rows, version, action) {
        Ok(_) => {
            let message = match action {
                EditAction::Save => "Updated successfully",
                EditAction::DeleteSelected => "Items deleted",
            };
            redirect_with("/manager", "success", message)
        }
        Err(e) => redirect_with("/manager", "error", &format!("Error: {}", e)),
    }
}
