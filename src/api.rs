use std::sync::{Arc, Mutex, MutexGuard};

use actix_cors::Cors;
use actix_web::{
    get,
    http::header,
    middleware::Logger,
    post,
    web::{self, Data},
    App, HttpResponse, HttpServer, Responder,
};

use crate::{
    config::Config,
    db::{Db, HiveState},
    error::ApiError,
    report::HiveReport,
    utils,
};

type SharedDb = web::Data<Arc<Mutex<Db>>>;

fn lock(db: &SharedDb) -> Result<MutexGuard<'_, Db>, ApiError> {
    db.lock()
        .map_err(|_| ApiError::Storage(anyhow::anyhow!("database lock poisoned")))
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Ack {
    status: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct HiveView {
    #[serde(flatten)]
    pub state: HiveState,
    pub harvest_ready: bool,
}

impl From<HiveState> for HiveView {
    fn from(state: HiveState) -> Self {
        let harvest_ready = state.harvest_ready();
        Self {
            state,
            harvest_ready,
        }
    }
}

#[get("/")]
async fn hello() -> impl Responder {
    HttpResponse::Ok().body("hive-monitor")
}

#[post("/beehive")]
async fn api_report(
    body: web::Json<HiveReport>,
    db: SharedDb,
) -> Result<impl Responder, ApiError> {
    let report = body.into_inner();
    report.validate()?;

    let state = report.into_state(utils::now());
    lock(&db)?.upsert(&state)?;

    Ok(web::Json(Ack {
        status: "success".to_string(),
    }))
}

#[get("/beehive/{hive_id}/harvest-status")]
async fn api_harvest_status(
    path: web::Path<i64>,
    db: SharedDb,
) -> Result<impl Responder, ApiError> {
    let extracting = lock(&db)?.extraction_flag(path.into_inner())?;
    let status = if extracting { "true" } else { "false" };

    Ok(web::Json(status))
}

#[get("/beehive")]
async fn api_hives(db: SharedDb) -> Result<impl Responder, ApiError> {
    let hives = lock(&db)?.all_hives()?;

    Ok(web::Json(
        hives.into_iter().map(HiveView::from).collect::<Vec<_>>(),
    ))
}

#[get("/beehive/{hive_id}")]
async fn api_hive(path: web::Path<i64>, db: SharedDb) -> Result<impl Responder, ApiError> {
    let hive_id = path.into_inner();
    match lock(&db)?.hive(hive_id)? {
        Some(state) => Ok(web::Json(HiveView::from(state))),
        None => Err(ApiError::NotFound(hive_id)),
    }
}

/// Registers the routes and the extractor error mapping.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| ApiError::Validation(err.to_string()).into()),
    )
    .service(hello)
    .service(api_report)
    .service(api_hives)
    .service(api_harvest_status)
    .service(api_hive);
}

pub async fn new_http_server(db: Arc<Mutex<Db>>, config: &Config) -> std::io::Result<()> {
    let origin = config.dashboard_origin.clone();
    log::info!("listening on {}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .app_data(Data::new(db.clone()))
            .configure(configure)
            .wrap(
                Cors::default()
                    .allowed_origin(&origin) // dashboard
                    .allowed_methods(vec!["GET", "POST"])
                    .allowed_headers(vec![header::ACCEPT])
                    .allowed_header(header::CONTENT_TYPE)
                    .max_age(3600),
            )
            .wrap(Logger::default())
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
