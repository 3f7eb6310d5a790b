//! Unauthenticated read routes polled by the dashboard page.

use axum::{Json, Router, extract::State, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use super::routes::RouteModule;
use crate::app::AppContext;
use crate::dataset::DatasetSnapshot;

pub struct PublicRoutes;

impl RouteModule for PublicRoutes {
    fn routes(&self) -> Router<AppContext> {
        Router::new()
            .route("/data", get(data))
            .route("/status", get(status))
    }

    fn prefix(&self) -> Option<&str> {
        Some("/api")
    }
}

/// The current snapshot, always 200. Before the first refresh this is the
/// empty version-0 seed.
async fn data(State(ctx): State<AppContext>) -> Json<Arc<DatasetSnapshot>> {
    Json(ctx.publisher.current())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataStatus {
    Ready,
    NoData,
}

#[derive(Debug, Serialize)]
pub struct PublicStatus {
    pub status: DataStatus,
    pub last_updated: DateTime<Utc>,
    pub version: u64,
    pub total_phc_centers: u64,
}

async fn status(State(ctx): State<AppContext>) -> Json<PublicStatus> {
    let snapshot = ctx.publisher.current();
    Json(PublicStatus {
        status: if snapshot.has_data() {
            DataStatus::Ready
        } else {
            DataStatus::NoData
        },
        last_updated: snapshot.dataset.last_updated,
        version: snapshot.version,
        total_phc_centers: snapshot.dataset.overview.total_phc_centers,
    })
}
