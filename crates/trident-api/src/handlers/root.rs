//! Service banner. Deliberately uninstrumented.

use axum::Json;
use serde::Serialize;

use crate::constants::BANNER;

#[derive(Debug, Serialize)]
pub struct BannerResponse {
    pub message: String,
}

pub async fn root() -> Json<BannerResponse> {
    Json(BannerResponse {
        message: BANNER.to_string(),
    })
}
