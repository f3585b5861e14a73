// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_DISPOSITION;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use bingocards_core::error::ErrorReport;
use bingocards_core::error::Fallible;
use bingocards_core::export::Export;
use bingocards_core::export::export_batch;
use tokio::task::spawn_blocking;

use crate::cmd::serve::state::ServerState;
use crate::export::DEFAULT_PIXEL_RATIO;
use crate::export::PngRasterizer;
use crate::export::ZipArchiver;
use crate::utils::timestamp_millis;

pub async fn download_handler(State(state): State<ServerState>) -> Response {
    let (batch, settings) = {
        let mutable = state.lock();
        match &mutable.batch {
            Some(batch) => (batch.clone(), mutable.settings.clone()),
            None => {
                return (StatusCode::NOT_FOUND, "No cards have been generated.").into_response();
            }
        }
    };
    let result: Fallible<Export> = spawn_blocking(move || {
        let mut rasterizer = PngRasterizer::new(DEFAULT_PIXEL_RATIO);
        let stamp = timestamp_millis().to_string();
        export_batch(&batch, &settings, &mut rasterizer, ZipArchiver::new(), &stamp)
    })
    .await
    .unwrap_or_else(|e| Err(ErrorReport::new(format!("Export task failed: {e}"))));
    match result {
        Ok(export) => {
            let disposition = format!("attachment; filename=\"{}\"", export.file_name());
            let content_type = export.content_type();
            let bytes = export.into_bytes();
            (
                StatusCode::OK,
                [
                    (CONTENT_TYPE, content_type.to_string()),
                    (CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            log::error!("Export failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.message().to_string()).into_response()
        }
    }
}
