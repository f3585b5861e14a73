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

use std::env;
use std::path::Path;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bingocards_core::error::Fallible;
use bingocards_core::error::fail;
use chrono::Local;
use tokio::net::TcpStream;
use tokio::time::sleep;

// max-age is one week in seconds.
pub const CACHE_CONTROL_IMMUTABLE: &str = "public, max-age=604800, immutable";

pub const DEFAULT_STORE: &str = "bingocards.db";

const STORE_ENV: &str = "BINGOCARDS_STORE";

pub async fn wait_for_server(host: &str, port: u16) -> Fallible<()> {
    loop {
        if let Ok(stream) = TcpStream::connect(format!("{host}:{port}")).await {
            drop(stream);
            break;
        }
        sleep(Duration::from_millis(1)).await;
    }
    Ok(())
}

/// The settings store path: the explicit flag, then `$BINGOCARDS_STORE`, then
/// `bingocards.db` in the working directory.
pub fn store_path(flag: Option<String>) -> String {
    flag.or_else(|| env::var(STORE_ENV).ok())
        .unwrap_or_else(|| DEFAULT_STORE.to_string())
}

/// Milliseconds since the epoch, used in export file names.
pub fn timestamp_millis() -> i64 {
    Local::now().timestamp_millis()
}

/// A seed for shuffling when the user didn't pick one.
pub fn entropy_seed() -> u64 {
    Local::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Local::now().timestamp_millis()) as u64
}

/// Read an image file into a `data:` URI.
pub fn image_data_uri(path: &Path) -> Fallible<String> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();
    let content_type: &str = match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => {
            return fail(format!(
                "Unsupported background image type: '{}'.",
                path.display()
            ));
        }
    };
    let bytes = std::fs::read(path)?;
    Ok(format!("data:{content_type};base64,{}", BASE64.encode(bytes)))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::helper::create_tmp_directory;

    #[test]
    fn test_store_path_flag_wins() {
        assert_eq!(store_path(Some("x.db".to_string())), "x.db");
    }

    #[test]
    fn test_image_data_uri() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        let path = dir.join("bg.png");
        std::fs::write(&path, b"abc")?;
        assert_eq!(image_data_uri(&path)?, "data:image/png;base64,YWJj");
        Ok(())
    }

    #[test]
    fn test_image_data_uri_rejects_unknown_type() {
        assert!(image_data_uri(&PathBuf::from("notes.txt")).is_err());
    }
}
