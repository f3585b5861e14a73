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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use bingocards_core::batch::Batch;
use bingocards_core::rng::TinyRng;
use bingocards_core::settings::Settings;
use tokio::sync::oneshot::Sender;

use crate::db::Database;

#[derive(Clone)]
pub struct ServerState {
    pub mutable: Arc<Mutex<MutableState>>,
    pub shutdown_tx: Arc<Mutex<Option<Sender<()>>>>,
}

pub struct MutableState {
    pub db: Database,
    pub settings: Settings,
    /// The quantity last entered in the form.
    pub quantity: usize,
    /// The most recent successful batch.
    pub batch: Option<Batch>,
    /// A message to show once, on the next page load.
    pub notice: Option<String>,
    pub rng: TinyRng,
}

impl ServerState {
    pub fn lock(&self) -> MutexGuard<'_, MutableState> {
        self.mutable.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn shutdown(&self) {
        let mut tx = self
            .shutdown_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = tx.take() {
            let _ = tx.send(());
        }
    }
}
