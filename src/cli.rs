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

use std::process::exit;

use bingocards_core::error::Fallible;
use clap::Parser;
use clap::Subcommand;
use tokio::spawn;

use crate::cmd::config::ConfigAction;
use crate::cmd::config::run_config;
use crate::cmd::generate::GenerateConfig;
use crate::cmd::generate::OutputFormat;
use crate::cmd::generate::generate_cards;
use crate::cmd::serve::server::ServerConfig;
use crate::cmd::serve::server::start_server;
use crate::export::DEFAULT_PIXEL_RATIO;
use crate::utils::store_path;
use crate::utils::wait_for_server;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Generate a batch of cards.
    Generate {
        /// File with one term per line, or `-` for stdin. By default, the stored terms are used.
        terms: Option<String>,
        /// How many cards to generate (1 to 100).
        #[arg(long, short, default_value_t = 1)]
        quantity: usize,
        /// Put a FREE SPACE in the centre. By default, the stored setting is used.
        #[arg(long)]
        free_space: Option<bool>,
        /// Seed for the shuffle, for reproducible batches.
        #[arg(long)]
        seed: Option<u64>,
        /// TOML profile whose fields override the stored settings.
        #[arg(long)]
        profile: Option<String>,
        /// Background image for this batch.
        #[arg(long)]
        background: Option<String>,
        /// Output format.
        #[arg(long, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Output file (or directory, for several SVG cards). By default, text
        /// and JSON go to stdout and images to the working directory.
        #[arg(long, short)]
        output: Option<String>,
        /// Device pixel ratio for PNG output.
        #[arg(long, default_value_t = DEFAULT_PIXEL_RATIO)]
        pixel_ratio: f32,
        /// Path to the settings store.
        #[arg(long)]
        store: Option<String>,
    },
    /// Design and print cards through a web interface.
    Serve {
        /// The host address to bind to. Default is 127.0.0.1.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// The port to use for the web server. Default is 8000.
        #[arg(long, default_value_t = 8000)]
        port: u16,
        /// Whether to open the browser automatically. Default is true.
        #[arg(long)]
        open_browser: Option<bool>,
        /// Seed for the shuffle, for reproducible batches.
        #[arg(long)]
        seed: Option<u64>,
        /// Path to the settings store.
        #[arg(long)]
        store: Option<String>,
    },
    /// Inspect and edit the stored settings.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
        /// Path to the settings store.
        #[arg(long, global = true)]
        store: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print every setting.
    Show,
    /// Set one setting, e.g. `title-size 64`.
    Set { key: String, value: String },
    /// Restore one setting to its default.
    Unset { key: String },
    /// Restore every setting to its default.
    Reset,
    /// Print the settings as a TOML profile.
    Export,
    /// Apply a TOML profile and store the result.
    Import { file: String },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Generate {
            terms,
            quantity,
            free_space,
            seed,
            profile,
            background,
            format,
            output,
            pixel_ratio,
            store,
        } => {
            let config = GenerateConfig {
                store: store_path(store),
                terms,
                quantity,
                free_space,
                seed,
                profile,
                background,
                format,
                output,
                pixel_ratio,
            };
            generate_cards(config)
        }
        Command::Serve {
            host,
            port,
            open_browser,
            seed,
            store,
        } => {
            if open_browser.unwrap_or(true) {
                // Start a separate task to open the browser once the server is up.
                let browser_host = host.clone();
                spawn(async move {
                    match wait_for_server(&browser_host, port).await {
                        Ok(_) => {
                            let _ = open::that(format!("http://{browser_host}:{port}/"));
                        }
                        Err(e) => {
                            eprintln!("Failed to connect to server: {e}");
                            exit(-1)
                        }
                    }
                });
            }
            let config = ServerConfig {
                store: store_path(store),
                host,
                port,
                seed,
            };
            start_server(config).await
        }
        Command::Config { command, store } => {
            let action = match command {
                ConfigCommand::Show => ConfigAction::Show,
                ConfigCommand::Set { key, value } => ConfigAction::Set { key, value },
                ConfigCommand::Unset { key } => ConfigAction::Unset { key },
                ConfigCommand::Reset => ConfigAction::Reset,
                ConfigCommand::Export => ConfigAction::Export,
                ConfigCommand::Import { file } => ConfigAction::Import { file },
            };
            run_config(&store_path(store), action)
        }
    }
}
