//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! List the `.proto` files bundled with a client library.
//!
//! Walks `<directory>/protos` and writes the paths of every `.proto` file,
//! relative to that directory, as a JSON array to
//! `<directory>/src/protosList.json`.
//!
//! # Examples
//!
//! ```sh
//! list-protos ./my-client
//! RUST_LOG=debug list-protos ./my-client
//! ```

use clap::Parser;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

const PROTOS_DIR: &str = "protos";
const OUTPUT_FILE: &str = "protosList.json";

/// List the .proto files of a client library into src/protosList.json.
#[derive(Parser)]
#[command(name = "list-protos", version)]
struct Cli {
    /// Library root containing the `protos` and `src` directories
    directory: PathBuf,
}

#[derive(Debug, Error)]
enum ListError {
    #[error("failed to read '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to encode the proto list: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Collects `.proto` files below `root` as sorted, `/`-separated paths
/// relative to `root`.
fn find_protos(root: &Path) -> Result<Vec<String>, ListError> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = fs::read_dir(&dir).map_err(|source| ListError::Read {
            path: dir.clone(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| ListError::Read {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "proto") {
                if let Ok(relative) = path.strip_prefix(root) {
                    let components: Vec<_> = relative
                        .components()
                        .map(|component| component.as_os_str().to_string_lossy())
                        .collect();
                    found.push(components.join("/"));
                }
            }
        }
    }
    found.sort();
    Ok(found)
}

/// Writes the proto list of `directory` and returns its entries.
fn write_proto_list(directory: &Path) -> Result<Vec<String>, ListError> {
    let protos = find_protos(&directory.join(PROTOS_DIR))?;
    let output = directory.join("src").join(OUTPUT_FILE);
    let mut json = serde_json::to_string_pretty(&protos)?;
    json.push('\n');
    fs::write(&output, json).map_err(|source| ListError::Write {
        path: output.clone(),
        source,
    })?;
    tracing::info!(count = protos.len(), output = %output.display(), "Wrote proto list");
    Ok(protos)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(error) = write_proto_list(&cli.directory) {
        tracing::error!(%error, "list-protos failed");
        eprintln!("error: {error}");
        process::exit(1);
    }
}
