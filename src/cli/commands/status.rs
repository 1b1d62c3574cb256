use anyhow::Result;

use crate::cli::output::{StatusInfo, get_formatter};
use crate::models::{Config, OutputFormat, VectorDriver};
use crate::services::{create_backend_with_embedding_config, discover_files};

pub async fn handle_status(format: OutputFormat, _verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let api_key_set = Config::api_key().is_ok();

    let (vector_store_connected, vector_store_points) =
        match create_backend_with_embedding_config(&config.vector_store, &config.embedding).await {
            Ok(store) => {
                let connected = store.health_check().await.unwrap_or(false);
                let points = if connected {
                    store
                        .get_collection_info()
                        .await
                        .ok()
                        .flatten()
                        .map_or(0, |info| info.points_count)
                } else {
                    0
                };
                (connected, points)
            }
            Err(e) => {
                tracing::debug!("Vector store unavailable: {}", e);
                (false, 0)
            }
        };

    let vector_store_location = match config.vector_store.driver {
        VectorDriver::Local => config.vector_store.path.display().to_string(),
        VectorDriver::Qdrant => config.vector_store.url.clone(),
    };

    let dataset_files = discover_files(&config.ingest).map_or(0, |files| files.len());

    let status = StatusInfo {
        api_key_set,
        embedding_model: config.embedding.model.clone(),
        chat_model: config.generation.model.clone(),
        vector_store_driver: config.vector_store.driver.to_string(),
        vector_store_location,
        vector_store_connected,
        vector_store_points,
        collection: config.vector_store.collection.clone(),
        dataset_files,
    };

    print!("{}", formatter.format_status(&status));

    let hints = status_hints(&config, &status);
    if !hints.is_empty() {
        eprintln!();
        for hint in hints {
            eprintln!("{}", hint);
        }
    }

    Ok(())
}

/// Follow-up advice for whatever the status report shows as missing.
fn status_hints(config: &Config, status: &StatusInfo) -> Vec<String> {
    let mut hints = Vec::new();

    if !status.api_key_set {
        hints.push(format!(
            "Hint: {} is not set. Export it or add it to a .env file.",
            crate::models::API_KEY_ENV
        ));
    }

    if !status.vector_store_connected {
        hints.push(match config.vector_store.driver {
            VectorDriver::Qdrant => format!(
                "Warning: cannot reach Qdrant at {}. Check the vector_store.url setting.",
                config.vector_store.url
            ),
            VectorDriver::Local => format!(
                "Warning: cannot open {}. Check the vector_store.path setting.",
                config.vector_store.path.display()
            ),
        });
    } else if status.vector_store_points == 0 {
        hints.push("Hint: the collection is empty. Run: mlqa ingest".to_string());
    }

    hints
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(api_key_set: bool, connected: bool, points: u64) -> StatusInfo {
        StatusInfo {
            api_key_set,
            embedding_model: "embed".to_string(),
            chat_model: "chat".to_string(),
            vector_store_driver: "qdrant".to_string(),
            vector_store_location: "http://localhost:6334".to_string(),
            vector_store_connected: connected,
            vector_store_points: points,
            collection: "documents".to_string(),
            dataset_files: 0,
        }
    }

    #[test]
    fn test_unreachable_qdrant_points_to_url_setting() {
        let mut config = Config::default();
        config.vector_store.driver = VectorDriver::Qdrant;
        config.vector_store.url = "http://qdrant.internal:6334".to_string();

        let hints = status_hints(&config, &status(true, false, 0));
        assert_eq!(hints.len(), 1);
        assert!(hints[0].contains("http://qdrant.internal:6334"));
        assert!(hints[0].contains("vector_store.url"));
    }

    #[test]
    fn test_hints_for_missing_key_and_empty_collection() {
        let hints = status_hints(&Config::default(), &status(false, true, 0));
        assert_eq!(hints.len(), 2);
        assert!(hints[0].contains(crate::models::API_KEY_ENV));
        assert!(hints[1].contains("mlqa ingest"));
    }

    #[test]
    fn test_no_hints_when_ready() {
        assert!(status_hints(&Config::default(), &status(true, true, 12)).is_empty());
    }
}
