//! Bulk catalog loader: reads a JSON array of game records, builds each
//! item's embedding text, embeds it, and upserts points in batches.

use std::{fs, path::PathBuf};

use clap::Parser;
use color_eyre::eyre;
use tracing_subscriber::EnvFilter;

use ludex_domain::GameMetadata;
use ludex_providers::embedding;
use ludex_storage::{models::CatalogPoint, qdrant::QdrantStore};

const DETAIL_CHAR_BUDGET: usize = 300;

#[derive(Debug, Parser)]
#[command(version, rename_all = "kebab")]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// JSON file holding an array of catalog records.
	#[arg(long, short = 'i', value_name = "FILE")]
	pub input: PathBuf,
	/// Drop and recreate the collection before loading.
	#[arg(long)]
	pub recreate: bool,
	#[arg(long, default_value_t = 100)]
	pub batch_size: usize,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = ludex_config::load(&args.config)?;
	init_tracing(&config)?;

	if args.batch_size == 0 {
		return Err(eyre::eyre!("batch-size must be greater than zero."));
	}

	let store = QdrantStore::new(&config.storage.qdrant)?;

	if args.recreate {
		store.recreate_collection().await?;
		tracing::info!(collection = %config.storage.qdrant.collection, "Collection recreated.");
	} else {
		store.ensure_collection().await?;
	}

	let raw = fs::read_to_string(&args.input)?;
	let records: Vec<GameMetadata> = serde_json::from_str(&raw)?;

	tracing::info!(records = records.len(), "Catalog file parsed.");

	let mut loaded = 0_usize;

	for (batch_index, chunk) in records.chunks(args.batch_size).enumerate() {
		let texts: Vec<String> = chunk.iter().map(embedding_text).collect();
		let dense = embedding::embed(&config.providers.embedding, &texts).await?;

		if dense.len() != chunk.len() {
			return Err(eyre::eyre!(
				"Embedding count {} does not match batch size {}.",
				dense.len(),
				chunk.len()
			));
		}

		let sparse = match config.providers.sparse_embedding.as_ref() {
			Some(cfg) => embedding::embed_sparse(cfg, &texts)
				.await?
				.into_iter()
				.map(Some)
				.collect(),
			None => vec![None; chunk.len()],
		};
		let mut points = Vec::with_capacity(chunk.len());

		for ((record, dense), sparse) in chunk.iter().zip(dense).zip(sparse) {
			points.push(catalog_point(record, dense, sparse)?);
		}

		store.upsert_batch(points).await?;

		loaded += chunk.len();

		tracing::info!(batch = batch_index + 1, items = chunk.len(), loaded, "Batch upserted.");
	}

	let total = store.count().await?;

	tracing::info!(loaded, total, "Catalog load complete.");

	Ok(())
}

fn init_tracing(config: &ludex_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).init();
	Ok(())
}

fn catalog_point(
	record: &GameMetadata,
	dense: Vec<f32>,
	sparse: Option<ludex_domain::SparseVector>,
) -> color_eyre::Result<CatalogPoint> {
	if record.steam_appid == 0 {
		return Err(eyre::eyre!("Record {:?} is missing steam_appid.", record.name));
	}

	let payload = match serde_json::to_value(record)? {
		serde_json::Value::Object(map) => map,
		_ => return Err(eyre::eyre!("Record did not serialize to an object.")),
	};

	Ok(CatalogPoint { id: record.steam_appid.to_string(), dense, sparse, payload })
}

/// Text representation embedded per item: name and genres lead, then the
/// descriptions and the remaining labels, blank parts skipped.
fn embedding_text(record: &GameMetadata) -> String {
	let mut parts = vec![format!("{} is a {} game", record.name, record.genres)];

	for free_text in [
		record.short_description.as_str(),
		truncate_chars(&record.detailed_description, DETAIL_CHAR_BUDGET),
	] {
		if !free_text.trim().is_empty() {
			parts.push(free_text.to_string());
		}
	}
	for (label, field) in [
		("Tags", &record.tags),
		("Developers", &record.developers),
		("Platforms", &record.platforms),
	] {
		if !field.trim().is_empty() {
			parts.push(format!("{label}: {field}"));
		}
	}

	parts.join(". ")
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
	match text.char_indices().nth(max_chars) {
		Some((offset, _)) => &text[..offset],
		None => text,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn embedding_text_skips_blank_parts() {
		let record = GameMetadata {
			name: "Portal".to_string(),
			genres: "Puzzle".to_string(),
			short_description: "A mind-bending test chamber.".to_string(),
			..GameMetadata::default()
		};
		let text = embedding_text(&record);

		assert!(text.starts_with("Portal is a Puzzle game. A mind-bending test chamber."));
		assert!(!text.contains("Tags: ."));
	}

	#[test]
	fn detail_is_truncated_on_a_char_boundary() {
		let detail = "é".repeat(400);
		let truncated = truncate_chars(&detail, DETAIL_CHAR_BUDGET);

		assert_eq!(truncated.chars().count(), DETAIL_CHAR_BUDGET);
	}

	#[test]
	fn records_without_an_appid_are_rejected() {
		let record = GameMetadata { name: "Ghost".to_string(), ..GameMetadata::default() };

		assert!(catalog_point(&record, vec![0.0; 4], None).is_err());
	}
}
