use std::sync::Arc;

use ludex_engine::Engine;
use ludex_storage::qdrant::QdrantStore;

#[derive(Clone)]
pub struct AppState {
	pub engine: Arc<Engine>,
}
impl AppState {
	pub async fn new(config: ludex_config::Config) -> color_eyre::Result<Self> {
		let qdrant = QdrantStore::new(&config.storage.qdrant)?;

		qdrant.ensure_collection().await?;

		let engine = Engine::with_store(config, Arc::new(qdrant)).await?;

		Ok(Self::with_engine(engine))
	}

	pub fn with_engine(engine: Engine) -> Self {
		Self { engine: Arc::new(engine) }
	}
}
