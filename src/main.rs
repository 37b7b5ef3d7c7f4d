use anyhow::{Context, Result};
use tracing::{error, info};

use potability::api;
use potability::common::config::AppCfg;
use potability::common::log;
use potability::store::{FsArtifactRepo, ModelStore};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = AppCfg::load();
    log::init(&cfg);

    let repo = FsArtifactRepo::new(&cfg);
    let store = match ModelStore::load(&repo) {
        Ok(store) => store,
        Err(err) => {
            error!(
                ev = "load",
                code = err.code as u32,
                reason = %err.code,
                msg = %err.msg,
                "artifact load failed"
            );
            return Err(anyhow::Error::new(err).context("failed to load model artifacts"));
        }
    };

    info!(
        ev = "load",
        model = %repo.model_path().display(),
        scaler = %repo.scaler_path().display(),
        classifier = store.classifier().kind(),
        scaler_kind = store.scaler().kind(),
        n_features = store.n_features(),
        "artifacts loaded"
    );

    api::serve(&cfg, store)
        .await
        .with_context(|| format!("server on {} failed", cfg.bind_addr))
}
