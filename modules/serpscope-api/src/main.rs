use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_client::Gemini;
use serpscope_api::{router, AppState};
use serpscope_common::Config;
use serpscope_pipeline::{HttpScraper, NotionReportStore, Pipeline, PipelineDeps, SerperSearcher};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("serpscope=info".parse()?))
        .init();

    let config = Config::from_env()?;

    let deps = PipelineDeps::builder()
        .searcher(Arc::new(SerperSearcher::from_config(&config)))
        .scraper(Arc::new(HttpScraper::new()?))
        .generator(Arc::new(Gemini::new(config.gemini_api_key.clone())))
        .store(Arc::new(NotionReportStore::from_config(&config)))
        .models(config.gemini_models.clone())
        .build();

    let state = Arc::new(AppState::new(Pipeline::new(deps)));
    let app = router(state);

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("Serpscope API starting on {addr}");
    info!("Web UI available at http://{addr}/");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
