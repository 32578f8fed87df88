use std::error::Error;

use ai_llm_service::telemetry;
use tracing::warn;
use tracing_subscriber::{Layer, filter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is fine; variables may come from the environment.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(telemetry::env_filter("info"))
        .with(telemetry::layer())
        .with(
            fmt::layer()
                .compact()
                .with_target(true)
                .with_filter(filter::filter_fn(|meta| {
                    !telemetry::WORKSPACE_TARGETS
                        .iter()
                        .any(|prefix| meta.target().starts_with(prefix))
                })),
        )
        .try_init()?;

    if let Err(e) = dotenv {
        warn!(error = %e, "no .env loaded; using process environment");
    }

    api::start().await?;

    Ok(())
}
