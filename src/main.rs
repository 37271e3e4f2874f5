use anyhow::Context;
use erudio_app::App;
use erudio_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load erudio settings")?;
    erudio_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.url,
        "erudio-app bootstrap starting"
    );

    App::connect(settings).await?.serve().await
}
