use cpnet_service::api;
use cpnet_service::common::init;
use cpnet_service::settings::AppSettings;
use cpnet_service::workers::crons;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = AppSettings::get();
    init::initialize_logging(settings);
    match settings.app_component.as_str() {
        "api" => api::serve(settings).await,
        "cleanup" => crons::cleanup_cron::serve(settings).await,
        "migrate" => init::run_migrations(settings).await,
        other => anyhow::bail!("Unknown app component: {other}"),
    }
}
