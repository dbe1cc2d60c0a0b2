mod handler;
mod logging;
mod protocol;

use std::io::Read;
use std::process::ExitCode;

use handler::Outcome;
use protocol::ChatResponse;
use providers::{llama::LazyLlama, Settings};
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _log_guard = logging::init();

    let (settings, config_error) = match Settings::from_env_and_file() {
        Ok(s) => (s, None),
        Err(e) => {
            error!(target: "cli", "config error, falling back to defaults: {:#}", e);
            (Settings::from_env(), Some(e))
        }
    };
    let pipeline = settings.pipeline();
    let locale = pipeline.locale();
    let runtime = LazyLlama::new(settings.runtime.clone());
    info!(target: "cli", "start: base_url={} locale={:?} history_limit={}",
        settings.runtime.base_url, locale, settings.history_limit);

    let mut input = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut input) {
        error!(target: "cli", "stdin read failed: {}", e);
        let diag = ChatResponse::error(locale.unexpected(&e.to_string()));
        return Outcome::failed(diag).emit(locale);
    }

    let mut outcome = handler::handle(&input, &pipeline, &runtime).await;
    if let Some(e) = config_error {
        outcome
            .stderr
            .insert(0, ChatResponse::error(locale.config_failed(&format!("{:#}", e))));
    }
    outcome.emit(locale)
}
