use std::sync::Arc;

use clap::Parser;
use tracing::{debug, error, info};

use sentinela_viewer::{
    Result,
    config::{Args, Config},
    context::Context,
    logging,
    media::{MediaStack, webrtc::WebRtcStack},
    session::SessionSettings,
    shell::ViewerShell,
};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    debug!("Parsing config...");
    let args: Args<Config> = Args::parse();
    let config = args
        .get_config()
        .inspect_err(|err| error!(err = ?err, "Error getting config"))?;
    debug!(config = ?config, "Parsed config successfully");

    if args.validate {
        info!("Config is valid");
        return Ok(());
    }

    info!("Starting Sentinela Viewer");

    let media: Arc<dyn MediaStack> = Arc::new(WebRtcStack::new(config.media.clone()));
    let context = Arc::new(Context::new(&config, media).await?);

    let settings = SessionSettings {
        gather_timeout: config.media.gather_timeout,
        ..SessionSettings::default()
    };
    let (mut shell, _commands) = ViewerShell::new(context, config.viewer.clone(), settings);

    tokio::select! {
        result = shell.run() => {
            if let Err(err) = result {
                error!(err = ?err, "Viewer shell stopped");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    info!("Sentinela Viewer Exiting...");
    Ok(())
}
