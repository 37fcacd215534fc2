use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_ansi(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                "info,sqlx=warn,reqwest=warn,hyper=warn,webrtc=warn,webrtc_ice=warn,webrtc_mdns=off",
            )
        }))
        .init();
}
