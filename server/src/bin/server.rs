use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use axum::{http::Method, Router};
use camino::Utf8PathBuf as PathBuf;
use clap::Parser;
use eyre::{Context, Result};
use grabtube::{
    app_state::{AppState, SharedState},
    routes,
    static_pages::StaticPagesService,
};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::MakeRequestUuid,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
    ServiceBuilderExt,
};
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::{prelude::*, EnvFilter};

use grabtube_core::{
    config::{self, Config},
    extract::YtDlp,
    self_check,
};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the config file. Without one, built-in defaults are used.
    #[arg(short, long)]
    config: Option<String>,
    #[arg(long)]
    skip_startup_check: bool,
    #[cfg(feature = "opentelemetry")]
    #[arg(long)]
    otel_endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "1")
    }
    if std::env::var("RUST_SPANTRACE").is_err() {
        std::env::set_var("RUST_SPANTRACE", "1");
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "debug,hyper=info")
    }
    let tracing = tracing_subscriber::registry()
        .with(EnvFilter::from_env("GRABTUBE_LOG"))
        .with(ErrorLayer::default())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    #[cfg(feature = "opentelemetry")]
    {
        use opentelemetry_otlp::WithExportConfig;
        let telemetry = args.otel_endpoint.map(|otel_endpoint| {
            let tracer = opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(
                    opentelemetry_otlp::new_exporter()
                        .tonic()
                        .with_endpoint(otel_endpoint),
                )
                .with_trace_config(opentelemetry_sdk::trace::config().with_resource(
                    opentelemetry_sdk::Resource::new(vec![opentelemetry::KeyValue::new(
                        opentelemetry_semantic_conventions::resource::SERVICE_NAME,
                        "grabtube",
                    )]),
                ))
                .install_batch(opentelemetry_sdk::runtime::Tokio)
                .unwrap();
            let _tracer = opentelemetry::global::tracer("grabtube");
            tracing_opentelemetry::layer().with_tracer(tracer)
        });
        tracing.with(telemetry).init();
    }
    #[cfg(not(feature = "opentelemetry"))]
    {
        tracing.init();
    }

    let config = match &args.config {
        Some(config_path) => {
            let config_path = PathBuf::from(config_path);
            config::read_config(&config_path).await?
        }
        None => Config::default(),
    };

    if !args.skip_startup_check {
        tracing::info!("Running self check");
        self_check::run_self_check(config.bin_paths.as_ref())
            .await
            .expect("Self check failed");
        tracing::info!("Self check successful");
    } else {
        tracing::info!("Skipping self check");
    }

    let addr: IpAddr = config
        .address
        .as_ref()
        .map(|a| a.parse().wrap_err("error parsing listening address"))
        .transpose()?
        .unwrap_or("127.0.0.1".parse().expect("is a valid address"));
    let port = config.port.unwrap_or(5000);

    info!("Starting up...");
    std::fs::create_dir_all(&config.download_dir).wrap_err("error creating download directory")?;
    let shared_state: SharedState = Arc::new(AppState {
        ytdlp: YtDlp::new(&config),
        download_dir: config.download_dir.clone(),
    });
    let cors = CorsLayer::new()
        // allow `GET` and `POST` when accessing the resource
        .allow_methods([Method::GET, Method::POST])
        // allow requests from any origin
        .allow_origin(Any);
    let app = Router::new()
        .merge(routes::api_router())
        .fallback_service(StaticPagesService::new(ServeDir::new(
            config.static_dir.as_std_path(),
        )))
        .layer(
            ServiceBuilder::new()
                .set_x_request_id(MakeRequestUuid)
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().include_headers(true))
                        .on_response(DefaultOnResponse::new().include_headers(true)),
                ),
        )
        .layer(cors)
        .with_state(shared_state);
    let listener = tokio::net::TcpListener::bind(SocketAddr::new(addr, port))
        .await
        .wrap_err("Error binding socket")?;
    info!(
        "Listening on http://{}",
        listener.local_addr().wrap_err("error reading local address")?
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("server error")?;
    info!("Shutting down...");

    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => {}
        Err(err) => {
            eprintln!("Unable to listen for shutdown signal: {}", err);
            std::process::exit(1);
            // we also shut down in case of error
        }
    }
}
