use std::future::ready;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use catalog_sync::{app_context::AppContext, config::Config, readiness::ReadinessHandler};
use envconfig::Envconfig;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

fn setup_tracing(json: bool) {
    let log_layer = match json {
        true => tracing_subscriber::fmt::layer().json().boxed(),
        false => tracing_subscriber::fmt::layer().boxed(),
    };
    tracing_subscriber::registry()
        .with(log_layer.with_filter(EnvFilter::from_default_env()))
        .init();
}

fn setup_metrics_recorder() -> Result<PrometheusHandle> {
    const BUCKETS: &[f64] = &[
        1.0, 5.0, 10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2000.0, 5000.0, 10000.0,
    ];

    Ok(PrometheusBuilder::new()
        .set_buckets(BUCKETS)?
        .install_recorder()?)
}

pub async fn index() -> &'static str {
    "catalog sync service"
}

async fn serve(
    context: &AppContext,
    readiness: ReadinessHandler,
    recorder: PrometheusHandle,
) -> Result<()> {
    let registry = context.health_registry.clone();
    let router = Router::new()
        .route("/", get(index))
        .route(
            "/_readiness",
            get(move || {
                let readiness = readiness.clone();
                async move { readiness.check().await }
            }),
        )
        .route("/_liveness", get(move || ready(registry.get_status())))
        .route("/metrics", get(move || ready(recorder.render())));

    let bind = context.config.bind();
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!(%bind, "serving health and metrics");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!(error = %e, "health server stopped");
        }
    });
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::init_from_env().context("failed to load configuration")?;
    setup_tracing(config.log_json());
    info!("Starting up...");

    let recorder = setup_metrics_recorder()?;
    let mut context = AppContext::new(config).await?;

    let shutdown = CancellationToken::new();
    let mut loops = JoinSet::new();
    for consumer_loop in context.loops.drain(..) {
        loops.spawn(consumer_loop.run(shutdown.child_token()));
    }
    // Ready only while the loops run; cancelling the token flips it
    serve(&context, ReadinessHandler::new(shutdown.clone()), recorder).await?;

    tokio::select! {
        _ = shutdown_signal() => info!("shutdown requested, draining consumer loops"),
        Some(result) = loops.join_next() => {
            // Loops only return once cancelled, so this one died
            error!(?result, "consumer loop exited unexpectedly");
        }
    }

    shutdown.cancel();
    while let Some(result) = loops.join_next().await {
        if let Err(e) = result {
            error!(error = %e, "consumer loop panicked");
        }
    }

    info!("shut down cleanly");
    Ok(())
}
