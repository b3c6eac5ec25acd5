use std::{
    io::{self, Write},
    process,
    sync::Arc,
};

use site_counts::{
    application::{
        error::{AppError, error_chain},
        repos::{ContentRepository, FragmentCache},
        site_counts::{SiteCountsConfig, SiteCountsService},
    },
    cache::{CacheConfig, DisabledCache, FragmentStore, SystemClock},
    config,
    domain::entities::RenderRequest,
    infra::{error::InfraError, seed, telemetry},
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let chain = error_chain(error).join(": ");
    if dispatcher::has_been_set() {
        error!(error = %chain, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %chain, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Render(Box::<config::RenderArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Render(args) => run_render(settings, *args).await,
    }
}

async fn run_render(settings: config::Settings, args: config::RenderArgs) -> Result<(), AppError> {
    let repository = seed::load(&settings.content.seed_path)?;
    let content: Arc<dyn ContentRepository> = Arc::new(repository);

    let cache_config = CacheConfig::from(&settings.cache);
    let cache: Arc<dyn FragmentCache> = if cache_config.enabled {
        Arc::new(FragmentStore::new(&cache_config, Arc::new(SystemClock)))
    } else {
        info!(
            target = "site_counts::main",
            "Fragment cache disabled; every render queries the repository"
        );
        Arc::new(DisabledCache)
    };

    let service = SiteCountsService::new(content, cache, SiteCountsConfig::from(&cache_config));
    let request = RenderRequest::new(
        settings.fragment.class_name.clone(),
        settings.fragment.item_id,
    );

    let mut stdout = io::stdout();
    for _ in 0..args.repeat {
        let fragment = service.render(&request).await?;
        writeln!(stdout, "{fragment}").map_err(InfraError::from)?;
    }
    stdout.flush().map_err(InfraError::from)?;

    Ok(())
}
