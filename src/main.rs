use std::process;
use std::sync::Arc;

use libris::{
    application::{
        authors::AuthorService, books::BookService, error::AppError, repos::AuthorsRepo,
        repos::AuthorsWriteRepo, repos::BooksRepo, repos::BooksWriteRepo, shaping::LinkBuilder,
    },
    cache::{CacheConfig, ResponseCache},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState},
        telemetry,
    },
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
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let state = build_api_state(repositories, &settings);

    let router = http::build_api_router(state);
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "libris::serve",
        addr = %settings.server.addr,
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let database_url = require_database_url(&settings)?;
    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    info!(target = "libris::migrate", "migrations applied");
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = require_database_url(settings)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn require_database_url(settings: &config::Settings) -> Result<&String, AppError> {
    settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)
}

fn build_api_state(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> ApiState {
    let authors_repo: Arc<dyn AuthorsRepo> = repositories.clone();
    let authors_write_repo: Arc<dyn AuthorsWriteRepo> = repositories.clone();
    let books_repo: Arc<dyn BooksRepo> = repositories.clone();
    let books_write_repo: Arc<dyn BooksWriteRepo> = repositories.clone();

    let cache = Arc::new(ResponseCache::new(CacheConfig::from(&settings.cache)));
    let links = Arc::new(LinkBuilder::new(settings.api.base_url.clone()));

    let books = Arc::new(BookService::new(
        books_repo,
        books_write_repo,
        authors_repo.clone(),
        cache.clone(),
        links.clone(),
    ));
    let authors = Arc::new(AuthorService::new(
        authors_repo,
        authors_write_repo,
        cache,
        links,
    ));

    ApiState {
        books,
        authors,
        admin_tokens: Arc::new(settings.auth.admin_tokens.clone()),
        db: Some(repositories),
    }
}
