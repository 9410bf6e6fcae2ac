use std::sync::Arc;

use actix_web::{App, HttpServer};
use opentelemetry::global;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::runtime::TokioCurrentThread;
use paperclip::actix::{web, OpenApiExt};
use tracing_actix_web::TracingLogger;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

use librarymanager_service::app_config::config_app;
use librarymanager_service::book_service::BookService;
use librarymanager_service::books_repository::{
    BookRepository, InMemoryBooksRepository, PostgresBooksRepository,
};
use librarymanager_service::password_encoder::PasswordEncoder;
use librarymanager_service::postgres;
use librarymanager_service::settings::{DatabaseSettings, Settings, TelemetrySettings};
use librarymanager_service::specimen_service::SpecimenService;
use librarymanager_service::specimens_repository::{
    InMemorySpecimensRepository, PostgresSpecimensRepository, SpecimenRepository,
};
use librarymanager_service::user_service::UserService;
use librarymanager_service::users_repository::{
    InMemoryUsersRepository, PostgresUsersRepository, UserRepository,
};

struct Repositories {
    books: Arc<dyn BookRepository>,
    specimens: Arc<dyn SpecimenRepository>,
    users: Arc<dyn UserRepository>,
}

// Based on https://github.com/LukeMathWalker/tracing-actix-web/blob/main/examples/opentelemetry/src/main.rs#L15
fn init_telemetry(settings: &TelemetrySettings) {
    let app_name = settings.service_name.clone();

    // Spans are exported in batch to the Jaeger agent
    global::set_text_map_propagator(TraceContextPropagator::new());
    #[allow(deprecated)]
    let tracer = opentelemetry_jaeger::new_agent_pipeline()
        .with_service_name(app_name.clone())
        .install_batch(TokioCurrentThread)
        .expect("Failed to install OpenTelemetry tracer.");

    // Tunable via `RUST_LOG` env variable
    let env_filter = EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("info"));
    let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);
    let formatting_layer = BunyanFormattingLayer::new(app_name, std::io::stdout);
    let subscriber = Registry::default()
        .with(env_filter)
        .with(telemetry)
        .with(JsonStorageLayer)
        .with(formatting_layer);
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to install `tracing` subscriber.")
}

async fn init_repositories(settings: &DatabaseSettings) -> anyhow::Result<Repositories> {
    if settings.use_in_memory_db {
        tracing::info!("Using in-memory storage");
        return Ok(Repositories {
            books: Arc::new(InMemoryBooksRepository::default()),
            specimens: Arc::new(InMemorySpecimensRepository::default()),
            users: Arc::new(InMemoryUsersRepository::default()),
        });
    }

    let client = Arc::new(postgres::connect(&settings.postgres_config()).await?);
    Ok(Repositories {
        books: Arc::new(PostgresBooksRepository::init(client.clone()).await?),
        specimens: Arc::new(PostgresSpecimensRepository::init(client.clone()).await?),
        users: Arc::new(PostgresUsersRepository::init(client).await?),
    })
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let settings = Settings::load().expect("Failed to load settings");
    init_telemetry(&settings.telemetry);

    let repositories = init_repositories(&settings.database)
        .await
        .expect("Failed to init storage");
    let password_encoder =
        PasswordEncoder::new(&settings.password_encoder).expect("Invalid password encoder settings");

    let book_service = web::Data::new(BookService::new(repositories.books.clone()));
    let specimen_service = web::Data::new(SpecimenService::new(
        repositories.specimens,
        repositories.books,
    ));
    let user_service = web::Data::new(UserService::new(repositories.users, password_encoder));

    tracing::info!(
        "Starting HTTP server at http://{}:{}",
        settings.server.host,
        settings.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap_api()
            .app_data(book_service.clone())
            .app_data(specimen_service.clone())
            .app_data(user_service.clone())
            .wrap(TracingLogger::default())
            .configure(config_app)
            .with_json_spec_at("/apispec/v2")
            .build()
    })
    .bind((settings.server.host.as_str(), settings.server.port))?
    .run()
    .await
}
