use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    middleware::Logger,
    web, App, Error, HttpServer,
};
use anyhow::{Context, Result};
use log::info;

use crate::api::{self, AppState};
use crate::config::Config;
use crate::database::DbPool;

/// Assemble the application: shared state, body limits, route guard, access log and routes
pub fn build_app(
    state: web::Data<AppState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    let guard = state.route_guard();

    App::new()
        .app_data(state)
        .app_data(api::json_config())
        .wrap(guard)
        .wrap(Logger::new("%a \"%r\" %s %b %Dms"))
        .configure(api::configure)
}

/// Run the HTTP server until it is shut down
pub async fn run(config: Config, pool: DbPool) -> Result<()> {
    let state = web::Data::new(AppState::from_config(&config, pool));

    info!(
        "Starting {} ({:?}) on {}",
        config.app_name, config.environment, config.server.bind_address
    );

    let mut server = HttpServer::new(move || build_app(state.clone()));

    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server
        .bind(&config.server.bind_address)
        .with_context(|| format!("Failed to bind {}", config.server.bind_address))?
        .run()
        .await
        .context("HTTP server terminated with an error")
}
