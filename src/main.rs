use std::{process, sync::Arc};

use printworks::{
    application::{
        contact::{ContactService, Mailer},
        content::ContentService,
        error::AppError,
        reviews::{ReviewService, ReviewSource},
    },
    cache::SystemClock,
    config,
    infra::{
        content_store,
        email::{HttpMailer, MailConfig},
        error::InfraError,
        google::{GooglePlacesClient, GooglePlacesConfig},
        http::{HttpState, build_router},
        telemetry,
        uploads::UploadStorage,
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
        config::Command::CheckContent(_) => run_check_content(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let state = build_http_state(&settings).await?;
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "printworks::serve",
        addr = %settings.server.addr,
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn run_check_content(settings: config::Settings) -> Result<(), AppError> {
    let (gallery, blog) = content_store::load(&settings.content.directory)
        .await
        .map_err(AppError::from)?;

    info!(
        target = "printworks::check_content",
        directory = %settings.content.directory.display(),
        gallery_items = gallery.items.len(),
        gallery_categories = gallery.categories.len(),
        blog_items = blog.items.len(),
        blog_categories = blog.categories.len(),
        "content collections are valid"
    );
    Ok(())
}

async fn build_http_state(settings: &config::Settings) -> Result<HttpState, AppError> {
    let (gallery, blog) = content_store::load(&settings.content.directory)
        .await
        .map_err(AppError::from)?;
    let content = ContentService::new(gallery, blog);

    let reviews = build_review_service(settings)?;

    let mail_api_key = settings
        .contact
        .mail_api_key
        .as_ref()
        .ok_or_else(|| InfraError::configuration("contact.mail_api_key is not configured"))
        .map_err(AppError::from)?;
    let mailer: Arc<dyn Mailer> = Arc::new(
        HttpMailer::new(MailConfig {
            api_base: settings.contact.mail_api_base.clone(),
            api_key: mail_api_key.clone(),
            from: settings.contact.mail_from.clone(),
            to: settings.contact.mail_to.clone(),
            timeout: settings.contact.mail_timeout,
        })
        .map_err(AppError::from)?,
    );

    let uploads = Arc::new(
        UploadStorage::new(settings.contact.uploads_directory.clone())
            .map_err(|err| AppError::from(InfraError::Io(err)))?,
    );
    let contact = Arc::new(ContactService::new(mailer, uploads));

    Ok(HttpState {
        reviews: Arc::new(reviews),
        content,
        contact,
        contact_body_limit: settings.contact.max_request_bytes.get() as usize,
    })
}

fn build_review_service(settings: &config::Settings) -> Result<ReviewService, AppError> {
    let source: Arc<dyn ReviewSource> = Arc::new(
        GooglePlacesClient::new(GooglePlacesConfig {
            endpoint: settings.reviews.endpoint.clone(),
            api_key: settings.reviews.api_key.clone().unwrap_or_default(),
            timeout: settings.reviews.timeout,
        })
        .map_err(AppError::from)?,
    );

    // Without both a place id and an api key the live path can never
    // succeed, so the service is wired to fall back immediately.
    let place_id = match (&settings.reviews.place_id, &settings.reviews.api_key) {
        (Some(place_id), Some(_)) => Some(place_id.clone()),
        (Some(_), None) => {
            info!(
                target = "printworks::serve",
                "reviews.place_id is set but reviews.api_key is not; serving fallback reviews"
            );
            None
        }
        (None, _) => {
            info!(
                target = "printworks::serve",
                "reviews.place_id is not configured; serving fallback reviews"
            );
            None
        }
    };

    Ok(ReviewService::new(
        source,
        place_id,
        settings.reviews.cache_ttl,
        Arc::new(SystemClock),
    ))
}
