use std::{
    fs,
    io::{self, Read, Write},
    path::Path,
    process,
    sync::Arc,
};

use markview::{
    ContentHost, HeadlessSurface, HostOptions, LoadTarget, TemplateAssets, TerminationHub,
    application::error::AppError,
    config::{self, PreviewArgs, RenderArgs, Settings},
    infra::{error::InfraError, telemetry},
};
use tracing::{Dispatch, Level, debug, dispatcher, error, info};
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

    let subscriber = tracing_fmt()
        .with_writer(io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli().map_err(InfraError::from)?;

    telemetry::init(&settings.logging)?;

    match cli_args.command {
        config::Command::Render(args) => run_render(&settings, args),
        config::Command::Preview(args) => run_preview(&settings, args).await,
    }
}

fn run_render(settings: &Settings, args: RenderArgs) -> Result<(), AppError> {
    let markdown = read_markdown(&args.file)?;
    let surface = Arc::new(HeadlessSurface::new());

    let host = ContentHost::render(surface.clone(), &markdown, host_options(settings)?)?;
    surface.finish_latest();

    if let Some(dir) = host.staging_dir() {
        info!(
            target = "markview::render",
            staging_dir = %dir.display(),
            "Page staged; directory is removed on exit"
        );
    }

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(host.page_document().as_str().as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(InfraError::from)?;

    host.close();
    Ok(())
}

async fn run_preview(settings: &Settings, args: PreviewArgs) -> Result<(), AppError> {
    let markdown = read_markdown(&args.file)?;
    let surface = Arc::new(HeadlessSurface::new().requiring_file_staging());
    let hub = Arc::new(TerminationHub::new());

    let options = host_options(settings)?.with_termination(hub.clone());
    let host = ContentHost::render(surface.clone(), &markdown, options)?;

    let url = match surface.last_load().map(|load| load.target) {
        Some(LoadTarget::File { url, .. }) => url,
        other => {
            return Err(AppError::unexpected(format!(
                "preview expected a staged load, got {other:?}"
            )));
        }
    };
    surface.finish_latest();

    println!("{url}");
    info!(
        target = "markview::preview",
        url = %url,
        "Preview staged; press Ctrl-C to remove it"
    );

    tokio::signal::ctrl_c().await.map_err(InfraError::from)?;

    let notified = hub.notify();
    debug!(
        target = "markview::preview",
        subscribers = notified,
        "Termination delivered"
    );
    host.close();
    Ok(())
}

fn host_options(settings: &Settings) -> Result<HostOptions, AppError> {
    let assets = match settings.render.template_dir.as_ref() {
        Some(dir) => TemplateAssets::directory(dir)?,
        None => TemplateAssets::bundled(),
    };

    let mut options = HostOptions::default()
        .with_render_options(settings.render.render_options())
        .with_template_assets(assets);
    if let Some(root) = settings.render.staging_root.as_ref() {
        options = options.with_staging_root(root);
    }
    Ok(options)
}

fn read_markdown(path: &Path) -> Result<String, AppError> {
    let to_input_error = |source| AppError::Input {
        path: path.to_path_buf(),
        source,
    };

    if path == Path::new("-") {
        let mut markdown = String::new();
        io::stdin()
            .read_to_string(&mut markdown)
            .map_err(to_input_error)?;
        return Ok(markdown);
    }

    fs::read_to_string(path).map_err(to_input_error)
}
