use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tower_http::services::ServeDir;

use framesight::adapters::{
    api::client::HttpDetectionClient,
    http::{router, state::HttpState},
    render::annotate::Annotator,
    terminal::{print_presentation, save_annotated},
    v4l2::capture::V4l2Capture,
};
use framesight::application::services::DetectionService;
use framesight::cli::{CameraArgs, Cli, Commands, ServeArgs, UploadArgs};
use framesight::domain::{
    camera::{CameraId, CameraMode},
    upload::ImageUpload,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logs (RUST_LOG=info unless set)
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // 2. Adapters: drawing style and the remote detector
    let style = cli.render.style()?;
    let detector = Arc::new(HttpDetectionClient::new(&cli.api_url));
    tracing::info!(
        "🔧 Detection API: {} (threshold {})",
        detector.endpoint(),
        style.threshold
    );
    // 3. Use case shared by every surface
    let service = DetectionService::new(detector, Arc::new(Annotator::new(style)));

    // 4. Run the chosen surface
    match cli.command {
        Commands::Upload(args) => upload(&service, args).await,
        Commands::Camera(args) => camera(&service, args).await,
        Commands::Serve(args) => serve(service, args).await,
    }
}

async fn upload(service: &DetectionService, args: UploadArgs) -> anyhow::Result<()> {
    let upload = ImageUpload::from_path(&args.file)?;
    let presentation = service.run(&upload, args.annotate.is_some()).await;

    print_presentation(&presentation, &mut std::io::stdout().lock())?;
    if let Some(path) = &args.annotate {
        save_annotated(&presentation, path)?;
    }
    Ok(())
}

async fn camera(service: &DetectionService, args: CameraArgs) -> anyhow::Result<()> {
    let (camera, mode): (CameraId, CameraMode) = (&args).into();
    let mut capture = V4l2Capture::open(&camera, &mode)
        .with_context(|| format!("opening camera {}", camera.path))?;

    let mut write_errors = Vec::new();
    service
        .run_camera(
            &mut capture,
            args.frames,
            Duration::from_millis(args.interval_ms),
            |index, presentation| {
                if let Err(e) = print_presentation(&presentation, &mut std::io::stdout().lock()) {
                    write_errors.push(anyhow::Error::from(e));
                }
                let path = args.output_dir.join(format!("frame_{index:04}.png"));
                if let Err(e) = save_annotated(&presentation, &path) {
                    tracing::warn!("Could not save frame {}: {:#}", index, e);
                }
            },
        )
        .await;

    match write_errors.into_iter().next() {
        Some(e) => Err(e.context("writing results to stdout")),
        None => Ok(()),
    }
}

async fn serve(service: DetectionService, args: ServeArgs) -> anyhow::Result<()> {
    let state = HttpState {
        detection: Arc::new(service),
    };
    let app = router(state).fallback_service(ServeDir::new(&args.static_dir));

    tracing::info!("🚀 Dashboard on http://{}", args.bind);
    tracing::info!("📂 Static files served from {}", args.static_dir.display());

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("binding {}", args.bind))?;
    axum::serve(listener, app).await?;

    Ok(())
}
