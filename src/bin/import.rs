use clap::Parser;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use booth_uploader::{
    config::AppConfig,
    models::upload::UploadJob,
    services::{
        compression::ImageCompressor,
        import::{collect_photos, import_request, load_photo},
        queue::{UploadHandle, UploadQueue},
        transport::HttpTransport,
    },
};

#[derive(Parser)]
#[command(name = "import")]
#[command(about = "Upload a directory of booth photos through the upload queue")]
#[command(version)]
struct Cli {
    /// Five-character barcode prefix the photos belong to
    #[arg(long, short = 'b')]
    barcode_prefix: String,

    /// Photographer (employee) id recorded as the photos' owner
    #[arg(long, short = 'e')]
    employee_id: i64,

    /// Override UPLOAD_CONCURRENCY for this run
    #[arg(long, short = 'j')]
    concurrency: Option<usize>,

    /// Directory containing .jpg, .png or .webp photos
    dir: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();
    let request = match import_request(&cli.barcode_prefix, cli.employee_id) {
        Ok(request) => request,
        Err(e) => {
            tracing::error!(
                barcode_prefix = %cli.barcode_prefix,
                employee_id = cli.employee_id,
                error = %e,
                "Invalid photo metadata"
            );
            return ExitCode::FAILURE;
        }
    };

    let config = AppConfig::from_env().expect("Failed to load configuration");

    let transport = HttpTransport::new(
        &config.api_base_url,
        config.api_token.clone(),
        config.http_timeout(),
    )
    .expect("Failed to initialize booth API client");

    let mut queue_config = config.queue_config();
    if let Some(concurrency) = cli.concurrency {
        queue_config.max_concurrency = concurrency;
    }
    queue_config.max_pending = None;
    let queue = UploadQueue::new(queue_config, ImageCompressor::default(), transport);

    let paths = match collect_photos(&cli.dir) {
        Ok(paths) => paths,
        Err(e) => {
            tracing::error!(dir = %cli.dir.display(), error = %e, "Cannot read photo directory");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        dir = %cli.dir.display(),
        photos = paths.len(),
        barcode_prefix = %request.barcode_prefix,
        employee_id = request.employee_id,
        "Importing photos"
    );

    // Photos are read from disk only when they fit in the look-ahead window.
    let window = queue.max_concurrency().max(1) * 2;
    let mut tally = Tally::default();
    let mut in_flight: VecDeque<(String, UploadHandle)> = VecDeque::with_capacity(window);
    for path in &paths {
        if in_flight.len() >= window {
            if let Some((name, handle)) = in_flight.pop_front() {
                tally.record(&name, handle).await;
            }
        }
        match load_photo(path) {
            Ok(photo) => {
                let name = photo.file_name.clone();
                let job = UploadJob::new(photo, request.barcode_prefix.clone(), request.employee_id);
                in_flight.push_back((name, queue.enqueue(job)));
            }
            Err(e) => {
                tally.failed += 1;
                tracing::error!(file = %path.display(), error = %e, "Cannot read photo");
            }
        }
    }
    while let Some((name, handle)) = in_flight.pop_front() {
        tally.record(&name, handle).await;
    }

    let Tally { uploaded, failed } = tally;
    println!("Uploaded {uploaded} of {} photos ({failed} failed)", paths.len());

    if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[derive(Default)]
struct Tally {
    uploaded: usize,
    failed: usize,
}

impl Tally {
    async fn record(&mut self, name: &str, handle: UploadHandle) {
        match handle.outcome().await {
            Some(Ok(_)) => self.uploaded += 1,
            Some(Err(e)) => {
                self.failed += 1;
                tracing::error!(file = %name, error = %e, "Photo upload failed");
            }
            None => {
                self.failed += 1;
                tracing::error!(file = %name, "Photo was dropped before uploading");
            }
        }
    }
}
