use super::print::{
    draw_progress, end_progress, print_error_notice, print_notice, print_status, print_view,
};
use crate::args::Cli;
use directories::ProjectDirs;
use reportdeck::app::ReportDeck;
use reportdeck::config::{ReportDeckConfig, UploadLimits};
use reportdeck::download::{find_by_name, request_download, write_manifest};
use reportdeck::error::{ReportError, Result};
use reportdeck::model::UploadFile;
use reportdeck::repository::mock::MockRepository;
use reportdeck::repository::ReportRepository;
use reportdeck::store::{ReportStore, Subscription};
use reportdeck::upload::StatusMessage;
use reportdeck::validation::validate_file;
use reportdeck::view::FilterMemo;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};

pub struct AppContext {
    pub deck: ReportDeck<MockRepository>,
    pub home: PathBuf,
    pub memo: FilterMemo,
}

pub async fn init_context(cli: &Cli) -> Result<AppContext> {
    let home = match &cli.home {
        Some(home) => home.clone(),
        None => ProjectDirs::from("com", "reportdeck", "reportdeck")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| ReportError::Config("Could not determine config dir".to_string()))?,
    };

    let mut config = ReportDeckConfig::load(&home)?;
    if let Some(rate) = cli.fail_rate {
        config.upload_failure_rate = rate;
        config.validate()?;
    }
    if cli.fast {
        config = config.without_latency();
    }

    let deck = ReportDeck::with_mock(config);
    if deck.start().await.is_err() {
        if let Some(error) = deck.error() {
            print_error_notice(&error);
        }
    }

    Ok(AppContext {
        deck,
        home,
        memo: FilterMemo::new(),
    })
}

pub fn handle_list(ctx: &mut AppContext, search: Option<String>) -> Result<()> {
    if let Some(term) = search {
        ctx.deck.store().set_search_query(term);
    }
    print_view(&ctx.deck.view(&mut ctx.memo));
    Ok(())
}

pub async fn handle_upload(ctx: &mut AppContext, files: Vec<PathBuf>) -> Result<()> {
    let uploader = ctx.deck.uploader();
    let limits = ctx.deck.config().upload_limits();
    let _progress = watch_progress(ctx.deck.store());
    let mut failures = 0;

    for path in files {
        let file = match read_upload_file(&path, &limits) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable upload");
                print_status(&StatusMessage::error(format!(
                    "Could not read {}: {}",
                    path.display(),
                    e
                )));
                failures += 1;
                continue;
            }
        };
        if uploader.handle_file(file).await.is_err() {
            failures += 1;
        }
        print_status(&uploader.status());
    }

    println!();
    print_view(&ctx.deck.view(&mut ctx.memo));

    if failures > 0 {
        return Err(ReportError::Repository(format!(
            "{} upload(s) did not complete",
            failures
        )));
    }
    Ok(())
}

pub fn handle_download(ctx: &mut AppContext, name: &str, out: Option<PathBuf>) -> Result<()> {
    let snapshot = ctx.deck.store().snapshot();
    let report = find_by_name(&snapshot.reports, name)?;
    let ticket = request_download(report);
    print_notice(&ticket.notice);

    let dir = match out {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let path = write_manifest(report, &dir)?;
    println!("{}", path.display());
    Ok(())
}

pub fn handle_config(ctx: &AppContext, key: Option<String>, value: Option<String>) -> Result<()> {
    match (key, value) {
        (None, _) => {
            println!("# {}", ctx.home.join("config.json").display());
            println!("{}", serde_json::to_string_pretty(ctx.deck.config())?);
        }
        (Some(key), None) => {
            println!("{} = {}", key, ctx.deck.config().get_value(&key)?);
        }
        (Some(key), Some(value)) => {
            // Start from the file, not the flag-adjusted config in use.
            let mut config = ReportDeckConfig::load(&ctx.home)?;
            config.set_value(&key, &value)?;
            config.save(&ctx.home)?;
            print_notice(&format!("{} = {}", key, config.get_value(&key)?));
        }
    }
    Ok(())
}

/// Draws the store's upload progress on stderr for as long as the
/// subscription is held.
pub fn watch_progress<R: ReportRepository>(store: &ReportStore<R>) -> Subscription {
    let last = AtomicU8::new(0);
    store.subscribe(move |state| {
        let progress = state.upload_progress;
        let previous = last.swap(progress, Ordering::SeqCst);
        if progress == previous {
            return;
        }
        if progress == 0 {
            if previous != 100 {
                end_progress();
            }
            return;
        }
        draw_progress(progress);
    })
}

/// Builds the upload for `path`. Files that fail validation on their
/// metadata alone are returned without their bytes, so an oversized file is
/// never read into memory just to be rejected.
pub fn read_upload_file(path: &Path, limits: &UploadLimits) -> Result<UploadFile> {
    let metadata = fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(ReportError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime = mime_for(path);

    let described = UploadFile::from_metadata(name.clone(), mime, metadata.len());
    if validate_file(&described, limits).is_err() {
        return Ok(described);
    }

    let content = fs::read(path)?;
    Ok(UploadFile::new(name, mime, content))
}

/// Best-effort MIME type from the file extension, the way a browser would
/// report it for a picked file.
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "csv" => "text/csv",
        "txt" => "text/plain",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}
