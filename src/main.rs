use photo_swipe::config::SwipeSettings;
use photo_swipe::provider::LocalLibrary;
use photo_swipe::services::{SessionService, SessionSnapshot};
use photo_swipe::state::{AppContext, CurrentAsset, SwipeDirection};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

const USAGE: &str = "usage: photo-swipe <library-dir> [--config <settings.json>]";

const HELP: &str = "k keep | t trash | n neutral keep | u undo | r redo | c commit | i image size | l reload | q quit";

struct Args {
    library: PathBuf,
    config: Option<PathBuf>,
}

fn parse_args() -> Option<Args> {
    let mut library = None;
    let mut config = None;
    let mut args = std::env::args_os().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            config = Some(PathBuf::from(args.next()?));
        } else if arg.to_string_lossy().starts_with('-') {
            return None;
        } else {
            library = Some(PathBuf::from(arg));
        }
    }
    Some(Args {
        library: library?,
        config,
    })
}

fn render(snapshot: &SessionSnapshot) {
    let current = match &snapshot.current {
        CurrentAsset::Photo(handle) => format!(
            "{} ({})",
            handle.id,
            handle.created_at.format("%Y-%m-%d %H:%M")
        ),
        CurrentAsset::Exhausted => "-- no photos left --".to_string(),
    };
    println!(
        "[{}/{}] {:.0}% | kept {} trashed {} | pending {}{}{} | {}",
        snapshot.index.min(snapshot.deck_len),
        snapshot.deck_len,
        snapshot.progress_percentage * 100.0,
        snapshot.progress.kept_photos,
        snapshot.progress.trashed_photos,
        snapshot.pending,
        if snapshot.can_undo { " undo" } else { "" },
        if snapshot.can_redo { " redo" } else { "" },
        current
    );
    if let Some(message) = &snapshot.error_message {
        println!("! {}", message);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::new()
        .filter_level(if cfg!(debug_assertions) {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .parse_default_env()
        .init();

    let Some(args) = parse_args() else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };

    let settings = match &args.config {
        Some(path) => SwipeSettings::load(path)?,
        None => SwipeSettings::default(),
    };
    let library = Arc::new(LocalLibrary::new(&args.library, &settings));
    let context = AppContext::new(settings);
    let service = SessionService::new(library, context.clone());

    async_std::task::block_on(async {
        let snapshot = service.load_photos().await?;
        if !context.authorization().allows_reading() {
            println!("Library not accessible ({:?})", context.authorization());
        }
        println!("{}", HELP);
        render(&snapshot);

        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let snapshot = match line?.trim() {
                "k" => service.swipe(SwipeDirection::Keep).await,
                "t" => service.swipe(SwipeDirection::Trash).await,
                "n" => service.swipe(SwipeDirection::NeutralKeep).await,
                "u" => {
                    service.undo();
                    service.snapshot()
                }
                "r" => service.redo().await,
                "c" => {
                    if let Some(report) = service.commit().await {
                        println!("committed: {} kept, {} trashed", report.kept, report.trashed);
                    }
                    service.snapshot()
                }
                "i" => {
                    match service.current_image().await {
                        Ok(pixels) => println!("{}x{} px", pixels.width, pixels.height),
                        Err(e) => println!("! {}", e),
                    }
                    continue;
                }
                "l" => service.load_photos().await?,
                "q" => break,
                _ => {
                    println!("{}", HELP);
                    continue;
                }
            };
            render(&snapshot);
            io::stdout().flush()?;
        }

        if let Some(report) = service.commit().await {
            println!("committed on exit: {} kept, {} trashed", report.kept, report.trashed);
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
