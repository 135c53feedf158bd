use {
    chrono::Local,
    std::{
        fs::{self, File, OpenOptions},
        path::{Path, PathBuf},
    },
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

/// `RUST_LOG` wins over the `debug` switch from the config file.
fn build_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let filter_level = if debug { "debug" } else { "info" };
        EnvFilter::new(filter_level)
    })
}

/// Opens (or creates) today's log file in `log_dir`.
fn open_daily_log(log_dir: &Path) -> std::io::Result<(PathBuf, File)> {
    fs::create_dir_all(log_dir)?;

    let log_file = log_dir.join(format!("{}.log", Local::now().format("%Y-%m-%d")));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)?;

    Ok((log_file, file))
}

/// Installs the global subscriber: a colored console layer and a plain daily
/// file layer. Calling it twice keeps the first subscriber.
pub fn init_logging(debug: bool, log_dir: &str) -> std::io::Result<PathBuf> {
    let (log_file, file) = open_daily_log(Path::new(log_dir))?;

    let console_layer = fmt::layer().with_target(false).with_ansi(true).compact();
    let file_layer = fmt::layer()
        .with_writer(file)
        .with_target(false)
        .with_ansi(false)
        .compact();

    let installed = tracing_subscriber::registry()
        .with(build_filter(debug))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("Logging to: {}", log_file.display());
    }

    Ok(log_file)
}
