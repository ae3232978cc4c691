use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

/// `-v` shows stage progress and tool output, `-vv` adds per-file and layout detail.
pub fn level_for(verbosity: u8) -> Option<Level> {
    match verbosity {
        0 => None,
        1 => Some(Level::INFO),
        _ => Some(Level::DEBUG),
    }
}

/// Installs a stderr subscriber so logs never mix with the run summary on stdout.
pub fn init(verbosity: u8) -> Result<()> {
    let Some(level) = level_for(verbosity) else {
        return Ok(());
    };
    let _ = fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
    Ok(())
}
