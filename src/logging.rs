use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

/// CLI runs only surface warnings unless `--verbose`; the server always logs at info.
pub fn init(verbose: bool, serving: bool) -> Result<()> {
    let _ = fmt()
        .with_max_level(level_for(verbose, serving))
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init();
    Ok(())
}

fn level_for(verbose: bool, serving: bool) -> Level {
    match (verbose, serving) {
        (true, _) => Level::DEBUG,
        (false, true) => Level::INFO,
        (false, false) => Level::WARN,
    }
}
