use console::Term;

/// Exit status for a run interrupted by Ctrl+C.
pub(crate) const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Set up the Ctrl+C handler.
///
/// An interrupt ends the process at once. Updates already sent stay applied.
pub(crate) fn setup_shutdown_handler() {
    tokio::spawn(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {}", e);
            return;
        }

        if Term::stdout().is_term() {
            eprintln!("\n\nInterrupted.");
        } else {
            tracing::warn!("Interrupted, exiting");
        }

        std::process::exit(INTERRUPTED_EXIT_CODE);
    });
}
