//! Serve command - run the upload and query HTTP server.

use crate::config::Settings;

/// Run the serve command. Blocks until the server shuts down.
pub async fn run(settings: Settings) {
    if let Err(e) = crate::server::serve(settings).await {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}
