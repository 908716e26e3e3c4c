// Entrypoint for the CLI application.
// - Keeps `main` small: set up logging, create an API client and hand it
//   to the application controller.
// - Logs go to stderr so they never mix with the menus on stdout.

use beach_umbrella_cli::{api::ApiClient, console::StdConsole, ui::App};
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Base URL comes from `BEACH_API_SERVER`, see `api::ApiClient::from_env`.
    let api = ApiClient::from_env()?;

    // Start the login menu. This call blocks until the user exits.
    let app = App::new(api, Rc::new(StdConsole))?;
    app.run()
}
