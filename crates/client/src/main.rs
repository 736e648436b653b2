//! `campusgate`: inspect the stored session from the command line.
//!
//! ```text
//! campusgate check <path>    guard decision for a route, as JSON
//! campusgate logout          clear the stored session token
//! ```

use anyhow::{Context, bail};

use campusgate_auth::{Route, TokenStore};
use campusgate_client::Session;
use campusgate_core::ClientConfig;
use campusgate_events::NotificationBus;

fn main() -> anyhow::Result<()> {
    let config = ClientConfig::from_env().context("failed to load client configuration")?;
    campusgate_observability::init_with_filter(&config.log_filter);

    let store = TokenStore::from_config(&config);
    let session = Session::new(store, NotificationBus::new(), |route: &Route| {
        tracing::info!(route = %route, "navigate");
    });

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["check", path] => {
            let explanation = session.explain(path);
            println!(
                "{}",
                serde_json::to_string_pretty(&explanation).context("failed to render decision")?
            );
        }
        ["logout"] => session.logout(),
        _ => bail!("usage: campusgate check <path> | campusgate logout"),
    }

    Ok(())
}
