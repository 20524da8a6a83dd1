//! Print a DevCycle management API access token.
//!
//! Reads `DEVCYCLE_CLIENT_ID` and `DEVCYCLE_CLIENT_SECRET`, performs the
//! client-credentials exchange and writes the token to stdout. Logs go to
//! stderr.

use std::process::ExitCode;

use devcycle_provider::config::{CLIENT_ID_ENV, CLIENT_SECRET_ENV};
use devcycle_provider::{get_auth_token, init_logging};
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let client_id = std::env::var(CLIENT_ID_ENV).unwrap_or_default();
    let client_secret = std::env::var(CLIENT_SECRET_ENV).unwrap_or_default();

    match get_auth_token(&client_id, &client_secret).await {
        Ok(token) => {
            println!("{}", token.access_token);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "unable to obtain an access token");
            ExitCode::FAILURE
        }
    }
}
