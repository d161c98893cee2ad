use reqwest::Client;
use tracing::{debug, info};

use crate::{Config, Error};

/// Startup gate state. The only transition is a GET completing without a
/// transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServiceState {
    Waiting,
    Ready,
}

/// Block until `url` answers a GET request.
///
/// Any HTTP status counts as ready; a 404 or 500 still proves the server is
/// accepting connections. Only transient transport failures (refused
/// connection, timeout, DNS) keep the loop waiting, with no bound on the
/// attempt count. Anything else, such as a malformed probe URL, is a
/// configuration error and returns immediately.
pub async fn wait_for_service(client: &Client, url: &str, config: &Config) -> Result<(), Error> {
    let mut state = ServiceState::Waiting;
    let mut attempts: u64 = 0;
    loop {
        match state {
            ServiceState::Ready => {
                info!(url, attempts, "service is reachable");
                return Ok(());
            }
            ServiceState::Waiting => {
                match client
                    .get(url)
                    .timeout(config.probe_timeout)
                    .send()
                    .await
                {
                    Ok(response) => {
                        debug!(status = %response.status(), "probe answered");
                        state = ServiceState::Ready;
                    }
                    Err(e) if e.is_connect() || e.is_timeout() => {
                        attempts += 1;
                        debug!(attempts, "service not ready yet, retrying");
                        tokio::time::sleep(config.probe_delay).await;
                    }
                    Err(e) => return Err(Error::Http(e)),
                }
            }
        }
    }
}
