use log::error;
use portfolio_shell::config::LOG_LEVEL;
use portfolio_shell::{logging, service_worker, OfflineConfig};

fn main() {
    // Set the panic hook to log detailed errors to the console
    console_error_panic_hook::set_once();
    logging::init(LOG_LEVEL);
    if let Err(err) = service_worker::start(OfflineConfig::default()) {
        error!("Service worker failed to start: {}", err);
    }
}
