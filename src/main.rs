use std::io;

use carwash::BookingStore;

extern crate pretty_env_logger;
#[macro_use] extern crate log;

// Prints everything in the configured database, for manual inspection.
#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    let mut store = match BookingStore::from_env().await {
        Ok(store) => store,
        Err(e) => {
            error!("Could not open booking store: {}", e);
            std::process::exit(1);
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    store.check_all_data(&mut out).await;
    store.close().await;
}
