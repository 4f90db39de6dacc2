use minimart::app;

/// Main entry point for the web application
///
/// Initializes logging and runs the shop server; stores are rooted at the
/// default data directory and the bind address can be overridden with
/// `BIND_ADDR`.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    app::run().await
}
