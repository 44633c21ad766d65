#[tokio::main]
async fn main() {
    deposit_form::init_tracing();

    if let Err(e) = deposit_form::api::run_cli().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
