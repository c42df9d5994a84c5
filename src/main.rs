use nextask_lib::config::AppConfig;
use nextask_lib::logging::init_logging;

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env();
    if let Err(err) = init_logging(&config.data_dir) {
        eprintln!("failed to initialize logging: {err}");
    }
    if let Err(err) = nextask_lib::run(config).await {
        log::error!("host stopped: {err}");
        std::process::exit(1);
    }
}
