//! Process entry point: load configuration, start the relay, run until the
//! accept loops end (they don't, short of a panic or process signal).

use livelog_server::config::Config;

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("livelog: {err}");
            std::process::exit(err.exit_code());
        }
    };

    livelog_server::init_tracing(config.debug);

    let handle = match livelog_server::start(config).await {
        Ok(handle) => handle,
        Err(err) => {
            tracing::error!(error = %err, "failed to start relay");
            std::process::exit(livelog_server::START_FAILURE_EXIT_CODE);
        }
    };

    let _ = tokio::join!(handle.put_task, handle.get_task);
}
