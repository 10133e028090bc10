use env_logger::{Builder, Env};
use log::error;

fn init_logger() {
    // Уровень берём из RUST_LOG, иначе дефолт: warn (вывод команд идёт в stdout).
    // Пример: RUST_LOG=debug ./imgfscmd list store.imgfs
    Builder::from_env(Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = imgfs::cli::run() {
        error!("{:?}", e);
        std::process::exit(1);
    }
}
