use anyhow::Result;
use env_logger::{Builder, Env};

mod cli;
mod util;
mod cmd_set;
mod cmd_get;
mod cmd_items;
mod cmd_del;
mod cmd_keys;
mod cmd_dump;
mod cmd_clear;
mod cmd_status;

fn init_logger() {
    // Уровень берём из RUST_LOG, иначе дефолт - info.
    // Пример: RUST_LOG=debug ./stagedb ...
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    use clap::Parser;
    let cli = cli::Cli::parse();
    match cli.cmd {
        cli::Cmd::Set { root, table, key, item } =>
            cmd_set::exec(root, table, key, item),

        cli::Cmd::SetItems { root, table, key, items } =>
            cmd_items::exec_set(root, table, key, items),

        cli::Cmd::Get { root, table, key, fresh, json } =>
            cmd_get::exec(root, table, key, fresh, json),

        cli::Cmd::GetItems { root, table, key, json } =>
            cmd_items::exec_get(root, table, key, json),

        cli::Cmd::Del { root, table, key, items } =>
            cmd_del::exec(root, table, key, items),

        cli::Cmd::Keys { root, table, json } =>
            cmd_keys::exec(root, table, json),

        cli::Cmd::Dump { root, table, json } =>
            cmd_dump::exec(root, table, json),

        cli::Cmd::Clear { root, table } =>
            cmd_clear::exec(root, table),

        // Status supports --json flag
        cli::Cmd::Status { root, table, json } =>
            cmd_status::exec(root, table, json),
    }
}
