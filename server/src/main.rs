use crate::config::Config;
use std::fmt::Display;

fn main() {
    let config =
        Config::from_file().unwrap_or_else(|err| exit_on("Config", &err, err.additional_info()));

    logging::setup(&config)
        .unwrap_or_else(|err| exit_on("Logger", &err, err.additional_info()));

    if let Err(err) = crate::core::start(config) {
        match err.additional_info() {
            Some(info) => log::error!("{} {}", err, info),
            None => log::error!("{}", err),
        }
        std::process::exit(1);
    }
}

// The logger may not exist yet, so startup failures go to stdout.
fn exit_on(stage: &str, err: &impl Display, additional_info: Option<String>) -> ! {
    match additional_info {
        Some(info) => println!("{stage} initialization failed. Error: {err} Additional info: {info}"),
        None => println!("{stage} initialization failed. Error: {err}"),
    }
    std::process::exit(1);
}

mod bus;
mod config;
mod core;
mod decoder;
mod frame;
mod http;
mod logging;
mod store;
mod worker;
