fn main() {
    if let Err(err) = yellmode_lib::run() {
        eprintln!("yellmode: {err:#}");
        std::process::exit(1);
    }
}
