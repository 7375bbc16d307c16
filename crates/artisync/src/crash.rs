use std::panic::PanicHookInfo;

use crate::logging::LogFiles;

/// Route panics through the log and into a crash report in the data dir,
/// then run the default hook.
pub fn install_panic_hook(files: &LogFiles) {
    let files = files.clone();
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |info| {
        let report = crash_report(info);
        log::error!("{report}");

        match files.write_crash_report(&report) {
            Ok(path) => eprintln!(
                "artisync crashed; details were written to {}",
                path.display()
            ),
            Err(error) => {
                eprintln!("artisync crashed; the crash report could not be saved: {error}");
            }
        }

        default_hook(info);
    }));
}

fn crash_report(info: &PanicHookInfo<'_>) -> String {
    let payload = info
        .payload()
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| info.payload().downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    let location = info
        .location()
        .map(|location| format!("{}:{}", location.file(), location.line()))
        .unwrap_or_else(|| "unknown location".to_string());

    format_report(&payload, &location, &chrono::Local::now().to_rfc3339())
}

fn format_report(payload: &str, location: &str, timestamp: &str) -> String {
    format!(
        "artisync {} panicked at {location}\ntime: {timestamp}\nmessage: {payload}\n",
        env!("CARGO_PKG_VERSION")
    )
}
