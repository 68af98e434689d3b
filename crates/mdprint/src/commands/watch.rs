//! Watch mode: convert, then reconvert on every change until Ctrl-C.

use std::path::Path;
use std::time::Duration;

use mdprint_pipeline::Converter;
use mdprint_storage::{WatchHandle, WatchState, Watcher, run_watch_loop};

use crate::commands::convert::{self, ConvertOptions};
use crate::error::CliError;
use crate::output::Output;

/// Watch `path` (a Markdown file or a directory).
///
/// Everything stale is converted first; changes seen afterwards always
/// reconvert.
pub(crate) fn run(
    converter: &Converter,
    path: &Path,
    debounce: Duration,
    options: &ConvertOptions,
    output: &Output,
) -> Result<(), CliError> {
    convert::run(converter, path, options, output)?;

    let watcher = Watcher::new(path)
        .debounce(debounce)
        .recursive(options.recursive);
    let root = watcher.canonical_root()?;
    let mut state = WatchState::with_scanner(options.scanner());
    state.track(&root)?;

    let (events, handle) = watcher.start()?;
    output.highlight(
        "Watching",
        &format!("{} for changes (Ctrl-C to stop)", root.display()),
    );
    std::thread::spawn(move || stop_on_ctrl_c(handle));

    run_watch_loop(&events, &mut state, |event| {
        output.highlight("Changed", &format!("{} ({})", event.path.display(), event.kind));
        let outcome = converter.convert(&event.path, true);
        convert::report_outcome(&event.path, &outcome, options, output);
    });

    output.info("Stopped watching");
    Ok(())
}

/// Drop `handle` on Ctrl-C, which ends the watch loop.
fn stop_on_ctrl_c(handle: WatchHandle) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build();
    let signal = match runtime {
        Ok(runtime) => runtime.block_on(tokio::signal::ctrl_c()),
        Err(e) => Err(e),
    };

    if let Err(e) = signal {
        // The default SIGINT behavior still terminates the process.
        tracing::warn!(error = %e, "Cannot install Ctrl+C handler");
        loop {
            std::thread::park();
        }
    }
    tracing::info!("Shutdown signal received, stopping watch...");
    drop(handle);
}
