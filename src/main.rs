use std::panic;
use std::process;

use nimbus::cli::entrypoint::run;

/// Treat a broken stdout pipe as a clean exit instead of a panic, so
/// `nimbus ... | head` doesn't print a backtrace.
fn install_broken_pipe_handler() {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let payload = info.payload();
        let broken_pipe = payload
            .downcast_ref::<&str>()
            .is_some_and(|s| s.contains("Broken pipe"))
            || payload
                .downcast_ref::<String>()
                .is_some_and(|s| s.contains("Broken pipe"));

        if broken_pipe {
            process::exit(0);
        }
        default_hook(info);
    }));
}

fn main() {
    install_broken_pipe_handler();
    process::exit(run());
}
