use ironstrap::hardware::SystemReport;
use ironstrap::orchestrator::{signal, InstallContext, StepRunner};
use ironstrap::prompt::TerminalPrompter;
use ironstrap::steps::default_steps;
use ironstrap::{logging, VERSION};

fn main() {
    // Logging first: everything after this line goes to stderr and the
    // session log file.
    if let Err(e) = logging::init(&logging::default_log_path()) {
        eprintln!("warning: session log unavailable: {}", e);
    }

    if let Err(e) = signal::install_handler() {
        log::warn!("{}", e);
    }

    println!("ironstrap {} - Arch Linux installation orchestrator", VERSION);
    println!("answers are read interactively; press ctrl-c to abort.\n");

    let report = SystemReport::detect();
    print!("{}", report.summary());
    println!();

    let mut ctx = InstallContext::new(report, Box::new(TerminalPrompter::new()));
    let runner = StepRunner::new(default_steps());

    match runner.run(&mut ctx) {
        Ok(()) => {
            log::info!("installation finished; the system is ready to reboot");
        }
        Err(e) => {
            log::error!("installation failed: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}
