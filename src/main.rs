//! greatness-client binary entry point.

use std::process::ExitCode;
use std::sync::Arc;

use greatness_client::cli;
use greatness_client::config::Config;
use greatness_client::console::{self, Command};
use greatness_client::{logging, AnalyticsTracker, HttpTransport, LogSink, TransitionController};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("Try 'greatness-client --help' for more information.");
            return ExitCode::from(2);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }

    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init_with_level(config.log_filter()).ok();

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "client stopped");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let base_url = config.base_url()?;
    let transport = Arc::new(HttpTransport::with_timeout(
        base_url.as_str(),
        config.request_timeout(),
    )?);

    let analytics = if config.analytics.enabled {
        AnalyticsTracker::new(Some(Arc::new(LogSink)))
    } else {
        AnalyticsTracker::disabled()
    };

    let controller =
        TransitionController::new(transport, analytics).with_error_dismiss(config.error_dismiss());

    info!("greatness-client v{}", env!("CARGO_PKG_VERSION"));
    info!(server = %base_url, "connecting to engine");

    if let Err(e) = controller.health().await {
        warn!(error = %e, "engine health check failed");
    }

    if let Err(e) = controller.create_session().await {
        debug!(error = %e, "no session at startup");
    }
    print!("{}", console::render(&controller.view()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match Command::parse(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => execute(&controller, command).await,
                    Err(e) => eprintln!("{e}"),
                }
            }
        }
    }

    Ok(())
}

async fn execute(controller: &TransitionController, command: Command) {
    match command {
        Command::Transition { action, data } => {
            if let Err(e) = controller.submit(&action, data).await {
                debug!(action = %action, error = %e, "transition not applied");
            }
        }
        Command::SubmitInput(action) => {
            if let Err(e) = controller.submit_input(&action).await {
                debug!(action = %action, error = %e, "transition not applied");
            }
        }
        Command::Archetype(name) => {
            if let Err(e) = controller.select_archetype(&name).await {
                debug!(archetype = %name, error = %e, "archetype not applied");
            }
        }
        Command::NewSession => {
            if let Err(e) = controller.create_session().await {
                debug!(error = %e, "session not created");
            }
        }
        Command::Set { key, value } => {
            if let Err(e) = controller.set_input(key, value) {
                eprintln!("{e}");
            }
            return;
        }
        Command::ShowInput => {
            match controller.input() {
                Ok(input) => println!("{}", serde_json::Value::Object(input)),
                Err(e) => eprintln!("{e}"),
            }
            return;
        }
        Command::Cost => {
            match controller.cost_report().await {
                Ok(report) => print!("{}", console::render_cost(&report)),
                Err(e) => eprintln!("{e}"),
            }
            return;
        }
        Command::Timeline => {
            match controller.timeline().await {
                Ok(events) => print!("{}", console::render_timeline(&events)),
                Err(e) => eprintln!("{e}"),
            }
            return;
        }
        Command::Dismiss => {
            controller.dismiss_error();
        }
        Command::Help => {
            cli::print_help();
            return;
        }
        Command::Empty | Command::Quit => {}
    }

    print!("{}", console::render(&controller.view()));
}
