// Haseq Interactive Simulator
// Feeds typed key names through the matcher and dispatches completed
// sequences through a configurable mock transport

use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use parking_lot::Mutex;

use haseq_core::{
    ActionDispatcher, ActionSpec, Config, KeyCode, MatchOutcome, SequenceMatcher,
    Transport,
};

/// Key sequence remote control simulator
#[derive(Parser, Debug)]
#[command(name = "haseq")]
#[command(about = "Key sequence remote control simulator", long_about = None)]
struct Args {
    /// JSON configuration file (default: ~/.config/haseq/config.json)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Validate config and exit
    #[arg(long)]
    check_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Mock transport latency in milliseconds
    #[arg(long, default_value_t = 100, value_name = "MS")]
    send_delay_ms: u64,

    /// Fail every Nth mock delivery (0 disables failures)
    #[arg(long, default_value_t = 0, value_name = "N")]
    fail_every: usize,
}

/// Last observed delivery state, shown by the `status` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeliveryStatus {
    Ready,
    Sending,
    Sent,
    Failed,
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryStatus::Ready => write!(f, "Ready"),
            DeliveryStatus::Sending => write!(f, "Sending..."),
            DeliveryStatus::Sent => write!(f, "Action Sent"),
            DeliveryStatus::Failed => write!(f, "Action Failed"),
        }
    }
}

/// Stand-in for the real outbound HTTP capability: sleeps for the
/// configured latency and optionally fails every Nth call.
struct MockTransport {
    delay: Duration,
    fail_every: usize,
    sent: AtomicUsize,
}

impl MockTransport {
    fn new(delay: Duration, fail_every: usize) -> Self {
        Self {
            delay,
            fail_every,
            sent: AtomicUsize::new(0),
        }
    }
}

impl Transport for MockTransport {
    fn send(&self, action: &ActionSpec) -> bool {
        let n = self.sent.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!("mock transport sending #{n}: {action}");
        thread::sleep(self.delay);
        let success = self.fail_every == 0 || n % self.fail_every != 0;
        log::debug!(
            "mock transport #{n} resolved: {}",
            if success { "success" } else { "failure" }
        );
        success
    }
}

/// Main application state
struct Application {
    config: Config,
    args: Args,
}

impl Application {
    fn new(args: Args) -> Result<Self, Box<dyn std::error::Error>> {
        let config = match &args.config {
            Some(path) => Config::from_file(path)?,
            None => Config::load_default()?,
        };
        Ok(Self { config, args })
    }

    /// Validate the configuration, reporting every error and warning found.
    fn check(&self) -> Result<(), Box<dyn std::error::Error>> {
        let report = self.config.validate();
        for warning in &report.warnings {
            println!("warning: {warning}");
        }
        if report.is_ok() {
            println!(
                "Configuration is valid ({} sequence(s))",
                self.config.sequences.len()
            );
            Ok(())
        } else {
            for error in &report.errors {
                eprintln!("error: {error}");
            }
            Err(format!("configuration invalid: {} error(s)", report.errors.len()).into())
        }
    }

    fn print_sequences(&self) {
        println!("Available key sequences:");
        for (i, def) in self.config.sequences.iter().enumerate() {
            println!(
                "  {}. {}: {} ({} ms) -> {}",
                i + 1,
                def.id,
                def.key_chain(),
                def.timeout_ms,
                def.action
            );
        }
    }

    /// Run the interactive loop: key names on stdin drive the matcher, and
    /// completed sequences go to the dispatcher.
    fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let report = self.config.validate();
        for warning in &report.warnings {
            println!("warning: {warning}");
        }
        if !report.is_ok() {
            for error in &report.errors {
                eprintln!("error: {error}");
            }
            return Err(
                format!("configuration invalid: {} error(s)", report.errors.len()).into(),
            );
        }

        self.print_sequences();
        println!();
        println!(
            "Keys: {}. Commands: 'sequences', 'status', 'quit'.",
            KeyCode::ALL.map(|k| k.name()).join(", ")
        );

        let mut matcher = SequenceMatcher::new(self.config.sequences.clone());
        let status = Arc::new(Mutex::new(DeliveryStatus::Ready));
        let transport = MockTransport::new(
            Duration::from_millis(self.args.send_delay_ms),
            self.args.fail_every,
        );
        let dispatcher = ActionDispatcher::new(transport);

        let stdin = io::stdin();
        loop {
            print!("key> ");
            io::stdout().flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                break;
            }

            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            match input.to_ascii_lowercase().as_str() {
                "quit" | "q" | "exit" => break,
                "sequences" => {
                    self.print_sequences();
                    continue;
                }
                "status" => {
                    let buffer = matcher
                        .buffer()
                        .iter()
                        .map(|k| k.name())
                        .collect::<Vec<_>>()
                        .join("-");
                    println!(
                        "status: {} | buffer: [{}] | queued: {}",
                        *status.lock(),
                        buffer,
                        dispatcher.pending()
                    );
                    continue;
                }
                _ => {}
            }

            for token in input.split_whitespace() {
                let key: KeyCode = match token.parse() {
                    Ok(key) => key,
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                };

                match matcher.handle_key(key, Instant::now()) {
                    MatchOutcome::Completed(def) => {
                        println!("sequence completed: {} -> {}", def.id, def.action);
                        *status.lock() = DeliveryStatus::Sending;
                        let status = Arc::clone(&status);
                        let id = def.id.clone();
                        dispatcher.submit(def.action, move |success| {
                            let outcome = if success {
                                DeliveryStatus::Sent
                            } else {
                                DeliveryStatus::Failed
                            };
                            *status.lock() = outcome;
                            log::info!("'{id}' completed: {outcome}");
                        });
                    }
                    MatchOutcome::Partial(ids) => {
                        let buffer = matcher
                            .buffer()
                            .iter()
                            .map(|k| k.name())
                            .collect::<Vec<_>>()
                            .join("-");
                        println!("partial sequence: {buffer} (candidates: {})", ids.join(", "));
                    }
                    MatchOutcome::NoMatch => {
                        println!("no matching sequence, resetting");
                    }
                }
            }
        }

        // Dropping the dispatcher drains any queued deliveries first.
        println!("simulator stopped");
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if args.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    let app = Application::new(args)?;
    if app.args.check_config {
        return app.check();
    }
    app.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["haseq", "--config", "/tmp/test.json"]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/test.json")));
        assert!(!args.check_config);
        assert!(!args.verbose);
        assert_eq!(args.send_delay_ms, 100);
        assert_eq!(args.fail_every, 0);
    }

    #[test]
    fn test_args_with_options() {
        let args = Args::parse_from([
            "haseq",
            "--config",
            "/tmp/test.json",
            "--verbose",
            "--check-config",
            "--send-delay-ms",
            "250",
            "--fail-every",
            "4",
        ]);
        assert!(args.verbose);
        assert!(args.check_config);
        assert_eq!(args.send_delay_ms, 250);
        assert_eq!(args.fail_every, 4);
    }

    #[test]
    fn test_mock_transport_failure_cadence() {
        let transport = MockTransport::new(Duration::ZERO, 3);
        let action = ActionSpec::new("light.toggle", "light.hall");
        let results: Vec<bool> = (0..6).map(|_| transport.send(&action)).collect();
        assert_eq!(results, vec![true, true, false, true, true, false]);
    }
}
