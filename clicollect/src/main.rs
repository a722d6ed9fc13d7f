//! Run a list of CLI commands on a device and save the transcript.
//!
//! ```bash
//! clicollect --host 192.168.1.99 -u admin -p secret -c cli-commands.txt -o output-file.txt
//! ```
//!
//! The password may also come from `CLICOLLECT_PASSWORD`. Without a password
//! or key, it is prompted for on the terminal. Set `RUST_LOG` or pass
//! `-v`/`-vv` for more detailed logging.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use dialoguer::Password;
use log::{error, info};

use clicollect::error::ConfigError;
use clicollect::{
    ConnectBuilder, HostKeyVerification, JsonFileSink, SessionConfig, SessionRunner,
    SshTransport, TextFileSink, TranscriptSink,
};

#[derive(Parser, Debug)]
#[command(
    name = "clicollect",
    about = "Collect CLI command output from a network device over SSH",
    version
)]
struct Args {
    /// Device hostname or IP address
    #[arg(long)]
    host: String,

    /// SSH port
    #[arg(long, default_value_t = 22)]
    port: u16,

    /// Login username
    #[arg(short, long)]
    username: String,

    /// Login password
    #[arg(short, long, env = "CLICOLLECT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Private key file, used when no password is given
    #[arg(short, long)]
    key: Option<PathBuf>,

    /// Passphrase for an encrypted private key
    #[arg(long, env = "CLICOLLECT_KEY_PASSPHRASE", hide_env_values = true)]
    key_passphrase: Option<String>,

    /// File with one command per line
    #[arg(short, long, default_value = "cli-commands.txt")]
    commands: PathBuf,

    /// Transcript destination
    #[arg(short, long, default_value = "output-file.txt")]
    output: PathBuf,

    /// Transcript format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Longest wait for one poll of the connection, in seconds
    #[arg(long, value_parser = parse_seconds)]
    read_timeout: Option<Duration>,

    /// Silence after which a command is treated as finished, in seconds
    #[arg(long, value_parser = parse_seconds)]
    idle_exit: Option<Duration>,

    /// Ceiling for one read of command output, in seconds
    #[arg(long, value_parser = parse_seconds)]
    max_wait: Option<Duration>,

    /// Hard ceiling for a single command, in seconds
    #[arg(long, value_parser = parse_seconds)]
    max_command_time: Option<Duration>,

    /// Remove pager prompts such as --More-- from the output
    #[arg(long)]
    strip_pager_prompts: bool,

    /// Keep ANSI escape sequences in the output
    #[arg(long)]
    keep_ansi: bool,

    /// Host key checking against known_hosts
    #[arg(long, value_enum, default_value_t = HostKeyCheck::AcceptNew)]
    host_key_check: HostKeyCheck,

    /// known_hosts file to use instead of ~/.ssh/known_hosts
    #[arg(long)]
    known_hosts: Option<PathBuf>,

    /// Connection and login timeout, in seconds
    #[arg(long, value_parser = parse_seconds, default_value = "10")]
    connect_timeout: Duration,

    /// Interval between SSH keepalives, in seconds
    #[arg(long, value_parser = parse_seconds, default_value = "30")]
    keepalive: Duration,

    /// Terminal width requested for the shell
    #[arg(long, default_value_t = 511)]
    terminal_width: u32,

    /// Terminal height requested for the shell; this is what makes the
    /// device paginate
    #[arg(long, default_value_t = 24)]
    terminal_height: u32,

    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum HostKeyCheck {
    Strict,
    AcceptNew,
    Off,
}

impl From<HostKeyCheck> for HostKeyVerification {
    fn from(check: HostKeyCheck) -> Self {
        match check {
            HostKeyCheck::Strict => HostKeyVerification::Strict,
            HostKeyCheck::AcceptNew => HostKeyVerification::AcceptNew,
            HostKeyCheck::Off => HostKeyVerification::Disabled,
        }
    }
}

fn parse_seconds(value: &str) -> Result<Duration, String> {
    let secs: f64 = value.parse().map_err(|e| format!("{e}"))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("{e}"))
}

impl Args {
    fn session_config(&self) -> SessionConfig {
        let mut config = SessionConfig::default()
            .with_strip_pager_prompts(self.strip_pager_prompts)
            .with_strip_ansi(!self.keep_ansi);
        if let Some(timeout) = self.read_timeout {
            config = config.with_read_timeout(timeout);
        }
        if let Some(idle) = self.idle_exit {
            config = config.with_idle_exit_after(idle);
        }
        if let Some(max_wait) = self.max_wait {
            config = config.with_max_wait_per_read(max_wait);
        }
        if let Some(max) = self.max_command_time {
            config = config.with_max_command_time(max);
        }
        config
    }

    fn connect_builder(&self, password: Option<String>) -> ConnectBuilder {
        let mut builder = ConnectBuilder::new(&self.host)
            .port(self.port)
            .username(&self.username)
            .timeout(self.connect_timeout)
            .keepalive_interval(self.keepalive)
            .terminal_size(self.terminal_width, self.terminal_height)
            .host_key_verification(self.host_key_check.into());
        if let Some(path) = &self.known_hosts {
            builder = builder.known_hosts_path(path);
        }

        match (password, &self.key, &self.key_passphrase) {
            (Some(password), _, _) => builder.password(password),
            (None, Some(key), Some(passphrase)) => builder.private_key_with_passphrase(key, passphrase),
            (None, Some(key), None) => builder.private_key(key),
            (None, None, _) => builder,
        }
    }

    /// The password from the command line or environment, or prompted for
    /// when neither a password nor a key was given.
    fn password(&self) -> clicollect::Result<Option<String>> {
        if self.password.is_some() || self.key.is_some() || !std::io::stdin().is_terminal() {
            return Ok(self.password.clone());
        }
        let password = Password::new()
            .with_prompt(format!("Password for {}@{}", self.username, self.host))
            .interact()
            .map_err(|e| ConfigError::InvalidConfig {
                message: format!("failed to read password: {e}"),
            })?;
        Ok(Some(password))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(args).await {
        Ok(failures) => {
            if failures > 0 {
                info!("{} command(s) did not end at a prompt", failures);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(args: Args) -> clicollect::Result<usize> {
    // Fail on a bad command file before touching the network
    let commands = clicollect::commands::load(&args.commands)?;
    let ssh = args.connect_builder(args.password()?).build()?;
    let runner = SessionRunner::new(args.session_config())?.with_target(ssh.target());

    info!("connecting to {}", ssh.target());
    let transport = SshTransport::connect(ssh).await?;

    let mut sink: Box<dyn TranscriptSink> = match args.format {
        Format::Text => Box::new(TextFileSink::new(&args.output)),
        Format::Json => Box::new(JsonFileSink::new(&args.output)),
    };
    let transcript = runner.run(transport, &commands, sink.as_mut()).await?;

    println!(
        "Collected {} command(s) from {}; transcript written to {}",
        transcript.results.len(),
        args.host,
        args.output.display()
    );
    Ok(transcript.failures())
}
