//! Enrol CLI - binary entry point.
//!
//! Each subcommand drives one resolver operation and prints the result as
//! JSON on stdout. Logs go to stderr so the output stays machine-readable.
//!
//! ```text
//! main() -> load config -> Resolver::from_config() -> command -> JSON
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use enrol_config::EnrolConfig;
use enrol_core::{LevelState, ResolutionState, Resolver};
use enrol_types::{DegreeLevel, OVERRIDE_MARKER, Phase, PinCode, PostalLocation};

/// Resolve locations and institutions for enrolment forms.
#[derive(Parser, Debug)]
#[command(name = "enrol")]
#[command(about = "Resolve states, cities and institutions from layered directories")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $ENROL_CONFIG or ~/.enrol/config.toml)
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List states
    States,
    /// List cities of a state
    Cities {
        /// State name
        state: String,
    },
    /// List institutions for a state, city and degree
    Institutions {
        #[arg(long)]
        state: String,
        /// Empty means the whole state
        #[arg(long, default_value = "")]
        city: String,
        /// UG or PG
        #[arg(long, default_value = "UG")]
        level: String,
        #[arg(long, default_value = "")]
        degree: String,
    },
    /// Resolve a PIN code to a state and city
    Pincode {
        /// Six-digit PIN code
        code: String,
    },
    /// List degree names for a level
    Degrees {
        /// UG or PG
        #[arg(long, default_value = "UG")]
        level: String,
    },
    /// List graduation years, newest first
    Years,
    /// Fill a whole form and print the reconciled submission
    Walk {
        /// PIN code used to prefill state and city
        #[arg(long)]
        pin: Option<String>,
        #[arg(long)]
        state: Option<String>,
        /// A city not offered is entered as free text
        #[arg(long)]
        city: Option<String>,
        /// UG or PG
        #[arg(long, default_value = "UG")]
        level: String,
        #[arg(long, default_value = "")]
        degree: String,
        #[arg(long)]
        year: Option<i32>,
        /// An institution not offered is entered as free text
        #[arg(long)]
        institution: Option<String>,
    },
}

/// One level as printed.
#[derive(Debug, Serialize)]
struct LevelReport<'a> {
    phase: Phase,
    selected: Option<&'a str>,
    override_visible: bool,
    candidates: Vec<&'a str>,
}

impl<'a> From<&'a LevelState> for LevelReport<'a> {
    fn from(level: &'a LevelState) -> Self {
        Self {
            phase: level.phase(),
            selected: level.selected(),
            override_visible: level.override_visible(),
            candidates: level.candidates().values(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PostalReport<'a> {
    location: &'a PostalLocation,
    state: LevelReport<'a>,
    cities: LevelReport<'a>,
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<EnrolConfig> {
    if let Some(path) = path {
        return EnrolConfig::load_from(path)
            .with_context(|| format!("loading config from {}", path.display()));
    }
    match EnrolConfig::load() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => {
            tracing::debug!("No config file found, using defaults");
            Ok(EnrolConfig::default())
        }
        Err(e) => Err(e).context("loading config"),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_ref())?;
    let resolver = Resolver::from_config(&config).context("configuring sources")?;

    run(&resolver, cli.command).await
}

async fn run(resolver: &Resolver, command: Command) -> Result<()> {
    let mut form = ResolutionState::new();
    match command {
        Command::States => {
            let _ = resolver.load_states(&mut form).await;
            print_json(&LevelReport::from(form.states()))
        }
        Command::Cities { state } => {
            let _ = resolver.load_states(&mut form).await;
            enter_state(&mut form, &state)?;
            let _ = resolver.load_cities(&mut form).await;
            print_json(&LevelReport::from(form.cities()))
        }
        Command::Institutions {
            state,
            city,
            level,
            degree,
        } => {
            enter_state(&mut form, &state)?;
            if !city.trim().is_empty() {
                let _ = resolver.load_cities(&mut form).await;
                form.choose_city(&city);
            }
            let row = form.add_row(DegreeLevel::parse(&level), &degree);
            let _ = resolver.load_institutions(&mut form, row).await;
            let institutions = form
                .row(row)
                .map(|r| LevelReport::from(r.institution()))
                .context("row vanished")?;
            print_json(&institutions)
        }
        Command::Pincode { code } => {
            PinCode::parse(&code).with_context(|| format!("invalid PIN code {code:?}"))?;
            let Some(location) = resolver.autofill_from_postal(&mut form, &code).await else {
                bail!("no location found for PIN code {code}");
            };
            print_json(&PostalReport {
                location: &location,
                state: form.states().into(),
                cities: form.cities().into(),
            })
        }
        Command::Degrees { level } => {
            let degrees = resolver.load_degrees(DegreeLevel::parse(&level)).await;
            print_json(&degrees)
        }
        Command::Years => print_json(&resolver.load_years().await),
        Command::Walk {
            pin,
            state,
            city,
            level,
            degree,
            year,
            institution,
        } => {
            let _ = resolver.load_states(&mut form).await;
            if let Some(pin) = pin.as_deref()
                && resolver.autofill_from_postal(&mut form, pin).await.is_none()
            {
                tracing::warn!(pin, "PIN code did not resolve");
            }
            if let Some(state) = state.as_deref() {
                enter_state(&mut form, state)?;
                let _ = resolver.load_cities(&mut form).await;
            }
            if let Some(city) = city.as_deref()
                && !form.choose_city(city)
            {
                tracing::warn!(city, "City could not be entered");
            }

            let row = form.add_row(DegreeLevel::parse(&level), &degree);
            form.set_year(row, year);
            let _ = resolver.load_institutions(&mut form, row).await;
            pick_institution(&mut form, row, institution.as_deref());

            print_json(&form.submission())
        }
    }
}

fn enter_state(form: &mut ResolutionState, state: &str) -> Result<()> {
    if !form.choose_state(state) {
        bail!("state must not be empty");
    }
    Ok(())
}

/// Selects `wanted` if offered, otherwise enters it as free text. Without a
/// wanted name the first genuine candidate is taken.
fn pick_institution(form: &mut ResolutionState, row: usize, wanted: Option<&str>) {
    match wanted.map(str::trim).filter(|w| !w.is_empty()) {
        Some(name) => {
            if !form.select_institution(row, name)
                && form.select_institution(row, OVERRIDE_MARKER)
            {
                form.set_institution_override(row, name);
            }
        }
        None => {
            let first = form
                .row(row)
                .and_then(|r| r.institution().candidates().genuine().next())
                .map(|c| c.value.clone());
            if let Some(first) = first {
                form.select_institution(row, &first);
            }
        }
    }
}
