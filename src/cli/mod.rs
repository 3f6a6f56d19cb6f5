use crate::{
    config::PlannerConfig, fetch_record, FilePlanStore, ItineraryPlan, ItineraryPlanner,
    PlanSource, PlanStore, StoreKey, TripDraft, TripRequest,
};
use anyhow::{bail, Context};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{fmt::Write as _, path::PathBuf, sync::Arc, time::Duration};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// CLI entry point for the trip-planner tool
pub async fn run() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let matches = command().get_matches();
    let mut config = PlannerConfig::from_env()?;
    apply_overrides(&mut config, &matches)?;

    let store = Arc::new(FilePlanStore::new(config.store_dir.clone()));
    info!("Store directory: {}", config.store_dir.display());

    match matches.subcommand() {
        Some(("plan", sub)) => plan(&config, store, sub).await,
        Some(("show", sub)) => show(store, sub).await,
        Some(("forget", sub)) => forget(store, sub).await,
        _ => bail!("a subcommand is required; see --help"),
    }
}

fn command() -> Command {
    let owner = Arg::new("owner")
        .long("owner")
        .value_name("OWNER_ID")
        .help("Owner (user) id the trip belongs to")
        .required(true);
    let trip = Arg::new("trip")
        .long("trip")
        .value_name("TRIP_ID")
        .help("Trip id")
        .required(true);
    let json = Arg::new("json")
        .long("json")
        .help("Print JSON instead of a readable itinerary")
        .action(ArgAction::SetTrue);

    Command::new("trip-planner")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generate and cache day-by-day trip itineraries with Gemini")
        .subcommand_required(true)
        .arg(
            Arg::new("store-dir")
                .long("store-dir")
                .value_name("DIR")
                .global(true)
                .help("Directory holding stored plans (or set TRIP_PLANNER_STORE_DIR)"),
        )
        .subcommand(
            Command::new("plan")
                .about("Return the stored plan for an unchanged trip, or generate a new one")
                .arg(owner.clone())
                .arg(trip.clone())
                .arg(Arg::new("destination").long("destination").short('d').required(true))
                .arg(Arg::new("budget").long("budget").short('b').required(true))
                .arg(
                    Arg::new("start")
                        .long("start")
                        .value_name("YYYY-MM-DD")
                        .required(true),
                )
                .arg(
                    Arg::new("end")
                        .long("end")
                        .value_name("YYYY-MM-DD")
                        .required(true),
                )
                .arg(
                    Arg::new("travelers")
                        .long("travelers")
                        .short('p')
                        .default_value("1"),
                )
                .arg(
                    Arg::new("mode")
                        .long("mode")
                        .short('m')
                        .value_name("MODE")
                        .help("Preferred transport mode; repeat for several")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("refresh")
                        .long("refresh")
                        .help("Regenerate even if the stored plan is still valid")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("model")
                        .long("model")
                        .value_name("MODEL")
                        .help("Gemini model (or set GEMINI_MODEL)"),
                )
                .arg(
                    Arg::new("api-key")
                        .short('k')
                        .long("api-key")
                        .value_name("KEY")
                        .help("Gemini API key (or set GEMINI_API_KEY)"),
                )
                .arg(
                    Arg::new("timeout")
                        .short('t')
                        .long("timeout")
                        .value_name("SECONDS")
                        .help("Request timeout in seconds (or set TRIP_PLANNER_TIMEOUT_SECS)"),
                )
                .arg(
                    Arg::new("temperature")
                        .long("temperature")
                        .value_name("T")
                        .help("Sampling temperature (or set GEMINI_TEMPERATURE)"),
                )
                .arg(
                    Arg::new("json-response")
                        .long("json-response")
                        .action(ArgAction::SetTrue)
                        .help("Ask Gemini for an application/json body (or set GEMINI_JSON_RESPONSE)"),
                )
                .arg(json.clone()),
        )
        .subcommand(
            Command::new("show")
                .about("Print the stored plan without generating")
                .arg(owner.clone())
                .arg(trip.clone())
                .arg(json),
        )
        .subcommand(
            Command::new("forget")
                .about("Delete the stored plan, e.g. after the trip was deleted")
                .arg(owner)
                .arg(trip),
        )
}

fn apply_overrides(config: &mut PlannerConfig, matches: &ArgMatches) -> anyhow::Result<()> {
    let store_dir = matches.get_one::<String>("store-dir").or_else(|| {
        matches
            .subcommand()
            .and_then(|(_, sub)| sub.get_one::<String>("store-dir"))
    });
    if let Some(dir) = store_dir {
        config.store_dir = PathBuf::from(dir);
    }

    if let Some(("plan", sub)) = matches.subcommand() {
        if let Some(model) = sub.get_one::<String>("model") {
            config.model = model.clone();
        }
        if let Some(api_key) = sub.get_one::<String>("api-key") {
            config.api_key = Some(api_key.clone());
        }
        if let Some(timeout) = sub.get_one::<String>("timeout") {
            let seconds: u64 = timeout
                .parse()
                .with_context(|| format!("--timeout expects whole seconds, got `{timeout}`"))?;
            config.timeout = Some(Duration::from_secs(seconds));
        }
        if let Some(temperature) = sub.get_one::<String>("temperature") {
            let temperature: f32 = temperature
                .parse()
                .with_context(|| format!("--temperature expects a number, got `{temperature}`"))?;
            config.temperature = Some(temperature);
        }
        if sub.get_flag("json-response") {
            config.json_response = true;
        }
    }

    Ok(())
}

fn required_arg<'a>(matches: &'a ArgMatches, name: &str) -> &'a str {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .unwrap_or_default()
}

fn trip_request(matches: &ArgMatches) -> anyhow::Result<TripRequest> {
    let modes: Vec<String> = matches
        .get_many::<String>("mode")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let draft = TripDraft {
        trip_id: Some(required_arg(matches, "trip").to_string()),
        owner_id: Some(required_arg(matches, "owner").to_string()),
        destination: Some(required_arg(matches, "destination").to_string()),
        budget: Some(required_arg(matches, "budget").into()),
        transport_modes: Some(crate::types::TransportModesInput::Sequence(modes)),
        start_date: Some(required_arg(matches, "start").to_string()),
        end_date: Some(required_arg(matches, "end").to_string()),
        traveler_count: Some(required_arg(matches, "travelers").into()),
    };

    Ok(TripRequest::try_from(draft)?)
}

async fn plan(
    config: &PlannerConfig,
    store: Arc<FilePlanStore>,
    matches: &ArgMatches,
) -> anyhow::Result<()> {
    let request = trip_request(matches)?;
    let planner = ItineraryPlanner::new(store, Arc::new(config.gemini_client()?));

    info!("Using model: {}", config.model);
    let outcome = if matches.get_flag("refresh") {
        planner.regenerate_plan(&request).await
    } else {
        planner.resolve(&request).await
    };

    let resolution = match outcome {
        Ok(resolution) => resolution,
        Err(err) => {
            error!("Planning failed: {}", err);
            if let Some(raw) = err.raw_response() {
                error!("Generator text was:\n{}", raw);
            }
            return Err(err.into());
        }
    };

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&resolution.plan)?);
    } else {
        let source = match resolution.source {
            PlanSource::Cached => "stored",
            PlanSource::Generated => "newly generated",
        };
        println!(
            "Trip plan for {} ({}, created {})\n",
            request.destination,
            source,
            resolution.created_at.format("%Y-%m-%d %H:%M UTC")
        );
        print!("{}", render_plan(&resolution.plan));
    }

    Ok(())
}

async fn show(store: Arc<FilePlanStore>, matches: &ArgMatches) -> anyhow::Result<()> {
    let record = fetch_record(
        &*store,
        required_arg(matches, "owner"),
        required_arg(matches, "trip"),
    )
    .await?;

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!(
            "Trip plan for {} (created {})\n",
            record.source_request.destination,
            record.created_at.format("%Y-%m-%d %H:%M UTC")
        );
        print!("{}", render_plan(&record.plan));
    }
    Ok(())
}

async fn forget(store: Arc<FilePlanStore>, matches: &ArgMatches) -> anyhow::Result<()> {
    let key = StoreKey::new(
        required_arg(matches, "owner"),
        required_arg(matches, "trip"),
    );
    if store.delete(&key).await? {
        println!("Deleted plan {}", key);
    } else {
        println!("No plan stored at {}", key);
    }
    Ok(())
}

/// Readable itinerary, one block per day.
pub fn render_plan(plan: &ItineraryPlan) -> String {
    let mut out = String::new();
    for day in &plan.days {
        let _ = writeln!(out, "Day {} - {}", day.day, day.date);
        for activity in &day.activities {
            let _ = writeln!(
                out,
                "  {:>8}  {} ({})",
                activity.time, activity.description, activity.distance_from_previous
            );
        }
        out.push('\n');
    }
    out
}
