use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use contracts::{Command, CommandPayload, CommandType, EngineConfig};
use engine_api::{serve, EngineApi};

fn print_usage() {
    println!("engine-cli <command>");
    println!("commands:");
    println!("  status");
    println!("  serve [addr]");
    println!("    default addr: 127.0.0.1:8080");
    println!("  advance <seconds> [sqlite_path]");
    println!("    offline catch-up: loads the default profile and advances the clock");
    println!("  simulate <profile_id> <seed> [seconds] [sqlite_path]");
    println!("    deterministic headless run: dispatches idle squads and persists to sqlite");
}

fn parse_socket_addr(value: Option<&String>) -> Result<SocketAddr, String> {
    let raw = value.map(String::as_str).unwrap_or("127.0.0.1:8080");
    raw.parse::<SocketAddr>()
        .map_err(|_| format!("invalid addr: {raw}"))
}

fn parse_seed(value: Option<&String>) -> Result<u64, String> {
    let raw = value.ok_or_else(|| "missing seed".to_string())?;
    raw.parse::<u64>()
        .map_err(|_| format!("invalid seed: {raw}"))
}

fn parse_seconds(value: Option<&String>, default_secs: f64) -> Result<f64, String> {
    let Some(raw) = value else {
        return Ok(default_secs);
    };
    let seconds = raw
        .parse::<f64>()
        .map_err(|_| format!("invalid seconds: {raw}"))?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(format!("seconds must be > 0, got {raw}"));
    }
    Ok(seconds)
}

fn default_sqlite_path() -> String {
    std::env::var("STELLAR_SQLITE_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "stellar_profiles.sqlite".to_string())
}

fn parse_sqlite_path(value: Option<&String>) -> String {
    value
        .map(String::to_string)
        .filter(|path| !path.trim().is_empty())
        .unwrap_or_else(default_sqlite_path)
}

fn format_duration(total_secs: f64) -> String {
    let total = total_secs.max(0.0).floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Pair every available squad with the first free mission, cheapest energy
/// first. One dispatch per pair; the engine enforces the rest.
fn dispatch_idle_squads(api: &mut EngineApi, issued: &mut u64) -> u64 {
    let pairs = {
        let state = api.state();
        let mut free_missions = state
            .missions
            .iter()
            .filter(|mission| !mission.is_active())
            .map(|mission| mission.id.clone());
        let free_squads = state
            .squads
            .iter()
            .filter(|squad| squad.is_available)
            .map(|squad| squad.id.clone())
            .collect::<Vec<_>>();
        let budget = state.player.energy.floor() as usize;

        free_squads
            .into_iter()
            .take(budget)
            .filter_map(|squad_id| free_missions.next().map(|mission_id| (mission_id, squad_id)))
            .collect::<Vec<_>>()
    };

    let profile_id = api.profile_id().to_string();
    let mut applied = 0;
    for (mission_id, squad_id) in pairs {
        *issued += 1;
        let command = Command::new(
            format!("cmd_sim_{issued:06}"),
            profile_id.clone(),
            CommandType::StartMission,
            CommandPayload::StartMission {
                mission_id,
                squad_id,
            },
        );
        match api.submit_command(command) {
            Ok(result) if result.applied => applied += 1,
            Ok(_) | Err(_) => {}
        }
    }
    applied
}

fn run_simulation(args: &[String]) -> Result<(), String> {
    let profile_id = args
        .get(2)
        .cloned()
        .ok_or_else(|| "missing profile_id".to_string())?;
    let seed = parse_seed(args.get(3))?;
    let total_secs = parse_seconds(args.get(4), 3_600.0)?;
    let sqlite_path = parse_sqlite_path(args.get(5));

    let mut config = EngineConfig::default();
    config.profile_id = profile_id.clone();
    config.seed = seed;

    let mut api = EngineApi::from_config(config);
    let resumed = api
        .attach_sqlite_store(PathBuf::from(&sqlite_path))
        .map_err(|err| format!("failed to attach sqlite store: {err}"))?;

    // Continue the command id sequence from earlier sessions, so a resumed
    // simulation never reuses an id the journal already holds.
    let mut issued = api
        .load_persisted_commands()
        .map_err(|err| format!("failed to read command journal: {err}"))?
        .len() as u64;

    let slice_secs: f64 = 60.0;
    let mut dispatched = 0_u64;
    let mut completed = 0_u64;
    let mut remaining = total_secs;
    while remaining > 0.0 {
        dispatched += dispatch_idle_squads(&mut api, &mut issued);
        let step = slice_secs.min(remaining);
        let metrics = api.advance(step);
        completed += metrics.completed_missions;
        remaining -= step;
    }

    api.flush_persistence_checked()
        .map_err(|err| format!("failed to flush save slot: {err}"))?;
    let journal = api
        .load_persisted_commands()
        .map_err(|err| format!("failed to read command journal: {err}"))?;

    let status = api.status();
    println!(
        "simulated profile_id={} seed={} resumed={} duration={} dispatched={} completed={} journal={} sqlite={}",
        profile_id,
        seed,
        resumed,
        format_duration(total_secs),
        dispatched,
        completed,
        journal.len(),
        sqlite_path
    );
    println!("{status}");
    Ok(())
}

fn run_advance(args: &[String]) -> Result<(), String> {
    let seconds = parse_seconds(args.get(2), 0.0)?;
    if seconds <= 0.0 {
        return Err("missing seconds".to_string());
    }
    let sqlite_path = parse_sqlite_path(args.get(3));

    let mut api = EngineApi::from_config(EngineConfig::default());
    api.attach_sqlite_store(PathBuf::from(&sqlite_path))
        .map_err(|err| format!("failed to attach sqlite store: {err}"))?;

    let metrics = api.advance(seconds);
    api.flush_persistence_checked()
        .map_err(|err| format!("failed to flush save slot: {err}"))?;

    println!(
        "advanced {} completed={} energy_regenerated={:.3}",
        format_duration(metrics.advanced_secs),
        metrics.completed_missions,
        metrics.energy_regenerated
    );
    println!("{}", api.status());
    Ok(())
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str);

    match command {
        Some("status") => {
            let api = EngineApi::from_config(EngineConfig::default());
            println!("{}", api.status());
        }
        Some("serve") => match parse_socket_addr(args.get(2)) {
            Ok(addr) => {
                println!("serving api on http://{addr}");
                if let Err(err) = serve(addr).await {
                    eprintln!("server error: {err}");
                    std::process::exit(1);
                }
            }
            Err(err) => {
                eprintln!("error: {}", err);
                print_usage();
                std::process::exit(2);
            }
        },
        Some("advance") => {
            if let Err(err) = run_advance(&args) {
                eprintln!("error: {err}");
                print_usage();
                std::process::exit(2);
            }
        }
        Some("simulate") => {
            if let Err(err) = run_simulation(&args) {
                eprintln!("error: {err}");
                print_usage();
                std::process::exit(2);
            }
        }
        _ => {
            print_usage();
        }
    }
}
