mod steps;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;

use wheelwatch_core::analysis::{self, DueCounter, Follower, NumberCount};
use wheelwatch_core::{Pattern, Spin, SpinStats, SpinStream, StakingSystem, WheelwatchConfig};
use wheelwatch_engine::{
    BankrollSimulator, MonteCarloSummary, ParallelRunner, SimulationParams, SimulationResult,
    SpinGenerator,
};
use wheelwatch_strategy::{JsonFileStore, Session, StrategyRecord};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser, Debug)]
#[command(name = "wheelwatch", about = "Roulette pattern tracker and bankroll simulator")]
struct Cli {
    /// Path to TOML config file(s), comma-separated for merge
    #[arg(long, global = true)]
    config: Option<String>,

    /// Data directory (overrides storage.data_dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Write JSON output here instead of stdout
    #[arg(long, global = true)]
    output_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record spins, oldest first (00 accepted)
    Spin {
        #[arg(required = true)]
        values: Vec<String>,
    },
    /// Remove the newest spin
    Undo,
    /// Clear all spins (strategies are kept, statistics reset)
    Clear {
        /// Delete every strategy instead
        #[arg(long)]
        strategies: bool,
    },
    /// Replace the spin history with a CSV spin log (one spin per line, oldest first)
    LoadLog { path: PathBuf },
    /// Create a strategy from pattern steps (e.g. `red d2 nb:17:2`)
    Add {
        #[arg(long)]
        name: Option<String>,
        #[arg(required = true)]
        steps: Vec<String>,
    },
    /// Rename a strategy and/or replace its pattern
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        steps: Vec<String>,
    },
    /// Delete a strategy
    Remove { id: String },
    /// Pause or resume a strategy
    Toggle { id: String },
    /// Turn priority alerts on or off for a strategy
    Alert { id: String },
    /// Reset a strategy's statistics
    Reset { id: String },
    /// Show all strategies
    List,
    /// Spin statistics and analysis
    Stats {
        /// How many hot/cold numbers to show
        #[arg(long, default_value = "5")]
        top: usize,
        /// Show which numbers followed this one
        #[arg(long)]
        follow: Option<String>,
    },
    /// Score a pattern against the history without saving it
    Backtest {
        #[arg(required = true)]
        steps: Vec<String>,
    },
    /// Write a full backup as JSON
    Export,
    /// Replace spins and strategies from a backup
    Import { path: PathBuf },
    /// Replay patterns with bankroll management
    Simulate(SimulateArgs),
}

#[derive(clap::Args, Debug)]
struct SimulateArgs {
    /// Pattern steps; ignored when --strategy or --all is given
    steps: Vec<String>,

    /// Simulate an existing strategy (id, id prefix or name)
    #[arg(long)]
    strategy: Option<String>,

    /// Simulate every active strategy
    #[arg(long)]
    all: bool,

    /// Use this many generated spins instead of the recorded history
    #[arg(long)]
    generated: Option<usize>,

    /// Also summarise the first pattern over many generated sequences
    #[arg(long)]
    monte_carlo: bool,

    /// Monte Carlo runs (overrides simulation.runs)
    #[arg(long)]
    runs: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// flat, martingale, dalembert, fibonacci or labouchere
    #[arg(long)]
    system: Option<StakingSystem>,

    #[arg(long)]
    bankroll: Option<f64>,

    #[arg(long)]
    base_bet: Option<f64>,

    #[arg(long)]
    stop_loss: Option<f64>,

    #[arg(long)]
    take_profit: Option<f64>,

    /// Leave the bankroll trajectory out of the JSON output
    #[arg(long)]
    no_trajectory: bool,
}

#[derive(Debug, Serialize)]
struct StatsReport {
    stats: SpinStats,
    hot: Vec<NumberCount>,
    cold: Vec<NumberCount>,
    due: Vec<DueCounter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    followers: Option<Vec<Follower>>,
}

#[derive(Debug, Serialize)]
struct SimulateReport {
    meta: SimulateMeta,
    results: Vec<NamedResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    monte_carlo: Option<MonteCarloSummary>,
}

#[derive(Debug, Serialize)]
struct SimulateMeta {
    source: &'static str,
    total_spins: usize,
    system: StakingSystem,
    initial_bankroll: f64,
    base_bet: f64,
    elapsed_ms: u128,
}

#[derive(Debug, Serialize)]
struct NamedResult {
    name: String,
    #[serde(flatten)]
    result: SimulationResult,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> CliResult<WheelwatchConfig> {
    let mut config = match &cli.config {
        Some(paths) => {
            let paths: Vec<PathBuf> = paths.split(',').map(PathBuf::from).collect();
            let refs: Vec<&Path> = paths.iter().map(|p| p.as_path()).collect();
            WheelwatchConfig::from_toml_files(&refs)?
        }
        None => WheelwatchConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir = dir.clone();
    }
    Ok(config)
}

fn run(cli: Cli) -> CliResult<()> {
    let config = load_config(&cli)?;
    let store = JsonFileStore::new(&config.storage.data_dir);
    let mut session = Session::open(store, config.tracker)?;

    match &cli.command {
        Command::Spin { values } => {
            let values = values
                .iter()
                .map(|v| v.parse::<Spin>().map(|s| i64::from(s.value())))
                .collect::<Result<Vec<_>, _>>()?;
            let alerts = session.record_spins(&values)?;
            for alert in &alerts {
                eprintln!(
                    "PRIORITY: {} has missed {} times in a row",
                    alert.name, alert.loss_streak
                );
            }
            emit(&cli, &session.stats())?;
        }
        Command::Undo => {
            match session.undo()? {
                Some(spin) => eprintln!("Removed spin {spin}"),
                None => eprintln!("No spins to remove"),
            }
            emit(&cli, &session.stats())?;
        }
        Command::Clear { strategies } => {
            if *strategies {
                session.clear_strategies()?;
                eprintln!("All strategies deleted");
            } else {
                session.clear_spins()?;
                eprintln!("Spin history cleared");
            }
        }
        Command::LoadLog { path } => {
            let load_start = Instant::now();
            let log = SpinStream::from_csv(path)?;
            let values: Vec<i64> = log
                .iter_newest_first()
                .map(|s| i64::from(s.value()))
                .collect();
            session.replace_spins(&values)?;
            eprintln!(
                "Loaded {} spins in {:.1}ms",
                values.len(),
                load_start.elapsed().as_secs_f64() * 1000.0
            );
            emit(&cli, &session.stats())?;
        }
        Command::Add { name, steps } => {
            let pattern = steps::parse_pattern(steps)?;
            let record = session.add_strategy(name.as_deref(), pattern)?;
            emit(&cli, &record)?;
        }
        Command::Edit { id, name, steps } => {
            let id = resolve_id(&session, id)?;
            let pattern = if steps.is_empty() {
                None
            } else {
                Some(steps::parse_pattern(steps)?)
            };
            let record = session.update_strategy(&id, name.as_deref(), pattern)?;
            emit(&cli, &record)?;
        }
        Command::Remove { id } => {
            let id = resolve_id(&session, id)?;
            let removed = session.remove_strategy(&id)?;
            eprintln!("Removed {}", removed.name);
        }
        Command::Toggle { id } => {
            let id = resolve_id(&session, id)?;
            let active = session.toggle_strategy(&id)?;
            eprintln!("Strategy is now {}", if active { "active" } else { "paused" });
        }
        Command::Alert { id } => {
            let id = resolve_id(&session, id)?;
            let on = session.toggle_alert(&id)?;
            eprintln!("Priority alerts {}", if on { "on" } else { "off" });
        }
        Command::Reset { id } => {
            let id = resolve_id(&session, id)?;
            session.reset_strategy(&id)?;
            eprintln!("Statistics reset");
        }
        Command::List => {
            print_strategies(session.strategies());
            emit(&cli, &session.strategies())?;
        }
        Command::Stats { top, follow } => {
            let stream = session.stream();
            let wheel = config.tracker.wheel;
            let followers = match follow {
                Some(n) => Some(analysis::followers(stream, n.parse::<Spin>()?, *top)),
                None => None,
            };
            let report = StatsReport {
                stats: session.stats(),
                hot: analysis::hot_numbers(stream, wheel, *top),
                cold: analysis::cold_numbers(stream, wheel, *top),
                due: analysis::due_counters(stream),
                followers,
            };
            print_stats(&report);
            emit(&cli, &report)?;
        }
        Command::Backtest { steps } => {
            let pattern = steps::parse_pattern(steps)?;
            let result = session.backtest(&pattern);
            eprintln!(
                "{}: {} hits / {} losses ({})",
                pattern.label(),
                result.hits,
                result.losses,
                result
                    .hit_rate
                    .map(|r| format!("{:.1}%", r * 100.0))
                    .unwrap_or_else(|| "N/A".into())
            );
            emit(&cli, &result)?;
        }
        Command::Export => {
            let doc = session.export();
            emit_raw(&cli, &doc.to_json()?)?;
        }
        Command::Import { path } => {
            let json = std::fs::read_to_string(path)?;
            session.import(&json)?;
            eprintln!(
                "Imported {} spins and {} strategies",
                session.stream().len(),
                session.strategies().len()
            );
        }
        Command::Simulate(args) => {
            let report = simulate(&config, &session, args)?;
            print_simulation(&report);
            emit(&cli, &report)?;
        }
    }
    Ok(())
}

fn resolve_id(session: &Session<JsonFileStore>, key: &str) -> CliResult<String> {
    session
        .find_strategy(key)
        .map(|r| r.id.clone())
        .ok_or_else(|| format!("no strategy matches {key:?}").into())
}

fn simulate(
    config: &WheelwatchConfig,
    session: &Session<JsonFileStore>,
    args: &SimulateArgs,
) -> CliResult<SimulateReport> {
    let start = Instant::now();
    let sim = &config.simulation;
    let params = SimulationParams {
        initial_bankroll: args.bankroll.unwrap_or(sim.initial_bankroll),
        base_bet: args.base_bet.unwrap_or(sim.base_bet),
        system: args.system.unwrap_or(sim.system),
        stop_loss: args.stop_loss.unwrap_or(sim.stop_loss),
        take_profit: args.take_profit.unwrap_or(sim.take_profit),
    };
    let simulator = BankrollSimulator::new(params, config.tracker.wheel)?;
    let seed = args.seed.unwrap_or(sim.seed);

    let named: Vec<(String, Pattern)> = if args.all {
        session
            .strategies()
            .iter()
            .filter(|r| r.active)
            .map(|r| (r.name.clone(), r.pattern.clone()))
            .collect()
    } else if let Some(key) = &args.strategy {
        let record = session
            .find_strategy(key)
            .ok_or_else(|| format!("no strategy matches {key:?}"))?;
        vec![(record.name.clone(), record.pattern.clone())]
    } else {
        let pattern = steps::parse_pattern(&args.steps)?;
        vec![(pattern.label(), pattern)]
    };
    if named.is_empty() {
        return Err("nothing to simulate".into());
    }

    let (source, spins) = match args.generated {
        Some(n) => (
            "generated",
            SpinGenerator::new(seed, config.tracker.wheel).generate(n),
        ),
        None => ("history", session.stream().to_oldest_first()),
    };
    info!(
        "simulating {} pattern(s) over {} {} spins",
        named.len(),
        spins.len(),
        source
    );

    let runner = ParallelRunner::new(simulator);
    let patterns: Vec<Pattern> = named.iter().map(|(_, p)| p.clone()).collect();
    let results = runner
        .run_patterns(&patterns, &spins)
        .into_iter()
        .zip(named.iter())
        .map(|(mut result, (name, _))| {
            if args.no_trajectory {
                result.trajectory.clear();
            }
            NamedResult {
                name: name.clone(),
                result,
            }
        })
        .collect();

    let monte_carlo = (args.monte_carlo || args.runs.is_some()).then(|| {
        let runs = args.runs.unwrap_or(sim.runs);
        let spins_per_run = args.generated.unwrap_or(sim.generated_spins);
        runner.monte_carlo(&patterns[0], runs, spins_per_run, seed)
    });

    Ok(SimulateReport {
        meta: SimulateMeta {
            source,
            total_spins: spins.len(),
            system: params.system,
            initial_bankroll: params.initial_bankroll,
            base_bet: params.base_bet,
            elapsed_ms: start.elapsed().as_millis(),
        },
        results,
        monte_carlo,
    })
}

fn emit<T: Serialize + ?Sized>(cli: &Cli, value: &T) -> CliResult<()> {
    emit_raw(cli, &serde_json::to_string_pretty(value)?)
}

fn emit_raw(cli: &Cli, json: &str) -> CliResult<()> {
    match &cli.output_file {
        Some(path) => {
            std::fs::write(path, json)?;
            eprintln!("Written to {path:?}");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn print_strategies(records: &[StrategyRecord]) {
    eprintln!("{}", "=".repeat(96));
    eprintln!(
        "{:<10} {:<32} {:>6} {:>6} {:>7} {:>7} {:>7}  {}",
        "Id", "Name", "Hits", "Losses", "HitRate", "Streak", "MaxL", "Flags"
    );
    eprintln!("{}", "-".repeat(96));
    for r in records {
        let s = &r.state;
        let flags = format!(
            "{}{}{}",
            if s.is_priority { "PRIORITY " } else { "" },
            if r.active { "" } else { "paused " },
            if r.alert_on_priority { "" } else { "muted" },
        );
        eprintln!(
            "{:<10} {:<32} {:>6} {:>6} {:>7} {:>7} {:>7}  {}",
            r.id.chars().take(8).collect::<String>(),
            truncate(&r.name, 32),
            s.hits,
            s.losses,
            s.hit_rate()
                .map(|h| format!("{:.1}%", h * 100.0))
                .unwrap_or_else(|| "-".into()),
            s.current_streak,
            s.longest_loss_streak,
            flags.trim_end(),
        );
    }
    eprintln!("{}", "=".repeat(96));
}

fn print_stats(report: &StatsReport) {
    let s = &report.stats;
    let pct = |n: usize| {
        if s.total_spins == 0 {
            0.0
        } else {
            n as f64 / s.total_spins as f64 * 100.0
        }
    };
    let numbers = |list: &[NumberCount]| {
        list.iter()
            .map(|c| format!("{}({})", c.number, c.count))
            .collect::<Vec<_>>()
            .join(" ")
    };
    eprintln!("{}", "=".repeat(60));
    eprintln!(
        "Spins: {} | Last: {}",
        s.total_spins,
        s.last_number.map(|n| n.to_string()).unwrap_or_else(|| "-".into())
    );
    eprintln!(
        "Red {:.1}% | Black {:.1}% | Green {:.1}% | Even {:.1}% | Odd {:.1}%",
        pct(s.red_count),
        pct(s.black_count),
        pct(s.green_count),
        pct(s.even_count),
        pct(s.odd_count),
    );
    eprintln!("Hot:  {}", numbers(&report.hot));
    eprintln!("Cold: {}", numbers(&report.cold));
    for d in &report.due {
        eprintln!("  {:<14} {:>4} spins ago", d.section, d.spins_since);
    }
    if let Some(followers) = &report.followers {
        eprintln!("Followers:");
        for f in followers {
            eprintln!("  {:>2} x{:<4} {:.1}%", f.number, f.count, f.percentage);
        }
    }
    eprintln!("{}", "=".repeat(60));
}

fn print_simulation(report: &SimulateReport) {
    let m = &report.meta;
    eprintln!("\n{}", "=".repeat(88));
    eprintln!(
        "Simulation | {} spins ({}) | {} | bankroll {:.2} | base bet {:.2} | {}ms",
        m.total_spins, m.source, m.system, m.initial_bankroll, m.base_bet, m.elapsed_ms
    );
    eprintln!("{}", "-".repeat(88));
    eprintln!(
        "{:<28} {:>6} {:>6} {:>7} {:>10} {:>10} {:>9} {:>8}",
        "Pattern", "Hits", "Losses", "HitRate", "Final", "Profit", "MaxDD", "Stop"
    );
    eprintln!("{}", "-".repeat(88));
    for r in &report.results {
        let res = &r.result;
        eprintln!(
            "{:<28} {:>6} {:>6} {:>6.1}% {:>10.2} {:>10.2} {:>9.2} {:>8}",
            truncate(&r.name, 28),
            res.hits,
            res.losses,
            res.hit_rate * 100.0,
            res.final_bankroll,
            res.profit,
            res.max_drawdown,
            format!("{:?}", res.stop_reason),
        );
    }
    if let Some(mc) = &report.monte_carlo {
        eprintln!("{}", "-".repeat(88));
        eprintln!(
            "Monte Carlo: {} runs x {} spins | mean {:.2} | median {:.2} | p5 {:.2} | p95 {:.2} | ruin {:.1}%",
            mc.runs,
            mc.spins_per_run,
            mc.mean_final_bankroll,
            mc.median_final_bankroll,
            mc.p5_final_bankroll,
            mc.p95_final_bankroll,
            mc.ruin_rate * 100.0,
        );
    }
    eprintln!("{}", "=".repeat(88));
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width - 1).collect();
        out.push('…');
        out
    }
}
