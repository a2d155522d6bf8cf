use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::{debug, info};
use qtab::{decay::Decay, persist, Error, IndexKind, QTableAgent, QTableAgentConfig, Result};

/// Drive a persistent tabular Q-learning agent, one operation per invocation
#[derive(Debug, Parser)]
#[command(name = "qtab", version, about)]
struct Cli {
    #[command(flatten)]
    agent: AgentArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct AgentArgs {
    /// Number of states
    #[arg(long, global = true, default_value_t = 10)]
    state_size: usize,

    /// Number of actions
    #[arg(long, global = true, default_value_t = 5)]
    action_size: usize,

    /// Step size α
    #[arg(long, global = true, default_value_t = 0.1)]
    learning_rate: f64,

    /// Future reward weight γ
    #[arg(long, global = true, default_value_t = 0.99)]
    discount_factor: f64,

    /// Probability ε of a random action, not persisted between runs
    #[arg(long, global = true, default_value_t = 1.0)]
    exploration_rate: f64,

    /// Factor applied to ε after each learning update
    #[arg(long, global = true, default_value_t = 0.995)]
    exploration_decay: f64,

    /// Lower bound for ε, unbounded if omitted
    #[arg(long, global = true)]
    exploration_floor: Option<f64>,

    /// Keep ε fixed instead of decaying it after each learning update
    #[arg(long, global = true)]
    constant_exploration: bool,

    /// Seed for the random source
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the action chosen for STATE
    ChooseAction {
        path: PathBuf,
        #[arg(allow_negative_numbers = true)]
        state: i64,
    },
    /// Apply one transition and save the table
    Learn {
        path: PathBuf,
        #[arg(allow_negative_numbers = true)]
        state: i64,
        #[arg(allow_negative_numbers = true)]
        action: i64,
        #[arg(allow_negative_numbers = true)]
        reward: f64,
        #[arg(allow_negative_numbers = true)]
        next_state: i64,
    },
    /// Write a zero-filled table
    Init {
        path: PathBuf,
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print a stored table, one state per line
    Show { path: PathBuf },
}

fn init_logging() {
    let env = Env::default().filter_or("RUST_LOG", "warn");
    // a second initialization is harmless
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let Cli { agent: args, command } = cli;
    let config = QTableAgentConfig {
        learning_rate: args.learning_rate,
        discount_factor: args.discount_factor,
        exploration_rate: args.exploration_rate,
        exploration_decay: args.exploration_decay,
    };
    let agent = match args.seed {
        Some(seed) => QTableAgent::with_seed(args.state_size, args.action_size, config, seed)?,
        None => QTableAgent::new(args.state_size, args.action_size, config)?,
    };
    match (args.exploration_floor, args.constant_exploration) {
        (Some(_), true) => Err(Error::InvalidArgument {
            name: "constant_exploration",
            value: 1.0,
            reason: "cannot be combined with an exploration floor",
        }),
        (Some(min), false) => execute(agent.with_exploration_floor(min)?, command),
        (None, true) => execute(agent.with_constant_exploration(), command),
        (None, false) => execute(agent, command),
    }
}

fn execute<D: Decay>(mut agent: QTableAgent<D>, command: Command) -> Result<()> {
    match command {
        Command::ChooseAction { path, state } => {
            let state = index(IndexKind::State, state, agent.state_size())?;
            restore(&mut agent, &path)?;
            let action = agent.choose_action(state)?;
            writeln!(io::stdout(), "{action}")?;
        }
        Command::Learn {
            path,
            state,
            action,
            reward,
            next_state,
        } => {
            let state = index(IndexKind::State, state, agent.state_size())?;
            let action = index(IndexKind::Action, action, agent.action_size())?;
            let next_state = index(IndexKind::NextState, next_state, agent.state_size())?;
            restore(&mut agent, &path)?;
            agent.learn(state, action, reward, next_state)?;
            agent.save(&path)?;
            debug!("exploration rate now {}", agent.exploration_rate());
        }
        Command::Init { path, force } => {
            if path.exists() && !force {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{} already exists, pass --force to replace it", path.display()),
                )));
            }
            agent.save(&path)?;
            info!(
                "wrote {}x{} zero table to {}",
                agent.state_size(),
                agent.action_size(),
                path.display()
            );
        }
        Command::Show { path } => show(&path)?,
    }
    Ok(())
}

/// Load the stored table into `agent`, keeping the zero table if nothing is stored yet
fn restore<D: Decay>(agent: &mut QTableAgent<D>, path: &Path) -> Result<()> {
    match agent.load_strict(path) {
        Ok(()) => Ok(()),
        Err(Error::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
            info!("no table at {}, starting from zeros", path.display());
            Ok(())
        }
        Err(err) => Err(err),
    }
}

fn show(path: &Path) -> Result<()> {
    let table = persist::load(path)?;
    let mut out = io::stdout().lock();
    for state in 0..table.rows() {
        let row = table
            .row(state)?
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(out, "{row}")?;
    }
    Ok(())
}

/// Reject negative indices here, the library takes `usize`
fn index(kind: IndexKind, value: i64, bound: usize) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::IndexOutOfRange {
        kind,
        index: value,
        bound,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("qtab").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn parses_negative_arguments() {
        let cli = parse(&["learn", "q.bin", "-1", "0", "-2.5", "3"]);
        match cli.command {
            Command::Learn {
                state, reward, next_state, ..
            } => {
                assert_eq!(state, -1);
                assert_eq!(reward, -2.5);
                assert_eq!(next_state, 3);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.agent.state_size, 10, "default state size");
        assert_eq!(cli.agent.action_size, 5, "default action size");
    }

    #[test]
    fn negative_index_is_out_of_range() {
        assert!(matches!(
            index(IndexKind::State, -1, 10),
            Err(Error::IndexOutOfRange { kind: IndexKind::State, index: -1, bound: 10 })
        ));
        assert_eq!(index(IndexKind::Action, 4, 5).unwrap(), 4);
    }

    #[test]
    fn learn_persists_between_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q.bin");
        let path_arg = path.to_str().unwrap();

        run(parse(&["learn", path_arg, "0", "0", "10", "1", "--seed", "1"])).unwrap();
        run(parse(&["learn", path_arg, "0", "0", "10", "1", "--seed", "1"])).unwrap();

        let table = persist::load(&path).unwrap();
        assert_eq!(table.shape(), (10, 5));
        assert_eq!(table.get(0, 0).unwrap(), 1.0 + 0.1 * (10.0 - 1.0));
    }

    #[test]
    fn load_rejects_other_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q.bin");
        let path_arg = path.to_str().unwrap();

        run(parse(&["init", path_arg, "--state-size", "3"])).unwrap();
        assert!(matches!(
            run(parse(&["choose-action", path_arg, "0"])),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(run(parse(&["init", path_arg])).is_err(), "init refuses to overwrite");
        run(parse(&["init", path_arg, "--force"])).unwrap();
        run(parse(&["choose-action", path_arg, "0", "--exploration-rate", "0"])).unwrap();
    }

    #[test]
    fn learn_rejects_negative_state_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q.bin");
        let path_arg = path.to_str().unwrap();

        assert!(matches!(
            run(parse(&["learn", path_arg, "-1", "0", "0", "0"])),
            Err(Error::IndexOutOfRange { kind: IndexKind::State, index: -1, bound: 10 })
        ));
        assert!(matches!(
            run(parse(&["choose-action", path_arg, "10"])),
            Err(Error::IndexOutOfRange { kind: IndexKind::State, index: 10, bound: 10 })
        ));
        assert!(!path.exists(), "nothing written on failure");
    }

    #[test]
    fn exploration_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q.bin");
        let path_arg = path.to_str().unwrap();

        run(parse(&["learn", path_arg, "1", "1", "2", "0", "--constant-exploration"])).unwrap();
        assert_eq!(persist::load(&path).unwrap().get(1, 1).unwrap(), 0.2);
        assert!(matches!(
            run(parse(&["show", path_arg, "--constant-exploration", "--exploration-floor", "0.1"])),
            Err(Error::InvalidArgument { name: "constant_exploration", .. })
        ));
        assert!(matches!(
            run(parse(&["learn", path_arg, "0", "0", "1", "0", "--exploration-rate", "0.05", "--exploration-floor", "0.1"])),
            Err(Error::InvalidArgument { name: "exploration_rate", .. })
        ));
    }
}
