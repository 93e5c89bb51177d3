use std::sync::Arc;

use clap::{Parser, ValueEnum};
use communicator::{spawn_world, MPICommunicator};
use vector_driver::{run, DriverResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// one MPI process per participant, launched with mpiexec
    Mpi,
    /// one thread per participant inside this process
    Threads,
}

/// Builds a distributed vector, prints its norm and local entries, then overwrites them.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Participant group backend
    #[arg(short, long, value_enum, default_value_t = Backend::Mpi)]
    backend: Backend,

    /// Number of participants, thread backend only
    #[arg(short = 'n', long, default_value_t = 4)]
    participants: usize,
}

fn run_mpi() -> DriverResult<()> {
    let comm = Arc::new(MPICommunicator::new()?);
    run(comm, &mut std::io::stdout())?;
    Ok(())
}

fn run_threads(participants: usize) -> DriverResult<()> {
    spawn_world(participants, |comm| {
        run(Arc::new(comm), &mut std::io::stdout())
    })?
    .into_iter()
    .collect::<DriverResult<Vec<_>>>()?;
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    log::debug!("{:?}", args);

    let result = match args.backend {
        Backend::Mpi => run_mpi(),
        Backend::Threads => run_threads(args.participants),
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
