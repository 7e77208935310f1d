use clap::Parser;
use log::{error, info};
use ndarray::Array2;
use num_complex::Complex64;
use std::error::Error;
use std::io;

use ndarray_liouville::observables::{basis_state, pauli_x, pauli_y, pauli_z, purity, trace};
use ndarray_liouville::rk::Rk4;
use ndarray_liouville::{dyn_generator, FixedStep, OdeIntegrate, PropagationConfig};

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Pauli {
    X,
    Y,
    Z,
}

impl Pauli {
    fn matrix(self) -> Array2<Complex64> {
        match self {
            Pauli::X => pauli_x(),
            Pauli::Y => pauli_y(),
            Pauli::Z => pauli_z(),
        }
    }
}

#[derive(Debug, clap::Parser)]
#[command(
    name = "liouville",
    about = "Propagate a qubit density matrix under dρ/dt = -i[O, ρ] with RK4, writing CSV to stdout"
)]
struct Cli {
    /// Pauli operator generating the dynamics.
    #[arg(short = 'o', long = "operator", value_enum, default_value = "x")]
    operator: Pauli,

    /// Index of the initial basis state |k⟩⟨k|.
    #[arg(short = 'k', long = "initial", default_value_t = 0)]
    initial: usize,

    #[arg(short = 't', long = "t-end", default_value_t = 10.)]
    t_end: f64,

    /// Grid points on [0, t-end], endpoints included.
    #[arg(short = 'n', long = "num-points", default_value_t = 1000)]
    num_points: usize,

    /// Write every N-th step. The final state is always written.
    #[arg(short = 'e', long = "every", default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    every: u64,
}

fn write_row<W: io::Write>(
    writer: &mut csv::Writer<W>,
    solver: &impl OdeIntegrate,
) -> Result<(), Box<dyn Error>> {
    let rho = solver.state();
    writer.write_record(&[
        solver.time().to_string(),
        rho[[0, 0]].re.to_string(),
        rho[[1, 1]].re.to_string(),
        rho[[0, 1]].im.to_string(),
        trace(rho).re.to_string(),
        purity(rho)?.to_string(),
    ])?;
    Ok(())
}

fn run<W: io::Write>(args: &Cli, out: W) -> Result<(), Box<dyn Error>> {
    if args.initial >= 2 {
        return Err(format!("initial basis index must be 0 or 1, got {}", args.initial).into());
    }
    let config = PropagationConfig {
        t0: 0.,
        t_bound: args.t_end,
        num_points: args.num_points,
        store_trajectory: false,
    };
    let mut solver = FixedStep::<_, Rk4>::from_config(
        dyn_generator,
        args.operator.matrix(),
        basis_state(2, args.initial),
        &config,
    )?;
    info!(
        "propagating |{}⟩ under σ{:?} to t = {} with h = {}",
        args.initial,
        args.operator,
        config.t_bound,
        solver.step_size()
    );

    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(&["t", "rho00", "rho11", "im_rho01", "trace", "purity"])?;
    write_row(&mut writer, &solver)?;
    while !solver.finished() {
        solver.advance()?;
        if solver.steps() as u64 % args.every == 0 || solver.finished() {
            write_row(&mut writer, &solver)?;
        }
    }
    writer.flush()?;

    info!(
        "done after {} steps, final purity {}",
        solver.steps(),
        purity(solver.state())?
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Cli::parse();

    if let Err(e) = run(&args, io::stdout()) {
        error!("{}", e);
        std::process::exit(1);
    }
}
