//! CLI for generating, simulating and damaging frangible bodies.

mod commands;
pub mod utils;

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use frangible::{Body, MaterialDatabase, MeshDefinition};

use commands::Commands;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The path to the mesh definition of the body (not required for generate).
    #[arg(short('i'), long)]
    inp_path: Option<PathBuf>,

    /// The path to the output file. Output goes to stdout if absent.
    #[arg(short('o'), long)]
    out_path: Option<PathBuf>,

    /// The path to a `.json` or `.yaml` file of simulation parameters.
    #[arg(short('P'), long)]
    params: Option<PathBuf>,

    /// The random seed to use.
    #[arg(short('s'), long)]
    seed: Option<u64>,

    /// The name of the log-file to use.
    #[arg(short('l'), long, default_value = "shell.log")]
    log_name: String,

    /// The subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

impl Args {
    /// Loads the body described by the input mesh.
    fn load_body(&self, params: frangible::SimulationParameters, seed: u64) -> Result<Body, String> {
        let inp_path = self
            .inp_path
            .as_ref()
            .ok_or_else(|| "Input path (-i/--inp-path) is required for this command".to_string())?;
        ftlog::info!("Reading the mesh from {inp_path:?}");
        let mesh = MeshDefinition::from_json_path(inp_path).map_err(|e| e.to_string())?;
        let body = Body::new(
            &mesh,
            Arc::new(MaterialDatabase::builtin()),
            params,
            Arc::new(utils::LogSink),
            seed,
        )
        .map_err(|e| e.to_string())?;
        ftlog::info!(
            "Loaded {} points, {} springs, {} triangles and {} frontiers",
            body.points().ship_point_count(),
            body.springs().len(),
            body.triangles().len(),
            body.frontiers().len()
        );
        Ok(body)
    }
}

fn main() -> Result<(), String> {
    let args = Args::parse();

    let (_guard, log_path) = utils::configure_logger(&args.log_name)?;
    ftlog::info!("Log file: {log_path:?}");

    let params = utils::read_parameters(args.params.as_deref())?;
    let seed = args.seed.unwrap_or_else(rand::random);
    ftlog::info!("Seed: {seed}");
    let out_path = args.out_path.as_deref();

    match &args.command {
        Commands::Generate {
            rows,
            cols,
            holes,
            material,
            spacing,
            traverse_springs,
            ephemeral_capacity,
        } => {
            let shape = commands::generate::LatticeShape {
                rows: *rows,
                cols: *cols,
                holes: *holes,
                spacing: *spacing,
                traverse_springs: *traverse_springs,
                ephemeral_capacity: *ephemeral_capacity,
            };
            commands::generate::generate_lattice(&shape, material, &params, seed, out_path)
        }
        Commands::Simulate {
            steps,
            push_point,
            push_x,
            push_y,
            pin,
        } => {
            let body = args.load_body(params, seed)?;
            let push = push_point.map(|p| (p, [*push_x, *push_y]));
            commands::simulate::run(body, *steps, push, pin, out_path)
        }
        Commands::Damage {
            triangles,
            springs,
            points,
            restore,
        } => {
            let body = args.load_body(params, seed)?;
            let damage = commands::damage::Damage {
                triangles: triangles.clone(),
                springs: springs.clone(),
                points: points.clone(),
            };
            commands::damage::apply(body, &damage, *restore, out_path)
        }
    }
}
