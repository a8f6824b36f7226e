//! The commands under the `shell` CLI.

pub mod damage;
pub mod generate;
pub mod report;
pub mod simulate;

use clap::Subcommand;

/// The subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a rectangular lattice body and write its mesh definition.
    Generate {
        /// The number of rows of cells.
        #[arg(short('r'), long)]
        rows: usize,

        /// The number of columns of cells.
        #[arg(short('c'), long)]
        cols: usize,

        /// The number of cells to leave out, chosen at random.
        #[arg(long, default_value_t = 0)]
        holes: usize,

        /// The name of the material of every particle.
        #[arg(short('M'), long, default_value = "Iron")]
        material: String,

        /// The distance between neighboring particles.
        #[arg(long, default_value_t = 1.0)]
        spacing: f32,

        /// Whether to add the second diagonal of every cell.
        #[arg(long)]
        traverse_springs: bool,

        /// The number of slots reserved for ephemeral particles.
        #[arg(long, default_value_t = 64)]
        ephemeral_capacity: usize,
    },
    /// Load a body and run the simulation for a number of steps.
    Simulate {
        /// The number of steps to run.
        #[arg(short('n'), long, default_value_t = 100)]
        steps: usize,

        /// A particle to push on every step.
        #[arg(long)]
        push_point: Option<u32>,

        /// The horizontal component of the push.
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        push_x: f32,

        /// The vertical component of the push.
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        push_y: f32,

        /// Particles to pin before the first step.
        #[arg(long, value_delimiter = ',')]
        pin: Vec<u32>,
    },
    /// Load a body, destroy some of its elements and report the frontiers.
    Damage {
        /// Triangles to destroy.
        #[arg(short('t'), long, value_delimiter = ',')]
        triangles: Vec<u32>,

        /// Springs to destroy, along with the triangles they are an edge of.
        #[arg(short('S'), long, value_delimiter = ',')]
        springs: Vec<u32>,

        /// Particles to destroy.
        #[arg(short('p'), long, value_delimiter = ',')]
        points: Vec<u32>,

        /// Restore everything afterwards, in reverse order.
        #[arg(long)]
        restore: bool,
    },
}
