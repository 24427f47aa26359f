//! PolarCraft command-line interface.
//!
//! Run polarization optics scenes from TOML job files:
//! ```sh
//! polarcraft run job.toml
//! polarcraft validate job.toml
//! polarcraft analyze 1 0 0 1
//! polarcraft elements
//! ```

mod config;
mod runner;

use std::path::PathBuf;

use anyhow::bail;
use clap::{Parser, Subcommand};

use polarcraft_core::polarization::classify::analyze_stokes;
use polarcraft_core::polarization::StokesVector;
use polarcraft_core::types::ElementKind;

#[derive(Parser)]
#[command(name = "polarcraft")]
#[command(about = "PolarCraft: polarization optics scene simulator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scene from a TOML job file.
    Run {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Output directory (overrides config file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a job file without running the scene.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
    /// Classify a Stokes vector.
    Analyze {
        s0: f64,
        #[arg(allow_hyphen_values = true)]
        s1: f64,
        #[arg(allow_hyphen_values = true)]
        s2: f64,
        #[arg(allow_hyphen_values = true)]
        s3: f64,
    },
    /// List the element types a scene may contain.
    Elements,
}

fn element_parameters(kind: ElementKind) -> &'static str {
    match kind {
        ElementKind::Emitter => "angle (direction), polarization (-1 = unpolarized), intensity, wavelengthNm",
        ElementKind::Polarizer => "polarization or angle (transmission axis)",
        ElementKind::Waveplate => "retardation (required), polarization or angle (fast axis)",
        ElementKind::Mirror => "reflectAngle (required)",
        ElementKind::Splitter => "splitType (pbs | calcite), polarization or angle (o-ray axis)",
        ElementKind::Sensor => "position only",
        ElementKind::Lens => "position only; transparent to the tracer",
        ElementKind::Rotator => "rotation (required)",
        ElementKind::Attenuator => "attenuation (required, 0..1)",
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, output } => {
            println!("PolarCraft");
            println!("==========");
            let job = config::load_config(&config)?;
            job.validate()?;
            println!("Configuration: {}", config.display());

            let result = runner::run_simulation(&job)?;

            let out_dir = output.unwrap_or_else(|| PathBuf::from(&job.output.directory));

            runner::write_report_json(&result.report, &out_dir.join("report.json"))?;

            if job.output.save_segments {
                runner::write_segments_csv(&result.world, &out_dir.join("segments.csv"), &job)?;
            }

            if job.output.save_world {
                runner::write_world_json(&result.world, &out_dir.join("world.json"))?;
            }

            if job.output.save_render {
                runner::write_render_json(&result.world, job.output.color_mode, &out_dir.join("render.json"))?;
            }

            println!();
            println!("{}", result.report.narrative);
            println!("{}", result.report.causal);
            Ok(())
        }
        Commands::Validate { config } => {
            let job = config::load_config(&config)?;
            job.validate()?;
            println!(
                "Configuration is valid: {} ({} component(s))",
                config.display(),
                job.components.len()
            );
            Ok(())
        }
        Commands::Analyze { s0, s1, s2, s3 } => {
            let Some(stokes) = StokesVector::checked(s0, s1, s2, s3) else {
                bail!("({}, {}, {}, {}) is not a physically realizable Stokes vector", s0, s1, s2, s3);
            };
            let d = analyze_stokes(&stokes);
            let [x, y, z] = stokes.poincare();
            let (polarized, unpolarized) = stokes.decompose();
            println!("{}", d.label);
            println!("  category:       {}", d.category);
            println!("  orientation:    {:.2}°", d.orientation_deg);
            println!("  ellipticity:    {:.2}°", d.ellipticity_deg);
            println!("  handedness:     {}", d.handedness.as_str());
            println!("  DOP:            {:.4}", d.dop);
            println!("  Poincaré:       ({:.4}, {:.4}, {:.4})", x, y, z);
            println!("  polarized part: {:.4}", polarized.s0);
            println!("  unpolarized:    {:.4}", unpolarized.s0);
            Ok(())
        }
        Commands::Elements => {
            println!("Element types:");
            println!();
            for kind in ElementKind::ALL {
                println!("  {:<11} {}", kind.as_str(), element_parameters(kind));
            }
            Ok(())
        }
    }
}
