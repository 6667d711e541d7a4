//! tube CLI - build, deform and export lofted tubes
//!
//! Reads hand-written section files and tube snapshots (JSON) and writes
//! snapshots and binary STL.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tube_kernel::tube_kernel_deform::curve::{curve_length, interpolate_at_z};
use tube_kernel::{
    Attenuation, DeformationEngine, DeformationPoint, KernelConfig, MeshOptions, Tube, Vec3,
};
use tube_store::TubeSnapshot;

mod input;
mod stl;

use input::SectionsFile;

#[derive(Parser)]
#[command(name = "tube")]
#[command(about = "Loft cross-sections into tubes, bend them, export meshes", long_about = None)]
struct Cli {
    /// TOML file with `[connect]`, `[mesh]` and `[deform]` settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log construction details (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a tube from a sections file
    Build {
        /// Sections file (JSON)
        input: PathBuf,
        /// Output tube snapshot (JSON)
        #[arg(short, long)]
        output: PathBuf,
        /// Also write the mesh as binary STL
        #[arg(long)]
        stl: Option<PathBuf>,
        /// Close both ends of the mesh
        #[arg(long)]
        cap_ends: bool,
    },
    /// Drag the tube's centerline at one height
    Deform {
        /// Input tube snapshot
        input: PathBuf,
        /// Height of the dragged centerline point
        #[arg(long, allow_negative_numbers = true)]
        at_z: f32,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        dx: f32,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        dy: f32,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        dz: f32,
        /// Influence radius (at least 30% of the centerline length is used)
        #[arg(long, default_value_t = 0.0)]
        radius: f32,
        #[arg(long, value_enum, default_value_t = AttenuationArg::Gaussian)]
        attenuation: AttenuationArg,
        /// Output tube snapshot
        #[arg(short, long)]
        output: PathBuf,
        /// Reconnect all segments after deforming
        #[arg(long)]
        rebuild: bool,
    },
    /// Display information about a tube snapshot
    Info {
        /// Tube snapshot
        file: PathBuf,
    },
    /// Export a tube snapshot to binary STL
    Export {
        /// Tube snapshot
        input: PathBuf,
        /// Output STL file
        output: PathBuf,
        /// Close both ends of the mesh
        #[arg(long)]
        cap_ends: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum AttenuationArg {
    Gaussian,
    Exponential,
    Linear,
    Quadratic,
}

impl From<AttenuationArg> for Attenuation {
    fn from(a: AttenuationArg) -> Self {
        match a {
            AttenuationArg::Gaussian => Attenuation::Gaussian,
            AttenuationArg::Exponential => Attenuation::Exponential,
            AttenuationArg::Linear => Attenuation::Linear,
            AttenuationArg::Quadratic => Attenuation::Quadratic,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => KernelConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => KernelConfig::default(),
    };

    match cli.command {
        Commands::Build {
            input,
            output,
            stl,
            cap_ends,
        } => build(&config, &input, &output, stl.as_deref(), cap_ends),
        Commands::Deform {
            input,
            at_z,
            dx,
            dy,
            dz,
            radius,
            attenuation,
            output,
            rebuild,
        } => deform(
            &config,
            &input,
            &output,
            at_z,
            Vec3::new(dx, dy, dz),
            radius,
            attenuation.into(),
            rebuild,
        ),
        Commands::Info { file } => show_info(&file),
        Commands::Export {
            input,
            output,
            cap_ends,
        } => {
            let tube = read_tube(&input)?;
            let options = MeshOptions {
                cap_ends: cap_ends || config.mesh.cap_ends,
            };
            write_stl(&tube, &options, &output)
        }
    }
}

fn read_tube(path: &Path) -> Result<Tube> {
    let json =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let tube = TubeSnapshot::from_json(&json)
        .and_then(TubeSnapshot::into_tube)
        .with_context(|| format!("loading tube {}", path.display()))?;
    Ok(tube)
}

fn write_tube(tube: &Tube, path: &Path) -> Result<()> {
    let json = TubeSnapshot::from_tube(tube).to_json()?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote tube to {}", path.display());
    Ok(())
}

fn write_stl(tube: &Tube, options: &MeshOptions, path: &Path) -> Result<()> {
    let result = tube.build_mesh(options);
    if !result.success {
        bail!("tube produced no mesh");
    }
    if !result.problematic_sections.is_empty() {
        warn!(pairs = ?result.problematic_sections, "mesh has unresolved segments");
    }
    let buffers = result.mesh.to_triangle_buffers();
    fs::write(path, stl::export_stl_bytes(&buffers))
        .with_context(|| format!("writing {}", path.display()))?;
    println!(
        "Exported {} triangles to {}",
        buffers.num_triangles(),
        path.display()
    );
    Ok(())
}

fn build(
    config: &KernelConfig,
    input: &Path,
    output: &Path,
    stl_path: Option<&Path>,
    cap_ends: bool,
) -> Result<()> {
    let json =
        fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let sections = SectionsFile::parse(&json)?.into_sections();

    let mut tube = Tube::new();
    for (i, section) in sections.into_iter().enumerate() {
        tube.add_section(section)
            .with_context(|| format!("section {} rejected", i + 1))?;
    }

    let report = tube.build_all_segments(&config.connect)?;
    for (start, end, err) in &report.failed {
        warn!(start = start + 1, end = end + 1, error = %err, "pair not connected");
    }
    info!(
        built = report.built.len(),
        failed = report.failed.len(),
        "segments built"
    );

    write_tube(&tube, output)?;
    if let Some(path) = stl_path {
        let options = MeshOptions {
            cap_ends: cap_ends || config.mesh.cap_ends,
        };
        write_stl(&tube, &options, path)?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn deform(
    config: &KernelConfig,
    input: &Path,
    output: &Path,
    at_z: f32,
    offset: Vec3,
    radius: f32,
    attenuation: Attenuation,
    rebuild: bool,
) -> Result<()> {
    let mut tube = read_tube(input)?;
    let centers = tube.centers_curve();
    if centers.len() < 2 {
        bail!("tube needs at least two sections to deform");
    }

    let source = interpolate_at_z(&centers, at_z);
    let radius = radius.max(0.3 * curve_length(&centers));
    let mut engine = DeformationEngine::with_settings(config.deform.clone())?;
    engine.add_point(DeformationPoint::from_drag(
        source,
        source + offset,
        radius,
        attenuation,
    ))?;

    let report = engine.apply_to_tube(&mut tube)?;
    info!(
        moved = report.sections_moved,
        max_shift = report.max_center_shift,
        "centerline dragged"
    );

    if rebuild || report.needs_rebuild() {
        if !rebuild {
            warn!(stale = report.refresh.stale, "stale lateral edges, rebuilding segments");
        }
        let built = tube.rebuild_all_segments(&config.connect)?;
        if !built.is_success() {
            warn!(failed = built.failed.len(), "some pairs did not reconnect");
        }
    }

    write_tube(&tube, output)
}

fn show_info(path: &Path) -> Result<()> {
    let tube = read_tube(path)?;

    println!("Tube: {}", path.display());
    println!("  Sections: {}", tube.section_count());
    for (i, s) in tube.sections().iter().enumerate() {
        println!(
            "    {}: {} points, z = {:.3}, diameter {:.3}",
            i + 1,
            s.len(),
            s.z().unwrap_or(0.0),
            s.diameter()
        );
    }
    println!("  Segments: {}", tube.segment_count());
    let lateral: usize = tube.segments().iter().map(|s| s.edge_count()).sum();
    println!("  Lateral edges: {lateral}");
    println!("  Centerline length: {:.3}", tube.total_length());
    if let Some(bb) = tube.bounding_box() {
        println!(
            "  Bounds: ({:.3}, {:.3}, {:.3}) - ({:.3}, {:.3}, {:.3})",
            bb.min.x, bb.min.y, bb.min.z, bb.max.x, bb.max.y, bb.max.z
        );
    }
    println!("  Valid: {}", tube.is_valid());
    let problems = tube.problematic_segments();
    if problems.is_empty() {
        println!("  Problematic pairs: none");
    } else {
        for (start, end) in problems {
            println!("  Problematic pair: {} - {}", start + 1, end + 1);
        }
    }
    Ok(())
}
