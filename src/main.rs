use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;
mod duration;
mod error;
mod log;
mod model;
mod render;
mod sbatch;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "topsstack-tools")]
#[command(about = "Run-time reports and sbatch scripts for topsStack on Slurm", long_about = None)]
struct Cli {
    /// More diagnostics on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize stage timings and estimated cost of a processing run.
    Report {
        #[arg(long, default_value = "log_files/time_unix.txt")]
        log: String,

        #[arg(long, default_value = "resources_array.cfg")]
        config: String,

        #[arg(short = 'o', long, default_value = "formatted_summary_timings.txt")]
        out: String,

        /// SVG bar chart of CPU hours and wall time per stage.
        #[arg(long, default_value = "cpu_wall_time.svg")]
        chart: String,

        /// Also write the summary as JSON.
        #[arg(long)]
        json: Option<String>,

        /// Dollars per CPU unit.
        #[arg(long, default_value_t = model::DEFAULT_RATE)]
        rate: f64,

        /// 0-based resource table rows that use a GPU.
        #[arg(long, default_value = "4,8", conflicts_with = "gpu_from_gres")]
        gpu_stages: String,

        /// Treat rows with a non-zero Gres count as GPU stages.
        #[arg(long)]
        gpu_from_gres: bool,
    },

    /// Write one sbatch script per resource table row.
    Sbatch {
        /// Track, for naming the jobs (e.g. "T115a").
        track: String,

        #[arg(long, default_value = "resources_array.cfg")]
        config: String,

        /// Directory for the .sbatch files [default: the config file's directory]
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// No stage may ask for more CPUs per node than this.
        #[arg(long, default_value_t = 56)]
        cpus_per_node_limit: u32,

        #[arg(long, default_value = "simonsgroup")]
        account: String,

        /// Address for job failure mails; none are sent when empty.
        #[arg(long, default_value = "")]
        mail_user: String,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.cmd {
        Commands::Report {
            log,
            config,
            out,
            chart,
            json,
            rate,
            gpu_stages,
            gpu_from_gres,
        } => {
            let gpu = if gpu_from_gres {
                config::GpuStages::FromGres
            } else {
                config::GpuStages::parse_rows(&gpu_stages)?
            };

            // 1) Parse inputs.
            let timings = log::parse_timing_file(&log)?;
            let resources = config::parse_resource_file(&config)?;

            // 2) Aggregate.
            let data = model::build_report_data(&timings, &resources, &gpu, rate)?;

            // 3) Render.
            let text = render::render_text_report(&data);
            print!("{}", text);
            std::fs::write(&out, &text)?;
            println!("Wrote {}", out);

            std::fs::write(&chart, render::render_chart_svg(&data))?;
            println!("Wrote {}", chart);

            if let Some(json) = json {
                std::fs::write(&json, serde_json::to_string_pretty(&data)?)?;
                println!("Wrote {}", json);
            }
        }
        Commands::Sbatch {
            track,
            config,
            out_dir,
            cpus_per_node_limit,
            account,
            mail_user,
        } => {
            let resources = config::parse_resource_file(&config)?;

            println!();
            println!("##### Writing sbatch files for {}", track);
            let opts = sbatch::SbatchOptions {
                track: track.clone(),
                out_dir,
                cpus_per_node_limit,
                account,
                mail_user,
            };
            let written = sbatch::write_sbatch_files(&resources, &opts)?;
            for path in &written {
                println!("Wrote {}", path.display());
            }
            println!("Sbatch files written for {}", track);
        }
    }

    Ok(())
}
