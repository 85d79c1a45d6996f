use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use shutterblur::{
    BlurJob, CancelToken, FrameDriver, FrameIndex, FrameRange, MemoryHost, SceneSpec,
};

#[derive(Parser, Debug)]
#[command(name = "shutterblur", version)]
struct Cli {
    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one motion-blurred frame.
    Frame(FrameArgs),
    /// Render a frame range.
    Range(RangeArgs),
    /// Print the sample plan for each frame of a range without rendering.
    Plan(PlanArgs),
}

#[derive(Args, Debug)]
struct Inputs {
    /// Scene JSON.
    #[arg(long)]
    scene: PathBuf,

    /// Blur job JSON; defaults apply when omitted.
    #[arg(long)]
    job: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    inputs: Inputs,

    /// Frame to render.
    #[arg(long, allow_negative_numbers = true)]
    frame: i64,

    /// Output path prefix; overrides the job's.
    #[arg(long)]
    out: Option<String>,
}

#[derive(Args, Debug)]
struct SpanArgs {
    /// First frame.
    #[arg(long, allow_negative_numbers = true)]
    start: i64,

    /// Last frame (inclusive).
    #[arg(long, allow_negative_numbers = true)]
    end: i64,

    #[arg(long, default_value_t = 1)]
    step: u32,
}

impl SpanArgs {
    fn range(&self) -> anyhow::Result<FrameRange> {
        Ok(FrameRange::new(
            FrameIndex(self.start),
            FrameIndex(self.end),
            self.step,
        )?)
    }
}

#[derive(Parser, Debug)]
struct RangeArgs {
    #[command(flatten)]
    inputs: Inputs,

    #[command(flatten)]
    span: SpanArgs,

    /// Output path prefix; overrides the job's.
    #[arg(long)]
    out: Option<String>,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    #[command(flatten)]
    inputs: Inputs,

    #[command(flatten)]
    span: SpanArgs,

    /// Print the plans as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Range(args) => cmd_range(args),
        Command::Plan(args) => cmd_plan(args),
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::INFO,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn read_job(path: Option<&Path>, out: Option<String>) -> anyhow::Result<BlurJob> {
    let mut job = match path {
        Some(p) => {
            BlurJob::from_json_path(p).with_context(|| format!("load job '{}'", p.display()))?
        }
        None => BlurJob::default(),
    };
    if let Some(prefix) = out {
        job.output.path_prefix = prefix;
    }
    job.validate()?;
    Ok(job)
}

fn load(inputs: &Inputs, out: Option<String>) -> anyhow::Result<(MemoryHost, BlurJob)> {
    let scene = SceneSpec::from_json_path(&inputs.scene)
        .with_context(|| format!("load scene '{}'", inputs.scene.display()))?;
    let job = read_job(inputs.job.as_deref(), out)?;
    Ok((MemoryHost::new(scene).with_file_output(), job))
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (mut host, job) = load(&args.inputs, args.out)?;
    let report = shutterblur::render_frame(
        &mut host,
        FrameIndex(args.frame),
        &job,
        &CancelToken::new(),
    )?;
    eprintln!(
        "wrote {} ({} samples, {:.1} ms)",
        report.output_path.display(),
        report.plan.sample_count,
        report.elapsed.as_secs_f64() * 1e3
    );
    Ok(())
}

fn cmd_range(args: RangeArgs) -> anyhow::Result<()> {
    let (mut host, job) = load(&args.inputs, args.out)?;
    let range = args.span.range()?;
    let report = shutterblur::render_range(&mut host, range, &job, &CancelToken::new(), |p| {
        eprintln!(
            "[{}/{}] wrote {} ({} samples, eta {:.1}s)",
            p.done,
            p.total,
            p.report.output_path.display(),
            p.report.plan.sample_count,
            p.eta.as_secs_f64()
        );
    })?;
    eprintln!(
        "rendered {} frames in {:.2}s (avg {:.1} ms/frame)",
        report.frames.len(),
        report.total_elapsed.as_secs_f64(),
        report.average_frame_time.as_secs_f64() * 1e3
    );
    Ok(())
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let (mut host, job) = load(&args.inputs, None)?;
    let range = args.span.range()?;
    let plans = FrameDriver::new().plan_range(&mut host, range, &job)?;

    if args.json {
        let text = serde_json::to_string_pretty(&plans).context("serialize plans")?;
        println!("{text}");
        return Ok(());
    }
    for p in &plans {
        let velocity = p
            .velocity
            .as_ref()
            .map_or_else(|| "-".to_string(), |v| format!("{:.2}", v.max_px_per_frame));
        println!(
            "frame {:>5}  velocity {:>8} px/frame  samples {:>3}  multiplier {:>3}  step {:.6}",
            p.request.frame.0,
            velocity,
            p.plan.sample_count,
            p.plan.subframe_multiplier,
            p.plan.time_step
        );
    }
    Ok(())
}
