use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    rc::Rc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use vizflow::{
    Actor, BackendKind, ConeSource, ElevationFilter, Mapper, Node, Prop as _, RenderView,
    RenderViewOpts, RenderWindow, Renderer, Rgb, ShrinkPolyData, scene_graph::TraceEvent,
};

#[derive(Parser, Debug)]
#[command(name = "vizflow", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the demo cone scene as a PNG.
    Frame(FrameArgs),
    /// Print the view-node traversal of the demo scene.
    Trace(SceneArgs),
}

#[derive(Parser, Debug)]
struct SceneArgs {
    /// Output width in pixels.
    #[arg(long, default_value_t = 320)]
    width: u32,

    /// Output height in pixels.
    #[arg(long, default_value_t = 240)]
    height: u32,

    /// Cone resolution (side count).
    #[arg(long, default_value_t = 16)]
    resolution: u32,

    /// Actor opacity; below 1 the cone goes through the translucent pass.
    #[arg(long, default_value_t = 1.0)]
    opacity: f64,

    /// JSON with `cone`, `shrink` and `elevation` parameter objects.
    #[arg(long)]
    params: Option<PathBuf>,

    /// JSON render view options.
    #[arg(long)]
    opts: Option<PathBuf>,

    /// Number of frames to render; later frames only pull what changed.
    #[arg(long, default_value_t = 1)]
    frames: u32,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Backend to use.
    #[arg(long, value_enum, default_value_t = BackendChoice::Cpu)]
    backend: BackendChoice,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendChoice {
    Cpu,
    Recording,
}

impl From<BackendChoice> for BackendKind {
    fn from(b: BackendChoice) -> Self {
        match b {
            BackendChoice::Cpu => BackendKind::Cpu,
            BackendChoice::Recording => BackendKind::Recording,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Trace(args) => cmd_trace(args),
    }
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let scene = DemoScene::build(&args.scene)?;
    let mut view = RenderView::new(
        &scene.window,
        args.backend.into(),
        read_opts(args.scene.opts.as_deref())?,
    );
    let frames = args.scene.frames.max(1);
    render_frames(&mut view, frames - 1)?;
    let capture = view.capture_image();
    render_frames(&mut view, 1)?;

    let frame = pollster::block_on(capture)
        .context("capture frame")?
        .to_straight();

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    scene.print_counts();
    Ok(())
}

fn cmd_trace(args: SceneArgs) -> anyhow::Result<()> {
    let scene = DemoScene::build(&args)?;
    let mut view = RenderView::new(
        &scene.window,
        BackendKind::Recording,
        read_opts(args.opts.as_deref())?,
    );
    render_frames(&mut view, args.frames.max(1))?;

    for event in view.trace() {
        match event {
            TraceEvent::Visit {
                op,
                prepass,
                class_name,
                object,
            } => {
                let phase = if *prepass { "pre " } else { "post" };
                println!("{op:?}\t{phase}\t{class_name}#{object}");
            }
            TraceEvent::Marker(name) => println!("-- {name}"),
        }
    }
    let stats = view.last_stats();
    eprintln!(
        "visits={} view_nodes={} skipped_nodes={}",
        stats.node_visits, stats.view_nodes, stats.skipped_nodes
    );
    scene.print_counts();
    Ok(())
}

fn render_frames(view: &mut RenderView, frames: u32) -> anyhow::Result<()> {
    for _ in 0..frames {
        let i = view.frames();
        let stats = view
            .render()
            .with_context(|| format!("render frame {i}"))?;
        eprintln!(
            "frame {i}: draws={} triangles={} pipeline_updates={}",
            stats.draws, stats.triangles, stats.pipeline_updates
        );
    }
    Ok(())
}

fn read_opts(path: Option<&Path>) -> anyhow::Result<RenderViewOpts> {
    let Some(path) = path else {
        return Ok(RenderViewOpts::default());
    };
    let f = File::open(path).with_context(|| format!("open opts '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parse opts '{}'", path.display()))
}

fn read_params(path: Option<&Path>) -> anyhow::Result<serde_json::Value> {
    let Some(path) = path else {
        return Ok(serde_json::json!({}));
    };
    let f = File::open(path).with_context(|| format!("open params '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parse params '{}'", path.display()))
}

/// cone -> shrink -> elevation -> mapper -> actor, one renderer.
struct DemoScene {
    window: Rc<RenderWindow>,
    cone: Node<ConeSource>,
    shrink: Node<ShrinkPolyData>,
    elevation: Node<ElevationFilter>,
    mapper: Rc<Mapper>,
}

impl DemoScene {
    fn build(args: &SceneArgs) -> anyhow::Result<Self> {
        let params = read_params(args.params.as_deref())?;

        let cone = Node::new(ConeSource {
            resolution: args.resolution,
            ..ConeSource::default()
        });
        let shrink = Node::new(ShrinkPolyData { shrink_factor: 0.8 });
        let elevation = Node::new(ElevationFilter {
            low_point: [-0.5, 0.0, 0.0],
            high_point: [0.5, 0.0, 0.0],
            scalar_range: [0.0, 1.0],
        });
        if let Some(v) = params.get("cone") {
            cone.set_values(v).context("cone params")?;
        }
        if let Some(v) = params.get("shrink") {
            shrink.set_values(v).context("shrink params")?;
        }
        if let Some(v) = params.get("elevation") {
            elevation.set_values(v).context("elevation params")?;
        }

        shrink.set_input_connection(&cone.output_port(0), 0)?;
        elevation.set_input_connection(&shrink.output_port(0), 0)?;
        let mapper = Mapper::new();
        mapper.set_input_connection(&elevation.output_port(0))?;

        let actor = Actor::with_mapper(Rc::clone(&mapper));
        actor.property().set_opacity(args.opacity);

        let renderer = Renderer::new();
        renderer.set_background(Rgb::new(0.07, 0.08, 0.11));
        renderer.add_view_prop(actor);
        renderer.reset_camera();
        renderer.camera().azimuth(30.0);

        let window = RenderWindow::new(args.width, args.height)?;
        window.add_renderer(renderer);

        Ok(Self {
            window,
            cone,
            shrink,
            elevation,
            mapper,
        })
    }

    fn print_counts(&self) {
        eprintln!(
            "computes: cone={} shrink={} elevation={} mapper={}",
            self.cone.compute_count(),
            self.shrink.compute_count(),
            self.elevation.compute_count(),
            self.mapper.node().compute_count()
        );
    }
}
