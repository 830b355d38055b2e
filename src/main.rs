use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use zge_project_converter::{
    config::{self, ConverterConfig},
    diagnostics::Level,
    pipeline,
    source::TemplateLocation,
};

#[derive(Debug, Default, Clone)]
struct Cli {
    input: Option<PathBuf>,
    config: Option<PathBuf>,
    template: Option<String>,
    channels: Vec<String>,
    output: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    title: Option<String>,
    author: Option<String>,
}

const USAGE: &str = "supported: --input <shader.glsl>, --config <config.json>, --template <path|url>, \
                     --channel <N>=<none|feedback|bitmap1|new>, --output <file>, --output-dir <dir>, \
                     --title <text>, --author <text>";

fn parse_cli(args: &[String]) -> Result<Cli> {
    let mut cli = Cli::default();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = || {
            args.get(i + 1)
                .cloned()
                .ok_or_else(|| anyhow!("missing value for {flag}"))
        };
        match flag {
            "--input" => cli.input = Some(PathBuf::from(value()?)),
            "--config" => cli.config = Some(PathBuf::from(value()?)),
            "--template" => cli.template = Some(value()?),
            "--channel" => cli.channels.push(value()?),
            "--output" => cli.output = Some(PathBuf::from(value()?)),
            "--outputdir" | "--output-dir" => cli.output_dir = Some(PathBuf::from(value()?)),
            "--title" => cli.title = Some(value()?),
            "--author" => cli.author = Some(value()?),
            other => return Err(anyhow!("unknown argument: {other} ({USAGE})")),
        }
        i += 2;
    }
    Ok(cli)
}

fn resolve_config(cli: &Cli) -> Result<ConverterConfig> {
    let mut cfg = match cli.config.as_deref() {
        Some(path) => config::load_config_from_path(path)?,
        None => ConverterConfig::default(),
    };
    if let Some(t) = &cli.template {
        cfg.template = t.clone();
    }
    if let Some(t) = &cli.title {
        cfg.default_title = t.clone();
    }
    if let Some(a) = &cli.author {
        cfg.default_author = a.clone();
    }
    for assignment in &cli.channels {
        cfg.channels
            .apply_assignment(assignment)
            .with_context(|| format!("invalid --channel {assignment}"))?;
    }
    Ok(cfg)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_cli(&argv)?;
    let cfg = resolve_config(&cli)?;

    let input = cli
        .input
        .as_deref()
        .ok_or_else(|| anyhow!("--input <shader> is required ({USAGE})"))?;
    let source = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read shader source {}", input.display()))?;

    let request = cfg.request(source);
    let location: TemplateLocation = cfg.template_location();

    let conversion = match pollster::block_on(pipeline::convert(&request, &location)) {
        Ok(c) => c,
        Err(failure) => {
            for d in &failure.diagnostics {
                eprintln!("{d}");
            }
            return Err(failure.into());
        }
    };

    for d in &conversion.diagnostics {
        match d.level {
            Level::Info => println!("{d}"),
            Level::Warning | Level::Error => eprintln!("{d}"),
        }
    }

    let out_path = match (cli.output, cli.output_dir) {
        (Some(path), _) => path,
        (None, dir) => dir
            .unwrap_or_else(|| PathBuf::from("."))
            .join(conversion.suggested_file_name()),
    };
    std::fs::write(&out_path, &conversion.document)
        .with_context(|| format!("failed to write project {}", out_path.display()))?;
    println!("[convert] saved: {}", out_path.display());
    Ok(())
}
