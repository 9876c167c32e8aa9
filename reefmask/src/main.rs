use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use reefmask::{Annotation, Config, LabelRegistry};

const USAGE: &str = "usage: reefmask <label-map> <width> <height> <output.tsv> \
[--scale <mm-per-px>] [--config <file>] [--labels <file>] [--log-dir <dir>]";

#[derive(Debug)]
struct Args {
    label_map: PathBuf,
    reference_size: (usize, usize),
    output: PathBuf,
    scale: f64,
    config: Option<PathBuf>,
    labels: Option<PathBuf>,
    log_dir: PathBuf,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mut positional = Vec::new();
        let mut scale: f64 = 1.0;
        let mut config = None;
        let mut labels = None;
        let mut log_dir = PathBuf::from("logs");

        while let Some(arg) = args.next() {
            let mut value = |name: &str| {
                args.next()
                    .with_context(|| format!("missing value for {name}\n{USAGE}"))
            };
            match arg.as_str() {
                "--scale" => {
                    scale = value("--scale")?
                        .parse()
                        .context("--scale must be a number")?
                }
                "--config" => config = Some(PathBuf::from(value("--config")?)),
                "--labels" => labels = Some(PathBuf::from(value("--labels")?)),
                "--log-dir" => log_dir = PathBuf::from(value("--log-dir")?),
                _ if arg.starts_with("--") => bail!("unknown option {arg}\n{USAGE}"),
                _ => positional.push(arg),
            }
        }

        let [label_map, width, height, output] = <[String; 4]>::try_from(positional)
            .map_err(|_| anyhow::anyhow!("expected 4 positional arguments\n{USAGE}"))?;

        Ok(Self {
            label_map: PathBuf::from(label_map),
            reference_size: (
                width.parse().context("width must be an integer")?,
                height.parse().context("height must be an integer")?,
            ),
            output: PathBuf::from(output),
            scale,
            config,
            labels,
            log_dir,
        })
    }
}

fn main() -> Result<()> {
    let args = Args::parse(std::env::args().skip(1))?;

    common::log_setup::setup_logging("info", &args.log_dir, "reefmask");

    let config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    let labels = match &args.labels {
        Some(path) => LabelRegistry::from_file(path)
            .with_context(|| format!("loading labels {}", path.display()))?,
        None => LabelRegistry::default(),
    };

    let mut annotation = Annotation::new(labels, config);
    let blobs = annotation.import_label_map_file(&args.label_map, args.reference_size)?;
    for blob in blobs {
        annotation.add_blob(blob);
    }
    annotation.statistics();

    let file = File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    annotation.export_data_table(args.scale, BufWriter::new(file))?;

    tracing::info!(output = %args.output.display(), "done");
    Ok(())
}
