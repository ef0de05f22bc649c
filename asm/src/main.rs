use std::{
    fs::File,
    io::{self, BufWriter},
    process::ExitCode,
};

use color_print::ceprintln;
use tracing::Level;
use xpvm_asm::{assemble, Config, Console, Error, Program};

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {author}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, clap::Parser)]
#[clap(author, version, about, help_template = HELP_TEMPLATE)]
struct Args {
    /// Parsed program (YAML)
    #[clap(default_value = "main.yaml")]
    input: String,

    /// Output file
    #[clap(short, long, default_value = "main.obj")]
    output: String,

    /// Config file (YAML)
    #[clap(short, long)]
    config: Option<String>,

    /// List defined labels between the passes
    #[clap(short, long)]
    labels: bool,

    /// Disable colored diagnostics
    #[clap(long)]
    no_color: bool,

    /// One of `TRACE`, `DEBUG`, `INFO`, `WARN`, or `ERROR`
    #[clap(long, default_value_t = Level::WARN)]
    log_level: Level,
}

fn main() -> ExitCode {
    use clap::Parser;

    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(io::stderr)
        .init();

    match run(&args) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(errors) => {
            ceprintln!("<r,s>{} error(s)</>, no output written", errors);
            ExitCode::FAILURE
        }
        Err(e) => {
            ceprintln!("<r,s>fatal</>: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<usize, Error> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config {
            color: true,
            ..Config::default()
        },
    };
    config.list_labels |= args.labels;
    config.color &= !args.no_color;

    let program = Program::load(&args.input)?;
    tracing::info!("{}: {} functions", args.input, program.functions.len());

    // assemble into memory so a failed run leaves no partial object behind
    let mut object = Vec::new();
    let errors = assemble(
        &program,
        config.clone(),
        Box::new(Console::new(config.color)),
        &mut object,
    )?;
    if errors > 0 {
        return Ok(errors);
    }

    let file = File::create(&args.output).map_err(|e| Error::FileCreate(args.output.clone(), e))?;
    let mut out = BufWriter::new(file);
    io::Write::write_all(&mut out, &object)?;
    io::Write::flush(&mut out)?;
    tracing::info!("{}: {} bytes", args.output, object.len());
    Ok(0)
}
