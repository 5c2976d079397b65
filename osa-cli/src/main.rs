//! osa CLI - Run filesystem scripts against the host or an in-memory OS.
//!
//! Usage:
//!   osa [script] [-- command args]
//!
//! Examples:
//!   osa setup.osa                          # Run a script on the host
//!   osa --backend mem setup.osa            # Run it in memory instead
//!   osa --backend mem --seed fixture.zip -- ls
//!   echo "mkdir -p a/b" | osa --backend mem --export out.zip

mod script;

use std::fs::File;
use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use osa_core::fs::{join, SEPARATOR};
use osa_core::{ExitRequest, HostOs, Layout, MemOs, Os};
use script::Interpreter;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    /// The real filesystem
    Host,
    /// A fresh in-memory filesystem
    Mem,
}

/// Filesystem script runner
#[derive(Parser, Debug)]
#[command(name = "osa")]
#[command(about = "Run filesystem scripts against the host or an in-memory OS")]
struct Args {
    /// Script file to run (reads stdin when omitted and no command is given)
    script: Option<PathBuf>,

    /// Which OS implementation to run against
    #[arg(short, long, value_enum, default_value = "host", env = "OSA_BACKEND")]
    backend: Backend,

    /// JSON file describing the in-memory directory layout
    #[arg(long, env = "OSA_LAYOUT")]
    layout: Option<PathBuf>,

    /// ZIP archive to load into the in-memory filesystem
    #[arg(long)]
    seed: Option<PathBuf>,

    /// Directory the seed archive is unpacked into (default: working directory)
    #[arg(long, requires = "seed")]
    seed_at: Option<String>,

    /// Write the in-memory filesystem to a ZIP archive when done
    #[arg(long)]
    export: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Log filter, e.g. "debug" or "osa_core=trace" (overrides RUST_LOG)
    #[arg(long, env = "OSA_LOG")]
    log_level: Option<String>,

    /// Single command to run instead of a script
    #[arg(last = true)]
    command: Vec<String>,
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::from_default_env(),
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn load_script(args: &Args) -> io::Result<Vec<String>> {
    if !args.command.is_empty() {
        return Ok(vec![shell_words::join(&args.command)]);
    }
    let text = match &args.script {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            text
        }
    };
    Ok(text.lines().map(str::to_owned).collect())
}

fn build_mem(args: &Args) -> Result<MemOs, Box<dyn std::error::Error>> {
    let layout = match &args.layout {
        Some(path) => Layout::from_json(&std::fs::read_to_string(path)?)?,
        None => Layout::default(),
    };
    let mut os = MemOs::with_layout(layout)?;

    if let Some(seed) = &args.seed {
        let wd = os.getwd()?;
        let at = match &args.seed_at {
            Some(at) if at.starts_with(SEPARATOR) => at.clone(),
            Some(at) => join(&wd, at),
            None => wd,
        };
        let files = os.import_zip(File::open(seed)?, &at)?;
        info!(seed = %seed.display(), at = %at, files, "seeded");
    }
    Ok(os)
}

/// Queue `input` on the in-memory stdin.
fn forward_stdin(os: &MemOs, mut input: impl Read) -> io::Result<u64> {
    let (mut stdin, _, _) = os.stdio().ends();
    io::copy(&mut input, &mut stdin)
}

fn run_mem(args: &Args, lines: &[String]) -> Result<ExitRequest, Box<dyn std::error::Error>> {
    let mut os = build_mem(args)?;

    // When the script came from stdin it has been consumed already.
    let script_elsewhere = args.script.is_some() || !args.command.is_empty();
    if script_elsewhere && !io::stdin().is_terminal() {
        forward_stdin(&os, io::stdin().lock())?;
    }
    let request = Interpreter::new(&mut os, args.json).run(lines);
    os.exit(request);

    // Hand captured output to the real streams.
    io::stdout().write_all(&os.stdio().stdout.contents())?;
    io::stderr().write_all(&os.stdio().stderr.contents())?;

    if let Some(path) = &args.export {
        let files = os.export_zip("/", File::create(path)?)?;
        info!(export = %path.display(), files, "exported");
    }
    Ok(request)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref());

    if args.backend == Backend::Host && (args.seed.is_some() || args.export.is_some()) {
        return Err("--seed and --export need --backend mem".into());
    }

    let lines = load_script(&args)?;
    let request = match args.backend {
        Backend::Host => Interpreter::new(&mut HostOs::new(), args.json).run(&lines),
        Backend::Mem => run_mem(&args, &lines)?,
    };

    io::stdout().flush()?;
    if !request.is_success() {
        HostOs::exit_process(request);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn seed_archive(dir: &tempfile::TempDir) -> PathBuf {
        let source = MemOs::with_files([("/home/proj/notes.txt", "seeded")]).unwrap();
        let mut archive = Cursor::new(Vec::new());
        source.export_zip("/home/proj", &mut archive).unwrap();

        let path = dir.path().join("seed.zip");
        std::fs::write(&path, archive.into_inner()).unwrap();
        path
    }

    fn mem_args(extra: &[&str]) -> Args {
        let mut argv = vec!["osa", "--backend", "mem"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_seed_at_relative_resolves_against_workdir() {
        let dir = tempfile::tempdir().unwrap();
        let seed = seed_archive(&dir);
        let seed = seed.to_str().unwrap();

        let os = build_mem(&mem_args(&["--seed", seed, "--seed-at", "fixtures"])).unwrap();
        assert_eq!(os.read_file("/home/fixtures/notes.txt").unwrap(), b"seeded");

        let os = build_mem(&mem_args(&["--seed", seed, "--seed-at", "../srv/./data"])).unwrap();
        assert_eq!(os.read_file("/srv/data/notes.txt").unwrap(), b"seeded");
    }

    #[test]
    fn test_seed_defaults_to_workdir() {
        let dir = tempfile::tempdir().unwrap();
        let seed = seed_archive(&dir);

        let os = build_mem(&mem_args(&["--seed", seed.to_str().unwrap()])).unwrap();
        assert_eq!(os.read_file("/home/notes.txt").unwrap(), b"seeded");

        let os = build_mem(&mem_args(&["--seed", seed.to_str().unwrap(), "--seed-at", "/temp/in"]))
            .unwrap();
        assert_eq!(os.read_file("/temp/in/notes.txt").unwrap(), b"seeded");
    }

    #[test]
    fn test_forwarded_stdin_feeds_write() {
        let mut os = build_mem(&mem_args(&[])).unwrap();
        assert_eq!(forward_stdin(&os, Cursor::new(b"from the pipe".to_vec())).unwrap(), 13);

        let request = Interpreter::new(&mut os, false).run(["write /temp/out"]);
        assert!(request.is_success());
        assert_eq!(os.read_file("/temp/out").unwrap(), b"from the pipe");
    }
}
