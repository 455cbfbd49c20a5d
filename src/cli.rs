use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum, error::ErrorKind};
use tracing::warn;

use crate::config::{RecordBoundary, TallyConfig};
use crate::constants::coordinator::{DEFAULT_MIN_SHARD_BYTES, DEFAULT_SHARDS_PER_SOURCE};
use crate::constants::sources::{DEFAULT_EXTENSION, STDIN_PATH};
use crate::coordinator::StreamCoordinator;
use crate::games::export_game_headers;
use crate::report::{OutputFormat, write_report};
use crate::source::{FileSource, ReaderSource, RecordSource, ShardSpan};
use crate::transport::fs::FileDiscovery;

type DynSource = Box<dyn RecordSource + 'static>;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
    Csv,
    Line,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Line => OutputFormat::Line,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BoundaryArg {
    Pgn,
    BlankLine,
}

impl From<BoundaryArg> for RecordBoundary {
    fn from(value: BoundaryArg) -> Self {
        match value {
            BoundaryArg::Pgn => RecordBoundary::PgnGame,
            BoundaryArg::BlankLine => RecordBoundary::BlankLine,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "pgn-tally",
    disable_help_subcommand = true,
    about = "Tally chess game results from PGN sources",
    long_about = "Count white wins, black wins, draws, and unknown results across PGN files, directories, or standard input, splitting the work across a bounded worker pool.",
    after_help = "With no PATH, or with '-', games are read from standard input. Directories are walked recursively for files with the configured extension."
)]
/// CLI for `pgn-tally`.
///
/// Common usage:
/// - Tally one file: `pgn-tally games.pgn`
/// - Tally a directory tree per source as CSV: `pgn-tally --per-source --format csv archive/`
/// - Split large files into byte ranges: `pgn-tally --shards-per-source 8 big.pgn`
struct TallyCli {
    #[arg(value_name = "PATH", help = "PGN files or directories; '-' reads standard input")]
    paths: Vec<PathBuf>,
    #[arg(
        long,
        value_enum,
        default_value = "text",
        help = "Report format"
    )]
    format: FormatArg,
    #[arg(long = "per-source", help = "Include per-source rows in the report")]
    per_source: bool,
    #[arg(
        long,
        value_parser = parse_positive_usize,
        help = "Worker threads (defaults to available parallelism)"
    )]
    workers: Option<usize>,
    #[arg(
        long = "shards-per-source",
        default_value_t = DEFAULT_SHARDS_PER_SOURCE,
        value_parser = parse_positive_usize,
        help = "Maximum byte-range shards per file"
    )]
    shards_per_source: usize,
    #[arg(
        long = "min-shard-bytes",
        default_value_t = DEFAULT_MIN_SHARD_BYTES,
        help = "Files smaller than this are never split"
    )]
    min_shard_bytes: u64,
    #[arg(
        long = "timeout-ms",
        value_name = "MS",
        help = "Per-shard time budget in milliseconds"
    )]
    timeout_ms: Option<u64>,
    #[arg(
        long,
        value_enum,
        default_value = "pgn",
        help = "Record boundary convention"
    )]
    boundary: BoundaryArg,
    #[arg(
        long,
        default_value = DEFAULT_EXTENSION,
        help = "File extension matched when walking directories"
    )]
    extension: String,
    #[arg(
        long = "follow-links",
        help = "Follow symbolic links when walking directories"
    )]
    follow_links: bool,
    #[arg(
        long,
        help = "Write each game's tag pairs as JSON lines instead of tallying"
    )]
    games: bool,
}

impl TallyCli {
    fn config(&self) -> TallyConfig {
        let mut config = TallyConfig::default()
            .with_shards_per_source(self.shards_per_source)
            .with_min_shard_bytes(self.min_shard_bytes)
            .with_shard_timeout(self.timeout_ms.map(Duration::from_millis))
            .with_boundary(self.boundary.into());
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        config
    }
}

/// Run `pgn-tally` with `args_iter` (excluding the program name), writing the
/// report to `out`.
///
/// Returns exit code 1 when sources were given and none could be read.
/// Usage errors come back as a boxed `clap::Error`.
pub fn run<I, W>(args_iter: I, out: &mut W) -> Result<ExitCode, Box<dyn Error>>
where
    I: Iterator<Item = String>,
    W: Write,
{
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let Some(cli) =
        parse_cli::<TallyCli, _>(std::iter::once("pgn-tally".to_string()).chain(args_iter))?
    else {
        return Ok(ExitCode::SUCCESS);
    };

    let discovery = |root: &PathBuf| {
        FileDiscovery::new(root, cli.extension.as_str()).with_follow_symlinks(cli.follow_links)
    };
    let sources = resolve_sources(&cli.paths, discovery);
    if cli.games {
        return export_games(&sources, cli.boundary.into(), out);
    }

    let mut coordinator = StreamCoordinator::new(cli.config());
    for source in sources {
        coordinator.register_source(source);
    }
    let report = coordinator.run()?;
    write_report(out, &report, cli.format.into(), cli.per_source)?;
    out.flush()?;

    Ok(if report.all_sources_failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Map path arguments onto sources in argument order.
///
/// No paths, or `-`, selects standard input (at most once). Directories expand
/// to every matching file beneath them; anything else becomes a file source
/// that reports itself unavailable if it cannot be read.
fn resolve_sources<F>(paths: &[PathBuf], discovery: F) -> Vec<DynSource>
where
    F: Fn(&PathBuf) -> FileDiscovery,
{
    if paths.is_empty() {
        return vec![Box::new(ReaderSource::stdin())];
    }
    let mut sources: Vec<DynSource> = Vec::new();
    let mut stdin_used = false;
    for path in paths {
        if path.as_os_str() == STDIN_PATH {
            if !stdin_used {
                sources.push(Box::new(ReaderSource::stdin()));
                stdin_used = true;
            }
            continue;
        }
        let files = discovery(path).files();
        if files.is_empty() {
            warn!(path = %path.display(), "no matching files found");
        }
        sources.extend(
            files
                .into_iter()
                .map(|file| Box::new(FileSource::new(file)) as DynSource),
        );
    }
    sources
}

fn export_games<W: Write>(
    sources: &[DynSource],
    boundary: RecordBoundary,
    out: &mut W,
) -> Result<ExitCode, Box<dyn Error>> {
    let mut failed = 0usize;
    for source in sources {
        let exported = source
            .open(&ShardSpan::Whole)
            .and_then(|reader| export_game_headers(reader, boundary, out));
        if let Err(err) = exported {
            warn!(source_id = %source.id(), error = %err, "game export failed");
            failed += 1;
        }
    }
    out.flush()?;
    Ok(if failed > 0 && failed == sources.len() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .parse::<usize>()
        .map_err(|_| format!("Could not parse '{raw}' as a positive integer"))?;
    if parsed == 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn args(items: &[&str]) -> impl Iterator<Item = String> {
        items
            .iter()
            .map(|item| item.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn parse_cli_maps_flags_onto_config() {
        let cli = parse_cli::<TallyCli, _>([
            "pgn-tally",
            "--workers",
            "3",
            "--shards-per-source",
            "4",
            "--min-shard-bytes",
            "10",
            "--timeout-ms",
            "250",
            "--boundary",
            "blank-line",
            "a.pgn",
        ])
        .unwrap()
        .expect("parsed");
        let config = cli.config();
        assert_eq!(config.workers, 3);
        assert_eq!(config.shards_per_source, 4);
        assert_eq!(config.min_shard_bytes, 10);
        assert_eq!(config.shard_timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.boundary, RecordBoundary::BlankLine);
        assert_eq!(cli.paths, vec![PathBuf::from("a.pgn")]);
    }

    #[test]
    fn parse_cli_rejects_zero_workers_and_unknown_formats() {
        let err = parse_cli::<TallyCli, _>(["pgn-tally", "--workers", "0"]).unwrap_err();
        assert!(err.downcast_ref::<clap::Error>().is_some());
        assert!(parse_cli::<TallyCli, _>(["pgn-tally", "--format", "xml"]).is_err());
    }

    #[test]
    fn help_returns_none() {
        assert!(parse_cli::<TallyCli, _>(["pgn-tally", "--help"]).unwrap().is_none());
    }

    fn source_ids(paths: &[PathBuf]) -> Vec<String> {
        resolve_sources(paths, |root: &PathBuf| {
            FileDiscovery::new(root, DEFAULT_EXTENSION)
        })
        .iter()
        .map(|source| source.id().to_string())
        .collect()
    }

    #[test]
    fn no_paths_reads_stdin() {
        assert_eq!(source_ids(&[]), ["stdin"]);
        assert_eq!(source_ids(&[PathBuf::from("-")]), ["stdin"]);
    }

    #[test]
    fn repeated_dash_is_one_stdin_source_in_first_position() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.pgn");
        fs::write(&file, "[Result \"1-0\"]\n").unwrap();

        let ids = source_ids(&[PathBuf::from("-"), file.clone(), PathBuf::from("-")]);
        assert_eq!(ids, vec!["stdin".to_string(), file.display().to_string()]);

        let ids = source_ids(&[file.clone(), PathBuf::from("-"), PathBuf::from("-")]);
        assert_eq!(ids, vec![file.display().to_string(), "stdin".to_string()]);
    }

    #[test]
    fn run_tallies_files_and_directories() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.pgn"), "[Result \"1-0\"]\n\n1. e4 1-0\n").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(
            dir.path().join("nested/b.pgn"),
            "[Result \"0-1\"]\n\n[Result \"1/2-1/2\"]\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "[Result \"1-0\"]\n").unwrap();

        let root = dir.path().display().to_string();
        let mut out = Vec::new();
        let code = run(args(&["--format", "line", &root]), &mut out).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(String::from_utf8(out).unwrap(), "3 1 1 1 0\n");
    }

    #[test]
    fn run_fails_when_every_source_is_unreadable() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.pgn").display().to_string();
        let mut out = Vec::new();
        let code = run(args(&["--format", "json", &missing]), &mut out).unwrap();
        assert_eq!(code, ExitCode::FAILURE);
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["total"], 0);
        assert_eq!(json["failures"][0]["kind"], "source_unavailable");
    }

    #[test]
    fn run_exports_game_headers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("games.pgn");
        fs::write(
            &path,
            "[Event \"A\"]\n[Result \"1-0\"]\n\n1. e4 1-0\n\n[Event \"B\"]\n\n1. d4 *\n",
        )
        .unwrap();
        let mut out = Vec::new();
        let code = run(
            args(&["--games", &path.display().to_string()]),
            &mut out,
        )
        .unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"event\":\"A\",\"result\":\"1-0\"}\n"
        );
    }
}
