use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use ttd_core::{ExternalFiles, FileTable, SchemaFile, TextImportOptions, TypeRegistry};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "ttd-cli",
    about = "Convert type-tree text/JSON dumps to and from packed binary",
    version
)]
struct Cli {
    /// Debug-level logging (RUST_LOG overrides)
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Import a text dump into packed binary
    ImportText(ImportTextArgs),
    /// Import a JSON dump into packed binary
    ImportJson(ImportJsonArgs),
    /// Decode packed binary and print it as a text dump
    ExportText(ExportArgs),
    /// Decode packed binary and print it as a JSON dump
    ExportJson(ExportArgs),
    /// Import every .txt/.json dump under a directory
    Batch(BatchArgs),
}

#[derive(ClapArgs, Debug)]
struct ImportTextArgs {
    /// Input text dump
    #[arg(long, value_name = "DUMP")]
    input: PathBuf,
    /// Output binary path
    #[arg(long, value_name = "BIN")]
    output: PathBuf,
    /// Fail on unrecognized type names instead of skipping the line
    #[arg(long, default_value_t = false)]
    strict: bool,
}

#[derive(ClapArgs, Debug)]
struct ImportJsonArgs {
    /// Schema file (root template and managed types)
    #[arg(long, value_name = "SCHEMA")]
    schema: PathBuf,
    /// Input JSON dump
    #[arg(long, value_name = "JSON")]
    input: PathBuf,
    /// Output binary path
    #[arg(long, value_name = "BIN")]
    output: PathBuf,
}

#[derive(ClapArgs, Debug)]
struct ExportArgs {
    /// Schema file (root template and managed types)
    #[arg(long, value_name = "SCHEMA")]
    schema: PathBuf,
    /// Input binary
    #[arg(long, value_name = "BIN")]
    input: PathBuf,
    /// Optional output path; otherwise prints to stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct BatchArgs {
    /// Schema file used for JSON dumps
    #[arg(long, value_name = "SCHEMA")]
    schema: PathBuf,
    /// Directory to scan for dumps
    #[arg(long)]
    dir: PathBuf,
    /// Root for `<relative path>.<ext>.bin` outputs (defaults to next to each dump)
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// Worker threads (defaults to available parallelism)
    #[arg(long)]
    jobs: Option<usize>,
    /// Fail text dumps on unrecognized type names
    #[arg(long, default_value_t = false)]
    strict: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Cmd::ImportText(a) => cmd_import_text(a),
        Cmd::ImportJson(a) => cmd_import_json(a),
        Cmd::ExportText(a) => cmd_export(a, Format::Text),
        Cmd::ExportJson(a) => cmd_export(a, Format::Json),
        Cmd::Batch(a) => cmd_batch(a),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_schema(path: &Path) -> SchemaFile {
    SchemaFile::load(path).unwrap_or_else(|e| {
        eprintln!("error loading schema {}: {}", path.display(), e);
        std::process::exit(2);
    })
}

fn read_text(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("error reading {}: {}", path.display(), e);
        std::process::exit(2);
    })
}

fn write_output(path: &Path, data: &[u8]) {
    std::fs::write(path, data).unwrap_or_else(|e| {
        eprintln!("error writing {}: {}", path.display(), e);
        std::process::exit(5);
    });
    info!(path = %path.display(), bytes = data.len(), "wrote output");
}

fn cmd_import_text(args: ImportTextArgs) {
    let text = read_text(&args.input);
    let opts = TextImportOptions {
        strict: args.strict,
    };
    let data = ttd_core::text_to_bytes(&text, opts).unwrap_or_else(|e| {
        eprintln!("import error: {}", e);
        std::process::exit(4);
    });
    write_output(&args.output, &data);
}

fn cmd_import_json(args: ImportJsonArgs) {
    let schema = load_schema(&args.schema);
    let types = schema.type_registry();
    let text = read_text(&args.input);
    let value: serde_json::Value = serde_json::from_str(&text).unwrap_or_else(|e| {
        eprintln!("invalid JSON: {}", e);
        std::process::exit(3);
    });
    let data = ttd_core::json_to_bytes(&schema.root, &value, &types).unwrap_or_else(|e| {
        eprintln!("import error: {}", e);
        std::process::exit(4);
    });
    write_output(&args.output, &data);
}

#[derive(Debug, Clone, Copy)]
enum Format {
    Text,
    Json,
}

fn cmd_export(args: ExportArgs, format: Format) {
    let schema = load_schema(&args.schema);
    let types = schema.type_registry();
    let data = std::fs::read(&args.input).unwrap_or_else(|e| {
        eprintln!("error reading {}: {}", args.input.display(), e);
        std::process::exit(2);
    });
    let root = ttd_core::read_value(&schema.root, &data, &types).unwrap_or_else(|e| {
        eprintln!("decode error: {}", e);
        std::process::exit(3);
    });
    // Without a file table in the schema, id 0 still names the input file.
    let fallback = ExternalFiles {
        file_name: file_name_of(&args.input),
        externals: Vec::new(),
    };
    let files: &dyn FileTable = schema.files.as_ref().unwrap_or(&fallback);
    let res = match format {
        Format::Text => ttd_core::export_text(&root, Some(files)),
        Format::Json => ttd_core::export_json_string(&root),
    };
    let out = res.unwrap_or_else(|e| {
        eprintln!("export error: {}", e);
        std::process::exit(4);
    });
    match args.output {
        Some(path) => write_output(&path, out.as_bytes()),
        None => print!("{}", out),
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("file")
        .to_string()
}

fn find_dumps(dir: &Path) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| {
            p.is_file()
                && matches!(
                    p.extension().and_then(|s| s.to_str()),
                    Some("txt") | Some("json")
                )
        })
        .collect();
    out.sort();
    out
}

fn import_one(
    path: &Path,
    schema: &SchemaFile,
    types: &TypeRegistry,
    opts: TextImportOptions,
) -> Result<Vec<u8>, String> {
    let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let res = if path.extension().and_then(|s| s.to_str()) == Some("json") {
        let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| e.to_string())?;
        ttd_core::json_to_bytes(&schema.root, &value, types)
    } else {
        ttd_core::text_to_bytes(&text, opts)
    };
    res.map_err(|e| e.to_string())
}

/// `<dir>/a/dump.txt` becomes `<out>/a/dump.txt.bin`, or `<dir>/a/dump.txt.bin`
/// without an output directory. The source extension stays in the name so
/// `dump.txt` and `dump.json` never share a destination.
fn batch_dest(dir: &Path, path: &Path, out_dir: Option<&Path>) -> PathBuf {
    let base = match out_dir {
        Some(out) => out.join(path.strip_prefix(dir).unwrap_or(path)),
        None => path.to_path_buf(),
    };
    let mut name = base.into_os_string();
    name.push(".bin");
    PathBuf::from(name)
}

struct BatchJob<'a> {
    dir: &'a Path,
    out_dir: Option<&'a Path>,
    schema: &'a SchemaFile,
    types: &'a TypeRegistry,
    opts: TextImportOptions,
}

impl BatchJob<'_> {
    fn import_to_dest(&self, path: &Path) -> Result<PathBuf, String> {
        let dest = batch_dest(self.dir, path, self.out_dir);
        let data = import_one(path, self.schema, self.types, self.opts)?;
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        std::fs::write(&dest, data).map_err(|e| e.to_string())?;
        Ok(dest)
    }

    /// Imports `dumps` on up to `jobs` scoped threads; returns the failure count.
    fn run(&self, dumps: &[PathBuf], jobs: usize) -> usize {
        let failures = AtomicUsize::new(0);
        let chunk = dumps.len().div_ceil(jobs.max(1)).max(1);
        std::thread::scope(|s| {
            for part in dumps.chunks(chunk) {
                let failures = &failures;
                s.spawn(move || {
                    for path in part {
                        match self.import_to_dest(path) {
                            Ok(dest) => {
                                info!(src = %path.display(), dest = %dest.display(), "imported")
                            }
                            Err(e) => {
                                warn!(src = %path.display(), error = %e, "import failed");
                                eprintln!("error: {}: {}", path.display(), e);
                                failures.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                    }
                });
            }
        });
        failures.load(Ordering::Relaxed)
    }
}

fn cmd_batch(args: BatchArgs) {
    let schema = load_schema(&args.schema);
    let types = schema.type_registry();
    let dumps = find_dumps(&args.dir);
    if dumps.is_empty() {
        eprintln!("no .txt/.json dumps under {}", args.dir.display());
        std::process::exit(3);
    }
    let jobs = args
        .jobs
        .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
        .unwrap_or(1)
        .clamp(1, dumps.len());
    debug!(files = dumps.len(), jobs, "batch import");

    let job = BatchJob {
        dir: &args.dir,
        out_dir: args.out_dir.as_deref(),
        schema: &schema,
        types: &types,
        opts: TextImportOptions {
            strict: args.strict,
        },
    };
    let failed = job.run(&dumps, jobs);
    println!("imported {} of {} dumps", dumps.len() - failed, dumps.len());
    if failed > 0 {
        std::process::exit(6);
    }
}
