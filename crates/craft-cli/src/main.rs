use clap::{Args as ClapArgs, Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};

use craft_core::session::{EditSession, SessionEnd, SessionOpts};
use craft_core::{Document, DocumentTree, SchemaKind};

mod console;

#[derive(Parser, Debug)]
#[command(
    name = "containcraft",
    about = "View and edit container/orchestration config documents by path",
    version
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print a document and its tree view
    Show(ShowArgs),
    /// Get the value at a path
    Get(GetArgs),
    /// List keys or indices directly under a path
    Keys(KeysArgs),
    /// Set a value at a path; prints the result or writes with --out / --in-place
    Set(ValueArgs),
    /// Append a value to the list at a path
    Append(ValueArgs),
    /// Delete the key or list element at a path
    Delete(DeleteArgs),
    /// Interactive edit session with undo and preview
    Edit(EditArgs),
    /// Create a document from a schema template
    New(NewArgs),
    /// Check a document against a schema template
    Validate(ValidateArgs),
    /// Find YAML/JSON documents under a directory
    Find(FindArgs),
}

#[derive(ClapArgs, Debug)]
struct ShowArgs {
    /// Document to load (.yaml, .yml or .json)
    path: PathBuf,
    /// Only print the tree view
    #[arg(long, default_value_t = false)]
    tree_only: bool,
}

#[derive(ClapArgs, Debug)]
struct GetArgs {
    /// Document to load
    path: PathBuf,
    /// Path expression, e.g. services.web.ports[0]
    #[arg(long, default_value = "")]
    at: String,
    /// Print as JSON instead of YAML
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(ClapArgs, Debug)]
struct KeysArgs {
    /// Document to load
    path: PathBuf,
    /// Path expression; empty for the root
    #[arg(long, default_value = "")]
    at: String,
}

#[derive(ClapArgs, Debug)]
struct OutputArgs {
    /// Write the result to this file instead of printing it
    #[arg(long, conflicts_with = "in_place")]
    out: Option<PathBuf>,
    /// Overwrite the input document
    #[arg(long, default_value_t = false)]
    in_place: bool,
    /// Skip the zip backup taken before overwriting a file
    #[arg(long, default_value_t = false)]
    no_backup: bool,
}

#[derive(ClapArgs, Debug)]
struct ValueArgs {
    /// Document to load
    path: PathBuf,
    /// Path expression, e.g. services.web.restart
    #[arg(long)]
    at: String,
    /// New value; YAML scalars and flow collections ([a, b], {k: v}) are typed
    #[arg(long)]
    value: String,
    /// Store the value as a string verbatim
    #[arg(long, default_value_t = false)]
    string: bool,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(ClapArgs, Debug)]
struct DeleteArgs {
    /// Document to load
    path: PathBuf,
    /// Path expression, e.g. services.web.ports[1]
    #[arg(long)]
    at: String,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(ClapArgs, Debug)]
struct EditArgs {
    /// Document to edit
    path: PathBuf,
    /// Save to this file instead of the input document
    #[arg(long)]
    out: Option<PathBuf>,
    /// Maximum undo levels kept (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    max_history: usize,
    /// Store typed values as strings verbatim
    #[arg(long, default_value_t = false)]
    string: bool,
    /// Skip the zip backup taken before saving
    #[arg(long, default_value_t = false)]
    no_backup: bool,
}

#[derive(ClapArgs, Debug)]
struct NewArgs {
    /// Schema: docker-compose, kubernetes, kafka or custom
    #[arg(long)]
    schema: SchemaKind,
    /// Output file; `.yaml` is appended when no YAML/JSON extension is given
    out: PathBuf,
    /// Replace an existing file
    #[arg(long, default_value_t = false)]
    force: bool,
}

#[derive(ClapArgs, Debug)]
struct ValidateArgs {
    /// Document to check
    path: PathBuf,
    /// Schema: docker-compose, kubernetes, kafka or custom
    #[arg(long)]
    schema: SchemaKind,
}

#[derive(ClapArgs, Debug)]
struct FindArgs {
    /// Directory to search (defaults to the current directory)
    dir: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Cmd::Show(a) => cmd_show(a),
        Cmd::Get(a) => cmd_get(a),
        Cmd::Keys(a) => cmd_keys(a),
        Cmd::Set(a) => cmd_value(a, Op::Set),
        Cmd::Append(a) => cmd_value(a, Op::Append),
        Cmd::Delete(a) => cmd_delete(a),
        Cmd::Edit(a) => cmd_edit(a),
        Cmd::New(a) => cmd_new(a),
        Cmd::Validate(a) => cmd_validate(a),
        Cmd::Find(a) => cmd_find(a),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_or_exit(path: &Path) -> Document {
    match craft_core::load(path) {
        Ok(Some(doc)) => doc,
        Ok(None) => {
            eprintln!("error: no document path given");
            std::process::exit(2);
        }
        Err(e) => {
            eprintln!("error: {}: {}", path.display(), e);
            std::process::exit(2);
        }
    }
}

fn yaml_or_exit(doc: &Document) -> String {
    craft_core::to_yaml_string(doc).unwrap_or_else(|e| {
        eprintln!("error: {}", e);
        std::process::exit(5);
    })
}

fn cmd_show(args: ShowArgs) {
    let doc = load_or_exit(&args.path);
    if !args.tree_only {
        print!("{}", yaml_or_exit(&doc));
        println!("---");
    }
    println!("{}", DocumentTree::from_document(&doc).render());
}

fn cmd_get(args: GetArgs) {
    let doc = load_or_exit(&args.path);
    let path = parse_path_or_exit(&args.at);
    match craft_core::get(&doc, &path) {
        Ok(v) if args.json => match serde_json::to_string_pretty(v) {
            Ok(s) => println!("{}", s),
            Err(e) => {
                eprintln!("error: {}", e);
                std::process::exit(5);
            }
        },
        Ok(v) => print!("{}", yaml_or_exit(v)),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(3);
        }
    }
}

fn cmd_keys(args: KeysArgs) {
    let doc = load_or_exit(&args.path);
    let path = parse_path_or_exit(&args.at);
    match craft_core::child_keys(&doc, &path) {
        Ok(children) => {
            for c in children {
                println!(
                    "{}\t{}{}",
                    c.key_or_index,
                    c.kind,
                    c.len.map(|n| format!("\t(len={})", n)).unwrap_or_default()
                );
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(3);
        }
    }
}

fn parse_path_or_exit(text: &str) -> craft_core::DocPath {
    craft_core::DocPath::parse(text).unwrap_or_else(|e| {
        eprintln!("error: {}", e);
        std::process::exit(3);
    })
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Set,
    Append,
}

fn typed_value(text: &str, force_string: bool) -> Document {
    if force_string {
        Document::from(text)
    } else {
        craft_core::parse_value(text)
    }
}

fn cmd_value(args: ValueArgs, op: Op) {
    let doc = load_or_exit(&args.path);
    let mut session = EditSession::new(doc);
    let value = typed_value(&args.value, args.string);
    let res = match op {
        Op::Set => session.set(&args.at, value),
        Op::Append => session.append(&args.at, value),
    };
    if let Err(e) = res {
        eprintln!("error: {}", e);
        std::process::exit(4);
    }
    emit(&args.path, &args.output, session.commit());
}

fn cmd_delete(args: DeleteArgs) {
    let doc = load_or_exit(&args.path);
    let mut session = EditSession::new(doc);
    if let Err(e) = session.delete(&args.at) {
        eprintln!("error: {}", e);
        std::process::exit(4);
    }
    emit(&args.path, &args.output, session.commit());
}

fn emit(input: &Path, output: &OutputArgs, doc: Document) {
    let target = if output.in_place {
        Some(input.to_path_buf())
    } else {
        output.out.clone()
    };
    match target {
        Some(path) => write_or_exit(&path, &doc, !output.no_backup),
        None => print!("{}", yaml_or_exit(&doc)),
    }
}

fn write_or_exit(path: &Path, doc: &Document, backup: bool) {
    if backup && path.is_file() {
        match craft_core::zip_backup(path) {
            Ok(zip) => eprintln!("backup: {}", zip.display()),
            Err(e) => {
                eprintln!("error: backup failed: {}", e);
                std::process::exit(5);
            }
        }
    }
    if let Err(e) = craft_core::save(path, doc) {
        eprintln!("error writing {}: {}", path.display(), e);
        std::process::exit(5);
    }
}

fn cmd_edit(args: EditArgs) {
    let doc = load_or_exit(&args.path);
    let session = EditSession::with_opts(
        doc,
        SessionOpts {
            max_history: args.max_history,
        },
    );
    let stdin = io::stdin();
    let mut frontend = console::Console::new(stdin.lock(), io::stdout(), args.string);
    match craft_core::run(session, &mut frontend) {
        SessionEnd::Committed(doc) => {
            let target = args.out.unwrap_or(args.path);
            write_or_exit(&target, &doc, !args.no_backup);
            println!("Changes saved to {}", target.display());
        }
        SessionEnd::Cancelled => println!("Discarding changes"),
    }
}

fn cmd_new(args: NewArgs) {
    let mut out = args.out;
    if !matches!(
        out.extension().and_then(|s| s.to_str()),
        Some("yaml" | "yml" | "json")
    ) {
        let mut name = out.into_os_string();
        name.push(".yaml");
        out = PathBuf::from(name);
    }
    if out.exists() && !args.force {
        eprintln!("error: {} exists (use --force to replace)", out.display());
        std::process::exit(5);
    }
    let doc = args.schema.default_structure();
    if let Err(e) = args.schema.validate(&doc) {
        eprintln!("error: {}", e);
        std::process::exit(4);
    }
    write_or_exit(&out, &doc, false);
    println!("Saved {} template to {}", args.schema.title(), out.display());
}

fn cmd_validate(args: ValidateArgs) {
    let doc = load_or_exit(&args.path);
    match args.schema.validate(&doc) {
        Ok(()) => println!("{}: valid {} document", args.path.display(), args.schema),
        Err(e) => {
            eprintln!("{}: {}", args.path.display(), e);
            std::process::exit(4);
        }
    }
}

fn cmd_find(args: FindArgs) {
    let dir = args.dir.unwrap_or_else(|| PathBuf::from("."));
    if !dir.is_dir() {
        eprintln!("error: not a directory: {}", dir.display());
        std::process::exit(2);
    }
    for p in craft_core::find_documents(&dir) {
        println!("{}", p.display());
    }
}
