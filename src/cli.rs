use crate::config::load_config;
use crate::layout::LayoutMode;
use crate::layout_dump::{LayoutDump, write_layout_dump};
use crate::order::OrderMode;
use crate::persist::{JsonFileStore, StateStore};
use crate::session::{LabelEdit, Session};
use crate::surface::HeadlessSurface;
use crate::theme::Theme;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, fmt};

#[derive(Parser, Debug)]
#[command(name = "fdiag", version, about = "Feature catalog diagram layout")]
pub struct Cli {
    /// Verbosity: -d info, -dd debug, -ddd trace
    #[arg(short = 'd', long = "debug", action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Lay out a catalog and write the positioned element list
    Layout(LayoutArgs),
    /// Write the element list with edge colors, without layout
    Elements(ElementsArgs),
    /// Rename a domain or feature and write the updated catalog
    Edit(EditArgs),
}

#[derive(Args, Debug)]
pub struct LayoutArgs {
    /// Catalog document (JSON or JSON5), or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub mode: Option<LayoutMode>,

    #[arg(long, value_enum)]
    pub order: Option<OrderMode>,

    /// Saved view state; read before layout, written after
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Config JSON file
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Ignore saved positions and lay out from scratch
    #[arg(long)]
    pub relayout: bool,

    /// Output file. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ElementsArgs {
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Config JSON file
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Color edges for the dark theme, overriding the configured one
    #[arg(long)]
    pub dark: bool,

    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Config JSON file
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Node id, e.g. `domain__payments` or a feature id
    #[arg(long)]
    pub node: String,

    #[arg(long)]
    pub label: String,

    /// Output file for the updated catalog. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.debug);
    match cli.command {
        Command::Layout(args) => run_layout(args),
        Command::Elements(args) => run_elements(args),
        Command::Edit(args) => run_edit(args),
    }
}

fn run_layout(args: LayoutArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let input = read_input(args.input.as_deref())?;
    let mut session = Session::from_text(&input, config)?;
    let mut store = args.state.clone().map(JsonFileStore::new);

    if let Some(store) = &store {
        match store.load() {
            Ok(Some(state)) => {
                session.restore(state);
            }
            Ok(None) => {}
            Err(err) => warn!(path = %store.path().display(), "ignoring unreadable state: {err}"),
        }
    }

    let mut changed = args.relayout;
    if let Some(mode) = args.mode {
        changed |= mode != session.layout_mode();
        session.set_layout_mode(mode);
    }
    if let Some(order) = args.order {
        changed |= order != session.order_mode();
        session.set_order_mode(order);
    }
    if changed {
        session.reset_positions();
    }

    let mut viewport = session.take_pending_viewport();
    if session.needs_layout() {
        let outcome = session.run_layout_blocking(&mut HeadlessSurface::new())?;
        if !outcome.report.converged {
            warn!(
                iterations = outcome.report.iterations,
                "overlap pass stopped before every overlap was cleared"
            );
        }
        viewport = viewport.or(outcome.viewport);
    }

    let dump = LayoutDump::from_session(&session);
    match args.output.as_deref() {
        Some(path) => write_layout_dump(path, &dump)?,
        None => write_output(&serde_json::to_string_pretty(&dump)?, None)?,
    }

    if let Some(store) = &mut store {
        store
            .save(&session.snapshot(viewport))
            .with_context(|| format!("writing state to {}", store.path().display()))?;
    }
    Ok(())
}

fn run_elements(args: ElementsArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let input = read_input(args.input.as_deref())?;
    let session = Session::from_text(&input, config)?;
    let theme = if args.dark { Theme::Dark } else { session.config().theme };
    let dump = LayoutDump::from_store(&session, &session.geometries(), theme);
    write_output(&serde_json::to_string_pretty(&dump)?, args.output.as_deref())
}

fn run_edit(args: EditArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let input = read_input(args.input.as_deref())?;
    let mut session = Session::from_text(&input, config)?;
    match session.edit_label(&args.node, &args.label)? {
        LabelEdit::Updated => info!(node = %args.node, "label updated"),
        LabelEdit::Unchanged => info!(node = %args.node, "label unchanged, nothing to write"),
    }
    write_output(&session.document().to_pretty_json(), args.output.as_deref())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()));
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn write_output(contents: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, contents)
            .with_context(|| format!("writing {}", path.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(contents.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let fmt_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_filter(filter);
    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_layout_flags() {
        let cli = Cli::try_parse_from([
            "fdiag", "-dd", "layout", "-i", "catalog.json", "--mode", "tree-file", "--order",
            "tags-desc",
        ])
        .unwrap();
        assert_eq!(cli.debug, 2);
        let Command::Layout(args) = cli.command else {
            panic!("expected layout command");
        };
        assert_eq!(args.mode, Some(LayoutMode::TreeFile));
        assert_eq!(args.order, Some(OrderMode::TagsDesc));
        assert!(args.state.is_none());
    }

    #[test]
    fn layout_writes_dump_and_state() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("catalog.json5");
        let output = dir.path().join("layout.json");
        let state = dir.path().join("state.json");
        std::fs::write(
            &input,
            "{ domains: [{ id: 'auth', features: [{ id: 'login' }] }], // json5\n relationships: [] }",
        )
        .unwrap();
        let args = LayoutArgs {
            input: Some(input),
            mode: Some(LayoutMode::TreeFile),
            order: None,
            state: Some(state.clone()),
            config: None,
            relayout: false,
            output: Some(output.clone()),
        };
        run_layout(args).unwrap();

        let dump: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(dump["nodes"].as_array().unwrap().len(), 2);
        let saved = JsonFileStore::new(&state).load().unwrap().unwrap();
        assert_eq!(saved.positions.len(), 2);
        assert_eq!(saved.layout_mode, Some(LayoutMode::TreeFile));
    }

    #[test]
    fn elements_use_configured_theme() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("catalog.json");
        let config = dir.path().join("config.json");
        let output = dir.path().join("elements.json");
        std::fs::write(&input, r#"{ "domains": [{ "id": "auth", "features": [{ "id": "login" }] }] }"#)
            .unwrap();
        std::fs::write(&config, r#"{ "theme": "dark" }"#).unwrap();
        run_elements(ElementsArgs {
            input: Some(input),
            config: Some(config),
            dark: false,
            output: Some(output.clone()),
        })
        .unwrap();
        let dump: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(dump["theme"], "dark");
        assert_eq!(dump["edges"][0]["color"], Theme::Dark.edge_color("auth"));
    }

    #[test]
    fn edit_writes_updated_catalog() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("catalog.json");
        let output = dir.path().join("out.json");
        std::fs::write(&input, r#"{ "domains": [{ "id": "auth", "features": [{ "id": "login" }] }] }"#)
            .unwrap();
        run_edit(EditArgs {
            input: Some(input),
            config: None,
            node: "login".into(),
            label: "Sign in".into(),
            output: Some(output.clone()),
        })
        .unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(value["domains"][0]["features"][0]["label"], "Sign in");
    }

    #[test]
    fn edit_of_synthetic_node_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("catalog.json");
        std::fs::write(&input, r#"{ "relationships": [{ "from": "a", "to": "b" }] }"#).unwrap();
        let err = run_edit(EditArgs {
            input: Some(input),
            config: None,
            node: "a".into(),
            label: "A".into(),
            output: None,
        })
        .unwrap_err();
        assert!(err.to_string().contains("no backing entry"));
    }
}
