mod config;
mod core;
mod desktop;
mod effect;
mod error;
mod handler;
mod ipc;
mod pid;
mod provider;
mod reconcile;
mod store;

use anyhow::{bail, Context, Result};
use argh::FromArgs;
use gridsnap_ipc::{Command, LayoutRequest, Rectangle, Response, MAX_RECTANGLES};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::config::Paths;
use crate::desktop::SnapshotDesktop;
use crate::error::Error;
use crate::handler::Handler;
use crate::ipc::{IpcClient, IpcServer};
use crate::pid::PidFile;
use crate::store::{LayoutStore, PreferenceStore};

#[derive(FromArgs)]
/// Arrange windows by drawing rectangles on a grid.
struct Args {
    #[argh(subcommand)]
    command: SubCommand,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum SubCommand {
    Daemon(DaemonArgs),
    Apply(ApplyArgs),
    Plan(PlanArgs),
    Layouts(LayoutsArgs),
    Prefs(PrefsArgs),
}

#[derive(FromArgs)]
/// Run the layout daemon.
#[argh(subcommand, name = "daemon")]
struct DaemonArgs {
    /// desktop description file (defaults to desktop.json in the data dir)
    #[argh(option)]
    desktop: Option<PathBuf>,
}

#[derive(FromArgs)]
/// Ask the daemon to apply rectangles.
#[argh(subcommand, name = "apply")]
struct ApplyArgs {
    /// grid rectangle as x,y,width,height or corner cells col,row:col,row;
    /// repeat for more windows
    #[argh(option)]
    rect: Vec<Rectangle>,
    /// grid size (defaults to the stored preference)
    #[argh(option)]
    grid: Option<u32>,
    /// on or off (defaults to the stored preference)
    #[argh(option)]
    padding: Option<Toggle>,
    /// id of the window to keep in the first slot
    #[argh(option)]
    window: Option<u32>,
}

#[derive(FromArgs)]
/// Print the operations a layout would issue, without applying them.
#[argh(subcommand, name = "plan")]
struct PlanArgs {
    /// desktop description file (defaults to desktop.json in the data dir)
    #[argh(option)]
    desktop: Option<PathBuf>,
    /// grid rectangle as x,y,width,height or corner cells col,row:col,row;
    /// repeat for more windows
    #[argh(option)]
    rect: Vec<Rectangle>,
    /// grid size (defaults to the stored preference)
    #[argh(option)]
    grid: Option<u32>,
    /// on or off (defaults to the stored preference)
    #[argh(option)]
    padding: Option<Toggle>,
    /// id of the window to keep in the first slot
    #[argh(option)]
    window: Option<u32>,
}

#[derive(FromArgs)]
/// Manage saved layouts.
#[argh(subcommand, name = "layouts")]
struct LayoutsArgs {
    #[argh(subcommand)]
    command: LayoutsCommand,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum LayoutsCommand {
    List(LayoutsList),
    Save(LayoutsSave),
    Delete(LayoutsDelete),
    Apply(LayoutsApply),
}

#[derive(FromArgs)]
/// List saved layouts.
#[argh(subcommand, name = "list")]
struct LayoutsList {}

#[derive(FromArgs)]
/// Save rectangles under a name.
#[argh(subcommand, name = "save")]
struct LayoutsSave {
    /// layout name
    #[argh(positional)]
    name: String,
    /// grid rectangle as x,y,width,height or corner cells col,row:col,row;
    /// repeat for more windows
    #[argh(option)]
    rect: Vec<Rectangle>,
    /// grid size (defaults to the stored preference)
    #[argh(option)]
    grid: Option<u32>,
    /// on or off; applied with the layout instead of the preference
    #[argh(option)]
    padding: Option<Toggle>,
}

#[derive(FromArgs)]
/// Delete a saved layout.
#[argh(subcommand, name = "delete")]
struct LayoutsDelete {
    /// layout id
    #[argh(positional)]
    id: String,
}

#[derive(FromArgs)]
/// Ask the daemon to apply a saved layout.
#[argh(subcommand, name = "apply")]
struct LayoutsApply {
    /// layout id
    #[argh(positional)]
    id: String,
    /// id of the window to keep in the first slot
    #[argh(option)]
    window: Option<u32>,
}

#[derive(FromArgs)]
/// Show or change preferences.
#[argh(subcommand, name = "prefs")]
struct PrefsArgs {
    #[argh(subcommand)]
    command: PrefsCommand,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum PrefsCommand {
    Show(PrefsShow),
    Set(PrefsSet),
}

#[derive(FromArgs)]
/// Print the stored preferences.
#[argh(subcommand, name = "show")]
struct PrefsShow {}

#[derive(FromArgs)]
/// Change stored preferences.
#[argh(subcommand, name = "set")]
struct PrefsSet {
    /// default grid size
    #[argh(option)]
    grid: Option<u32>,
    /// default padding, on or off
    #[argh(option)]
    padding: Option<Toggle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Toggle(bool);

impl FromStr for Toggle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "on" | "true" | "yes" => Ok(Toggle(true)),
            "off" | "false" | "no" => Ok(Toggle(false)),
            _ => Err(format!("expected on or off but got '{}'", s)),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Args = argh::from_env();
    let paths = Paths::resolve();

    match args.command {
        SubCommand::Daemon(cmd) => run_daemon(&paths, cmd.desktop),
        SubCommand::Apply(cmd) => {
            let grid_size = resolve_grid(&paths, cmd.grid)?;
            let request = LayoutRequest {
                rectangles: checked_rectangles(cmd.rect, grid_size)?,
                grid_size,
                current_window_id: cmd.window,
                padding: cmd.padding.map(|t| t.0),
            };
            send(&paths, &Command::ApplyLayout(request))
        }
        SubCommand::Plan(cmd) => {
            let grid_size = resolve_grid(&paths, cmd.grid)?;
            let request = LayoutRequest {
                rectangles: checked_rectangles(cmd.rect, grid_size)?,
                grid_size,
                current_window_id: cmd.window,
                padding: cmd.padding.map(|t| t.0),
            };
            run_plan(&paths, cmd.desktop, request)
        }
        SubCommand::Layouts(cmd) => run_layouts(&paths, cmd.command),
        SubCommand::Prefs(cmd) => run_prefs(&paths, cmd.command),
    }
}

fn run_daemon(paths: &Paths, desktop: Option<PathBuf>) -> Result<()> {
    let _pid = match PidFile::acquire(&paths.pid_file) {
        Ok(pid) => pid,
        Err(pid) => bail!("gridsnap daemon is already running (pid {})", pid),
    };

    let desktop_path = desktop.unwrap_or_else(|| paths.desktop());
    let desktop = Arc::new(SnapshotDesktop::open(&desktop_path)?);
    let handler = Arc::new(Handler::new(
        desktop.clone(),
        desktop,
        PreferenceStore::new(paths.preferences()),
        LayoutStore::new(paths.layouts()),
    ));

    tracing::info!("gridsnap daemon starting");
    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    runtime.block_on(async {
        let server = IpcServer::bind(&paths.socket)?;
        server.run(handler).await
    })?;
    tracing::info!("gridsnap daemon stopped");
    Ok(())
}

fn run_plan(paths: &Paths, desktop: Option<PathBuf>, request: LayoutRequest) -> Result<()> {
    let desktop_path = desktop.unwrap_or_else(|| paths.desktop());
    let desktop = Arc::new(SnapshotDesktop::open(&desktop_path)?);
    let handler = Handler::new(
        desktop.clone(),
        desktop,
        PreferenceStore::new(paths.preferences()),
        LayoutStore::new(paths.layouts()),
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start tokio runtime")?;
    let operations = runtime.block_on(handler.plan(&request))?;
    println!("{}", serde_json::to_string_pretty(&operations)?);
    Ok(())
}

fn run_layouts(paths: &Paths, command: LayoutsCommand) -> Result<()> {
    let layouts = LayoutStore::new(paths.layouts());
    match command {
        LayoutsCommand::List(_) => {
            for layout in layouts.load()? {
                let rects: Vec<String> = layout.layout.iter().map(|r| r.to_string()).collect();
                println!(
                    "{}\t{}\t{}x{}\t{}",
                    layout.id,
                    layout.name,
                    layout.grid_size,
                    layout.grid_size,
                    rects.join(" ")
                );
            }
            Ok(())
        }
        LayoutsCommand::Save(cmd) => {
            let grid_size = resolve_grid(paths, cmd.grid)?;
            let rectangles = checked_rectangles(cmd.rect, grid_size)?;
            let layout = layouts.add(&cmd.name, rectangles, grid_size, cmd.padding.map(|t| t.0))?;
            println!("{}", layout.id);
            Ok(())
        }
        LayoutsCommand::Delete(cmd) => {
            let removed = layouts.remove(&cmd.id)?;
            println!("Deleted {}", removed.name);
            Ok(())
        }
        LayoutsCommand::Apply(cmd) => {
            // Fail early on an unknown id instead of only in the daemon log.
            layouts.find(&cmd.id)?;
            send(
                paths,
                &Command::ApplySaved {
                    id: cmd.id,
                    current_window_id: cmd.window,
                },
            )
        }
    }
}

fn run_prefs(paths: &Paths, command: PrefsCommand) -> Result<()> {
    let store = PreferenceStore::new(paths.preferences());
    let mut prefs = store.load()?;
    match command {
        PrefsCommand::Show(_) => {}
        PrefsCommand::Set(cmd) => {
            if let Some(grid) = cmd.grid {
                if grid == 0 {
                    bail!("grid size must be positive");
                }
                prefs.grid_size = grid;
            }
            if let Some(padding) = cmd.padding {
                prefs.win_padding = padding.0;
            }
            store.save(&prefs)?;
        }
    }
    println!("grid_size = {}", prefs.grid_size);
    println!("win_padding = {}", prefs.win_padding);
    Ok(())
}

fn resolve_grid(paths: &Paths, grid: Option<u32>) -> Result<u32> {
    let grid_size = match grid {
        Some(grid) => grid,
        None => PreferenceStore::new(paths.preferences()).load()?.grid_size,
    };
    if grid_size == 0 {
        bail!("grid size must be positive");
    }
    Ok(grid_size)
}

/// The grid is the selection surface here, so out-of-grid input stops here.
fn checked_rectangles(rects: Vec<Rectangle>, grid_size: u32) -> Result<Vec<Rectangle>> {
    if rects.is_empty() {
        bail!("no rectangles given; pass at least one --rect x,y,width,height");
    }
    if rects.len() > MAX_RECTANGLES {
        return Err(Error::LimitReached {
            what: "rectangle",
            limit: MAX_RECTANGLES,
        }
        .into());
    }
    if let Some(bad) = rects.iter().find(|r| !r.fits(grid_size)) {
        bail!("rectangle {} does not fit a {}x{} grid", bad, grid_size, grid_size);
    }
    Ok(rects)
}

fn send(paths: &Paths, command: &Command) -> Result<()> {
    let mut client = IpcClient::connect(&paths.socket)?;
    match client.send(command)? {
        Response::Ok => Ok(()),
        Response::Error { message } => bail!("daemon: {}", message),
    }
}
