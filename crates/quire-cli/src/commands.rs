use colored::Colorize;
use quire_content::ContentConfigState;
use quire_loader::WatchEvent;
use quire_sync::{ContentLayer, ContentLayerHost, SyncError, SyncOptions};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info};

use crate::cli::*;
use crate::project::{canonical, Project};
use crate::watch::ProjectWatcher;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Sync(args) => cmd_sync(args).await,
        Command::Watch(args) => cmd_watch(args).await,
    }
}

async fn cmd_sync(args: SyncArgs) -> anyhow::Result<()> {
    let project = Project::open(&args.project).await?;
    let host = ContentLayerHost::new();
    let layer = host.init(project.layer_options());
    project.reload().await?;

    let options = SyncOptions {
        loaders: (!args.loaders.is_empty()).then_some(args.loaders),
        context: None,
    };
    let result = layer.sync(options).await;
    host.dispose();
    report(&project, result)
}

async fn cmd_watch(args: WatchArgs) -> anyhow::Result<()> {
    let project = Project::open(&args.project).await?;
    let host = ContentLayerHost::new();
    let mut layer = host.init(project.layer_options());

    if let Err(e) = project.reload().await {
        eprintln!("{} {e:#}", "✗".red().bold());
    }
    if let Err(e) = report(&project, layer.sync(SyncOptions::default()).await) {
        eprintln!("{} {e:#}", "✗".red().bold());
    }
    layer.watch_content_config();

    let (mut watcher, mut events) = start_watcher(&project)?;
    println!(
        "{} Watching {} for changes",
        "●".cyan(),
        project.settings().root.display().to_string().bold()
    );

    loop {
        let event = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        if canonical(&event.path) != project.config_path {
            on_file_change(&project, &layer, event);
            continue;
        }

        info!("config changed, reloading");
        match project.reload_settings() {
            Ok(true) => {
                info!("project settings changed, restarting content layer");
                let previous = std::mem::replace(&mut layer, host.init(project.layer_options()));
                previous.idle().await;
                layer.watch_content_config();
                match start_watcher(&project) {
                    Ok((next_watcher, next_events)) => {
                        watcher = next_watcher;
                        events = next_events;
                    }
                    Err(e) => error!(error = %e, "failed to restart file watcher"),
                }
            }
            Ok(false) => {}
            Err(e) => {
                error!(error = %e, "failed to reload project settings");
                continue;
            }
        }
        // Re-syncs through the config subscription if the digest changed.
        if let Err(e) = project.reload().await {
            error!(error = %e, "failed to reload content config");
        }
    }

    drop(watcher);
    host.dispose();
    println!("Stopped watching.");
    Ok(())
}

fn start_watcher(
    project: &Project,
) -> notify::Result<(ProjectWatcher, UnboundedReceiver<WatchEvent>)> {
    ProjectWatcher::start(
        &project.settings().root,
        &project.extra_watch_dirs(),
        project.output_dirs(),
    )
}

fn on_file_change(project: &Project, layer: &ContentLayer, event: WatchEvent) {
    let watched = project.watcher.is_watched(&event.path);
    project.watcher.emit(event.clone());
    if !watched {
        return;
    }

    info!(path = %event.path.display(), "loaded file changed, syncing");
    let handle = layer.sync(SyncOptions::default());
    tokio::spawn(async move {
        if let Err(e) = handle.await {
            error!(error = %e, "sync failed");
        }
    });
}

fn report(project: &Project, result: Result<(), SyncError>) -> anyhow::Result<()> {
    match result {
        Ok(()) => {
            if !matches!(project.observer.get(), ContentConfigState::Loaded(_)) {
                println!("{} Nothing to sync.", "–".dimmed());
                return Ok(());
            }
            println!("{} Synced content", "✓".green().bold());
            for (name, count) in project.summary() {
                println!("  {}: {} entries", name.cyan(), count);
            }
            Ok(())
        }
        Err(e) => {
            if let Some(hint) = e.hint() {
                eprintln!("  {} {hint}", "hint:".yellow().bold());
            }
            Err(e.into())
        }
    }
}
