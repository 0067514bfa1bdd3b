//! Headless Brine client that answers resource pack pushes from a scripted
//! session.

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use bevy::{
    app::{AppExit, ScheduleRunnerPlugin},
    log::{Level, LogPlugin},
    prelude::*,
};
use clap::Parser;

use brine_proto::{event::clientbound::Disconnect, ProtocolPlugin};
use brine_resource_pack::{ResourcePackHandler, ResourcePackPlugin, ResourcePackSettings};

use brine_respack::{script::ScriptedSessionPlugin, DEFAULT_LOG_FILTER};

const FRAME_TIME: Duration = Duration::from_millis(16);

/// Brine Resource Pack Responder
#[derive(Parser)]
struct Args {
    /// Session script to replay.
    #[clap(long, value_name = "FILE")]
    script: PathBuf,

    /// Resource pack settings (JSON). Flags below override it.
    #[clap(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Leave optional resource packs unanswered.
    #[clap(long)]
    no_auto_accept: bool,

    /// Leave forced resource packs unanswered.
    #[clap(long)]
    no_auto_accept_forced: bool,

    /// Report Downloaded between Accepted and SuccessfullyLoaded.
    #[clap(long)]
    report_downloaded: bool,

    /// Don't log each resource pack push.
    #[clap(short, long)]
    quiet: bool,

    /// Start with the handler disabled.
    #[clap(long)]
    disabled: bool,
}

impl Args {
    fn resource_pack_settings(&self) -> Result<ResourcePackSettings> {
        let mut settings = match &self.settings {
            Some(path) => {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("failed to read settings {}", path.display()))?;
                serde_json::from_str::<ResourcePackSettings>(&contents)
                    .with_context(|| format!("malformed settings {}", path.display()))?
            }
            None => ResourcePackSettings::default(),
        };

        if self.no_auto_accept {
            settings.auto_accept = false;
        }
        if self.no_auto_accept_forced {
            settings.auto_accept_forced = false;
        }
        if self.report_downloaded {
            settings.report_downloaded = true;
        }
        if self.quiet {
            settings.log_packets = false;
        }

        Ok(settings)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = args.resource_pack_settings()?;

    let mut resource_pack_plugin = ResourcePackPlugin::new(settings);
    if args.disabled {
        resource_pack_plugin = resource_pack_plugin.start_disabled();
    }

    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(FRAME_TIME)))
        .add_plugins(LogPlugin {
            level: Level::DEBUG,
            filter: String::from(DEFAULT_LOG_FILTER),
            ..default()
        })
        .add_plugins(ProtocolPlugin)
        .add_plugins(resource_pack_plugin)
        .add_plugins(ScriptedSessionPlugin::new(args.script))
        .add_systems(Update, handle_disconnect)
        .run();

    Ok(())
}

fn handle_disconnect(
    handler: Res<ResourcePackHandler>,
    mut disconnect_events: MessageReader<Disconnect>,
    mut app_exit: MessageWriter<AppExit>,
) {
    if let Some(disconnect) = disconnect_events.read().last() {
        info!("Disconnected from server. Reason: {}", disconnect.reason);

        match serde_json::to_string_pretty(&handler.status()) {
            Ok(status) => println!("{}", status),
            Err(err) => error!("Failed to serialize handler status: {}", err),
        }

        app_exit.write(AppExit::Success);
    }
}
