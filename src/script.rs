//! A stand-in server that replays a scripted session.
//!
//! The script is a JSON document listing timed steps. Each step either pushes
//! a resource pack to the client or performs an operator action on the
//! client's [`ResourcePackHandler`]:
//!
//! ```json
//! {
//!   "username": "Herobrine",
//!   "steps": [
//!     { "atMs": 0, "action": "push", "UUID": "35ee313b-d89a-41b8-b25e-d32e8aff0389",
//!       "url": "https://example.com/pack.zip", "hash": "abc", "forced": true },
//!     { "atMs": 50, "action": "push", "hash": "def" },
//!     { "atMs": 400, "action": "decline" }
//!   ],
//!   "disconnectAtMs": 1500
//! }
//! ```

use std::{
    any::Any,
    collections::VecDeque,
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use bevy::{
    prelude::*,
    tasks::{IoTaskPool, Task},
};
use futures_lite::future;
use serde::Deserialize;
use thiserror::Error;

use brine_proto::event::{
    clientbound::{AddResourcePack, Disconnect, LoginSuccess, ResourcePackSend},
    serverbound::ResourcePackStatus,
    Uuid,
};
use brine_resource_pack::{ManualReply, ResourcePackHandler};

/// How long the session stays up after the last step when the script does
/// not say.
pub const DEFAULT_LINGER: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read script {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed script {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ScriptError>;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionScript {
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
    pub disconnect_at_ms: Option<u64>,
}

fn default_username() -> String {
    String::from("Herobrine")
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptStep {
    #[serde(default)]
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: ScriptAction,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ScriptAction {
    /// Server pushes a resource pack.
    Push(ScriptedOffer),
    Decline,
    ReportDownloadFailed,
    Enable,
    Disable,
    SetAutoAccept { value: bool },
    SetAutoAcceptForced { value: bool },
    ClearHistory,
}

/// A push as written in the script. Whether it goes out as an
/// [`AddResourcePack`] or a [`ResourcePackSend`] depends on whether it has an
/// identifier.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptedOffer {
    #[serde(alias = "uuid", alias = "UUID")]
    pub identifier: Option<String>,
    pub url: Option<String>,
    pub hash: Option<String>,
    #[serde(default)]
    pub forced: bool,
    pub prompt_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Push {
    Modern(AddResourcePack),
    Legacy(ResourcePackSend),
}

impl ScriptedOffer {
    pub fn into_push(self) -> Push {
        match self.identifier {
            Some(uuid) => Push::Modern(AddResourcePack {
                uuid,
                url: self.url,
                hash: self.hash,
                forced: self.forced,
                prompt_message: self.prompt_message,
            }),
            None => Push::Legacy(ResourcePackSend {
                url: self.url,
                hash: self.hash,
                forced: self.forced,
                prompt_message: self.prompt_message,
            }),
        }
    }
}

pub fn load_script(path: impl AsRef<Path>) -> Result<SessionScript> {
    let path = path.as_ref();

    let contents = fs::read_to_string(path).map_err(|source| ScriptError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&contents).map_err(|source| ScriptError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// A plugin that acts as a phony server, replaying a [`SessionScript`] read
/// from a file.
///
/// The session starts with a [`LoginSuccess`] once the script is loaded and
/// ends with a [`Disconnect`]. A script that cannot be loaded disconnects
/// immediately.
pub struct ScriptedSessionPlugin<P> {
    path: P,
}

impl<P> ScriptedSessionPlugin<P> {
    pub fn new(path: P) -> Self {
        Self { path }
    }
}

impl<P> Plugin for ScriptedSessionPlugin<P>
where
    P: AsRef<Path> + Any + Send + Sync + 'static,
{
    fn build(&self, app: &mut App) {
        let path = PathBuf::from(self.path.as_ref());
        app.insert_resource(ScriptFile { path });
        app.add_systems(Startup, load_session_script);
        app.add_systems(Update, (start_session, run_session, log_replies));
    }
}

#[derive(Resource, Debug)]
pub struct ScriptFile {
    path: PathBuf,
}

#[derive(Component)]
struct LoadScriptTask(Task<Result<SessionScript>>);

/// Progress through a loaded script.
#[derive(Resource, Debug)]
pub struct ActiveSession {
    steps: VecDeque<ScriptStep>,
    elapsed: Duration,
    disconnect_at: Duration,
}

impl ActiveSession {
    pub fn new(script: SessionScript) -> Self {
        let mut steps = script.steps;
        steps.sort_by_key(|step| step.at_ms);

        let disconnect_at = match script.disconnect_at_ms {
            Some(ms) => Duration::from_millis(ms),
            None => {
                let last_step = steps.last().map_or(0, |step| step.at_ms);
                Duration::from_millis(last_step) + DEFAULT_LINGER
            }
        };

        Self {
            steps: steps.into(),
            elapsed: Duration::ZERO,
            disconnect_at,
        }
    }

    /// Advances the session clock and returns the steps that became due.
    pub fn advance(&mut self, delta: Duration) -> Vec<ScriptStep> {
        self.elapsed += delta;

        let mut due = Vec::new();
        while let Some(step) = self.steps.front() {
            if Duration::from_millis(step.at_ms) > self.elapsed {
                break;
            }
            due.extend(self.steps.pop_front());
        }
        due
    }

    pub fn is_finished(&self) -> bool {
        self.steps.is_empty() && self.elapsed >= self.disconnect_at
    }
}

fn load_session_script(script_file: Res<ScriptFile>, mut commands: Commands) {
    let task_pool = IoTaskPool::get();
    let path = script_file.path.clone();

    debug!("Loading session script {}", path.display());
    let task = task_pool.spawn(async move { load_script(path) });

    commands.spawn((LoadScriptTask(task), Name::new("Loading Session Script")));
}

fn start_session(
    mut tasks: Query<(Entity, &mut LoadScriptTask)>,
    mut login_success_events: MessageWriter<LoginSuccess>,
    mut disconnect_events: MessageWriter<Disconnect>,
    mut commands: Commands,
) {
    for (task_entity, mut task) in tasks.iter_mut() {
        if let Some(script) = future::block_on(future::poll_once(&mut task.0)) {
            commands.entity(task_entity).despawn();

            match script {
                Ok(script) => {
                    info!(
                        "Starting scripted session for {} ({} steps)",
                        script.username,
                        script.steps.len()
                    );
                    login_success_events.write(LoginSuccess {
                        uuid: Uuid::new_v4(),
                        username: script.username.clone(),
                    });
                    commands.insert_resource(ActiveSession::new(script));
                }
                Err(err) => {
                    error!("{}", err);
                    disconnect_events.write(Disconnect {
                        reason: err.to_string(),
                    });
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_session(
    time: Res<Time>,
    session: Option<ResMut<ActiveSession>>,
    mut handler: ResMut<ResourcePackHandler>,
    mut modern_pushes: MessageWriter<AddResourcePack>,
    mut legacy_pushes: MessageWriter<ResourcePackSend>,
    mut manual_replies: MessageWriter<ManualReply>,
    mut disconnect_events: MessageWriter<Disconnect>,
    mut commands: Commands,
) {
    let Some(mut session) = session else {
        return;
    };

    for step in session.advance(time.delta()) {
        trace!("Script step at {} ms: {:?}", step.at_ms, step.action);

        match step.action {
            ScriptAction::Push(offer) => match offer.into_push() {
                Push::Modern(push) => {
                    modern_pushes.write(push);
                }
                Push::Legacy(push) => {
                    legacy_pushes.write(push);
                }
            },
            ScriptAction::Decline => {
                manual_replies.write(ManualReply::Decline);
            }
            ScriptAction::ReportDownloadFailed => {
                manual_replies.write(ManualReply::DownloadFailed);
            }
            ScriptAction::Enable => handler.enable(),
            ScriptAction::Disable => handler.disable(),
            ScriptAction::SetAutoAccept { value } => handler.set_auto_accept(value),
            ScriptAction::SetAutoAcceptForced { value } => handler.set_auto_accept_forced(value),
            ScriptAction::ClearHistory => handler.clear_history(),
        }
    }

    if session.is_finished() {
        info!("Scripted session finished");
        disconnect_events.write(Disconnect {
            reason: String::from("Scripted session finished"),
        });
        commands.remove_resource::<ActiveSession>();
    }
}

fn log_replies(mut replies: MessageReader<ResourcePackStatus>) {
    for reply in replies.read() {
        info!("Client replied {} for {}", reply.result, reply.target);
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;

    const SCRIPT: &str = r#"{
        "username": "Notch",
        "steps": [
            { "atMs": 400, "action": "decline" },
            { "atMs": 0, "action": "push", "UUID": "X", "hash": "abc", "forced": true },
            { "atMs": 50, "action": "push", "url": "https://example.com/pack.zip" },
            { "atMs": 100, "action": "setAutoAcceptForced", "value": false },
            { "atMs": 200, "action": "clearHistory" }
        ]
    }"#;

    fn parse(json: &str) -> SessionScript {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parses_steps() {
        let script = parse(SCRIPT);

        assert_eq!(script.username, "Notch");
        assert_eq!(script.steps.len(), 5);
        assert_eq!(script.disconnect_at_ms, None);
        assert_eq!(script.steps[0].action, ScriptAction::Decline);
        assert_eq!(
            script.steps[3].action,
            ScriptAction::SetAutoAcceptForced { value: false }
        );
    }

    #[test]
    fn identifier_picks_modern_push() {
        let script = parse(SCRIPT);

        let offer = assert_matches!(&script.steps[1].action, ScriptAction::Push(offer) => offer.clone());
        assert_matches!(offer.into_push(), Push::Modern(push) => {
            assert_eq!(push.uuid, "X");
            assert_eq!(push.hash.as_deref(), Some("abc"));
            assert!(push.forced);
        });

        let offer = assert_matches!(&script.steps[2].action, ScriptAction::Push(offer) => offer.clone());
        assert_matches!(offer.into_push(), Push::Legacy(push) => {
            assert_eq!(push.hash, None);
            assert!(!push.forced);
        });
    }

    #[test]
    fn identifier_aliases() {
        for key in ["identifier", "uuid", "UUID"] {
            let offer: ScriptedOffer =
                serde_json::from_str(&format!(r#"{{ "{}": "X" }}"#, key)).unwrap();
            assert_eq!(offer.identifier.as_deref(), Some("X"));
        }
    }

    #[test]
    fn session_releases_steps_in_time_order() {
        let mut session = ActiveSession::new(parse(SCRIPT));

        let due = session.advance(Duration::ZERO);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].at_ms, 0);

        let due = session.advance(Duration::from_millis(150));
        let times: Vec<_> = due.iter().map(|step| step.at_ms).collect();
        assert_eq!(times, vec![50, 100]);

        assert!(session.advance(Duration::from_millis(100)).len() == 1);
        assert!(!session.is_finished());

        let due = session.advance(Duration::from_millis(150));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].action, ScriptAction::Decline);
        assert!(!session.is_finished());

        // Lingers for a second after the last step.
        session.advance(Duration::from_millis(999));
        assert!(!session.is_finished());
        session.advance(Duration::from_millis(1));
        assert!(session.is_finished());
    }

    #[test]
    fn explicit_disconnect_time() {
        let mut session = ActiveSession::new(parse(r#"{ "disconnectAtMs": 10 }"#));

        assert!(!session.is_finished());
        assert!(session.advance(Duration::from_millis(10)).is_empty());
        assert!(session.is_finished());
    }

    #[test]
    fn missing_script_is_io_error() {
        let result = load_script("does/not/exist.json");
        assert_matches!(result, Err(ScriptError::Io { .. }));
    }
}
