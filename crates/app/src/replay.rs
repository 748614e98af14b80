use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use forma_core::{
    read_session, register_executors, write_session, CommandManager, CommandRegistry,
    ExecContext, TargetManager, Tuning,
};
use forma_scene::{Model, ModelStore};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, PartialEq)]
pub(crate) struct ReplayArgs {
    pub scene_path: Option<PathBuf>,
    pub session_path: Option<PathBuf>,
    pub tuning_path: Option<PathBuf>,
    pub undo_count: usize,
    pub save_path: Option<PathBuf>,
    pub print: bool,
    pub log_level: Option<String>,
    pub help: bool,
}

/// Models the session commands act on.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct SceneFile {
    #[serde(default)]
    pub models: Vec<Model>,
}

/// Scene and session state after a replay.
#[derive(Debug)]
pub(crate) struct ReplayOutcome {
    pub scene: SceneFile,
    pub session: String,
    pub command_count: usize,
    pub current_index: usize,
}

pub(crate) fn parse_args(args: &[String]) -> Result<ReplayArgs, String> {
    let mut parsed = ReplayArgs::default();
    let mut iter = args.iter().skip(1);

    while let Some(arg) = iter.next() {
        let mut value = |name: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{name} requires a value"))
        };
        match arg.as_str() {
            "--scene" => parsed.scene_path = Some(PathBuf::from(value("--scene")?)),
            "--session" => parsed.session_path = Some(PathBuf::from(value("--session")?)),
            "--tuning" => parsed.tuning_path = Some(PathBuf::from(value("--tuning")?)),
            "--save" => parsed.save_path = Some(PathBuf::from(value("--save")?)),
            "--undo" => {
                let count = value("--undo")?;
                parsed.undo_count = count
                    .parse()
                    .map_err(|_| format!("--undo expects a count, got {count:?}"))?;
            }
            "--log-level" => parsed.log_level = Some(value("--log-level")?),
            "--print" => parsed.print = true,
            "--help" | "-h" => parsed.help = true,
            other => return Err(format!("unknown argument {other:?}")),
        }
    }
    Ok(parsed)
}

pub(crate) fn print_help() {
    println!(
        "Replays a forma session against a scene.\n\n\
         Options:\n  \
         --scene <path>      scene JSON with the starting models\n  \
         --session <path>    session JSON to replay\n  \
         --tuning <path>     tuning overrides\n  \
         --undo <count>      undo this many commands after the replay\n  \
         --save <path>       write the resulting session\n  \
         --print             print the resulting models\n  \
         --log-level <name>  error, warn, info, debug or trace (or FORMA_LOG)"
    );
}

pub(crate) fn run(args: &ReplayArgs) -> Result<(), String> {
    let scene_path = args
        .scene_path
        .as_deref()
        .ok_or_else(|| "--scene is required".to_string())?;
    let session_path = args
        .session_path
        .as_deref()
        .ok_or_else(|| "--session is required".to_string())?;

    let scene = read_file(scene_path)?;
    let session = read_file(session_path)?;
    let tuning = match args.tuning_path.as_deref() {
        Some(path) => Some(read_file(path)?),
        None => None,
    };

    let outcome = replay(&scene, &session, tuning.as_deref(), args.undo_count)?;
    tracing::info!(
        "replay finished at command {} of {}",
        outcome.current_index,
        outcome.command_count
    );

    if let Some(path) = args.save_path.as_deref() {
        std::fs::write(path, &outcome.session).map_err(|err| err.to_string())?;
        tracing::info!("saved session to {:?}", path);
    }
    if args.print {
        let json = serde_json::to_string_pretty(&outcome.scene).map_err(|err| err.to_string())?;
        println!("{json}");
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<Vec<u8>, String> {
    std::fs::read(path).map_err(|err| format!("{}: {err}", path.display()))
}

/// Replays `session` over the models in `scene`, then undoes up to
/// `undo_count` commands.
pub(crate) fn replay(
    scene: &[u8],
    session: &[u8],
    tuning: Option<&[u8]>,
    undo_count: usize,
) -> Result<ReplayOutcome, String> {
    let tuning: Tuning = match tuning {
        Some(data) => serde_json::from_slice(data).map_err(|err| format!("tuning: {err}"))?,
        None => Tuning::default(),
    };
    let scene: SceneFile =
        serde_json::from_slice(scene).map_err(|err| format!("scene: {err}"))?;
    let mut store = ModelStore::new();
    for model in scene.models {
        store.add(model).map_err(|err| err.to_string())?;
    }
    tracing::info!("loaded {} model(s)", store.len());

    let models = Rc::new(RefCell::new(store));
    let manager = Rc::new(RefCell::new(CommandManager::new()));
    let targets = Rc::new(TargetManager::new(Rc::clone(&manager), tuning));
    let context = ExecContext {
        models: Rc::clone(&models),
        target_manager: Rc::downgrade(&targets),
    };
    register_executors(&mut manager.borrow_mut(), &context);

    let registry = CommandRegistry::with_builtin_commands();
    let list = read_session(&registry, session).map_err(|err| err.to_string())?;
    manager
        .borrow_mut()
        .process_command_list(list)
        .map_err(|err| err.to_string())?;

    let state = manager.borrow().session_state().cloned();
    if let Some(state) = state {
        targets.restore_session_state(&state);
    }

    for _ in 0..undo_count {
        let mut manager = manager.borrow_mut();
        if !manager.can_undo() {
            tracing::warn!("nothing left to undo");
            break;
        }
        tracing::info!("undoing {}", manager.last_command().description());
        manager.undo();
    }

    let manager = manager.borrow();
    let list = manager.command_list();
    let session = write_session(list).map_err(|err| err.to_string())?;
    let models = models.borrow().models().cloned().collect();
    Ok(ReplayOutcome {
        scene: SceneFile { models },
        session,
        command_count: list.command_count(),
        current_index: list.current_index(),
    })
}
