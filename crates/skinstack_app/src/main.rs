// SPDX-License-Identifier: MIT OR Apache-2.0
//! `skinstack` - merge and rebuild skin deformer stacks
//!
//! Runs a RON script of session commands against either:
//! - a scene document on disk (optionally saved back afterwards)
//! - a running DCC reached through its command port
//!
//! ```text
//! skinstack [--settings FILE] (--scene FILE [--save FILE] | --port ADDR) SCRIPT
//! skinstack [--settings FILE] --init-settings
//! ```

use skinstack_app::{
    CommandPortHost, Script, ScriptError, ScriptSummary, Session, Settings, SETTINGS_FILE_NAME,
};
use skinstack_graph::{HostError, InMemoryScene, SceneError, SceneHost};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const USAGE: &str = "usage: skinstack [--settings FILE] (--scene FILE [--save FILE] | --port ADDR) SCRIPT
       skinstack [--settings FILE] --init-settings";

/// Errors that end the program
#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Command port error: {0}")]
    Host(#[from] HostError),

    #[error("No scene file or command port given")]
    NoHost,

    #[error("{failed} of {executed} commands failed")]
    CommandsFailed { failed: usize, executed: usize },
}

/// Command line arguments
#[derive(Debug, Default, PartialEq)]
struct Args {
    settings: Option<PathBuf>,
    scene: Option<PathBuf>,
    save: Option<PathBuf>,
    port: Option<String>,
    init_settings: bool,
    script: PathBuf,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, String> {
        let mut parsed = Args::default();
        let mut script = None;

        while let Some(arg) = args.next() {
            let mut value = |flag: &str| args.next().ok_or_else(|| format!("{flag} needs a value"));
            match arg.as_str() {
                "--settings" => parsed.settings = Some(value("--settings")?.into()),
                "--scene" => parsed.scene = Some(value("--scene")?.into()),
                "--save" => parsed.save = Some(value("--save")?.into()),
                "--port" => parsed.port = Some(value("--port")?),
                "--init-settings" => parsed.init_settings = true,
                flag if flag.starts_with("--") => return Err(format!("unknown option {flag}")),
                _ if script.is_some() => return Err(format!("unexpected argument {arg}")),
                _ => script = Some(PathBuf::from(arg)),
            }
        }

        if parsed.scene.is_some() && parsed.port.is_some() {
            return Err("--scene and --port are exclusive".to_string());
        }
        if parsed.save.is_some() && parsed.scene.is_none() {
            return Err("--save needs --scene".to_string());
        }
        if parsed.init_settings {
            return match script {
                Some(extra) => Err(format!("unexpected argument {}", extra.display())),
                None => Ok(parsed),
            };
        }
        parsed.script = script.ok_or_else(|| "no script given".to_string())?;
        Ok(parsed)
    }
}

fn main() {
    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{msg}\n{USAGE}");
            std::process::exit(2);
        }
    };

    let settings_path = args
        .settings
        .clone()
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE_NAME));
    if args.init_settings {
        init_settings(&settings_path);
        return;
    }

    let settings = match Settings::load_or_default(&settings_path) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}: {e}", settings_path.display());
            std::process::exit(1);
        }
    };

    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let bad_filter = match settings
        .log_filter
        .parse::<tracing_subscriber::filter::Directive>()
    {
        Ok(directive) => {
            env_filter = env_filter.add_directive(directive);
            None
        }
        Err(e) => Some(e),
    };
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting skinstack v{}", env!("CARGO_PKG_VERSION"));
    if let Some(e) = bad_filter {
        tracing::warn!("Ignoring log filter {:?}: {e}", settings.log_filter);
    }

    if let Err(e) = run(args, &settings) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn init_settings(path: &Path) {
    if path.exists() {
        eprintln!("{} already exists", path.display());
        std::process::exit(1);
    }
    if let Err(e) = Settings::default().save(path) {
        eprintln!("{}: {e}", path.display());
        std::process::exit(1);
    }
    println!("Wrote default settings to {}", path.display());
}

fn run(args: Args, settings: &Settings) -> Result<(), AppError> {
    let script = Script::load(&args.script)?;

    let summary = if let Some(scene_path) = &args.scene {
        let scene = InMemoryScene::load(scene_path)?;
        let (scene, summary) = run_script(scene, &script, settings);
        if let Some(save_path) = &args.save {
            scene.save(save_path)?;
        }
        summary
    } else if let Some(address) = args.port.as_ref().or(settings.command_port.as_ref()) {
        let host = CommandPortHost::connect(address, settings.kinds.clone())?;
        run_script(host, &script, settings).1
    } else {
        return Err(AppError::NoHost);
    };

    tracing::info!(
        "Ran {} commands, {} failed, {} skipped",
        summary.executed,
        summary.failed,
        summary.skipped
    );
    if summary.failed > 0 {
        return Err(AppError::CommandsFailed {
            failed: summary.failed,
            executed: summary.executed,
        });
    }
    Ok(())
}

fn run_script<H: SceneHost>(host: H, script: &Script, settings: &Settings) -> (H, ScriptSummary) {
    let mut session = Session::new(host, settings.rewire.clone(), settings.default_mode);
    let summary = script.run(&mut session);
    tracing::debug!(
        "Session ended with sources {:?}, targets {:?}",
        session.sources(),
        session.targets()
    );
    (session.into_host(), summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, String> {
        Args::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_scene_args() {
        let args = parse(&["--scene", "rig.ron", "--save", "out.ron", "stack.ron"]).unwrap();
        assert_eq!(args.scene, Some(PathBuf::from("rig.ron")));
        assert_eq!(args.save, Some(PathBuf::from("out.ron")));
        assert_eq!(args.script, PathBuf::from("stack.ron"));
        assert!(args.port.is_none());
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["--scene"]).is_err());
        assert!(parse(&["--bogus", "x.ron"]).is_err());
        assert!(parse(&["--scene", "a.ron", "--port", "127.0.0.1:7001", "s.ron"]).is_err());
        assert!(parse(&["--save", "out.ron", "s.ron"]).is_err());
        assert!(parse(&["a.ron", "b.ron"]).is_err());
        assert!(parse(&["--init-settings", "a.ron"]).is_err());
    }

    #[test]
    fn test_parse_init_settings() {
        let args = parse(&["--settings", "tool.ron", "--init-settings"]).unwrap();
        assert!(args.init_settings);
        assert_eq!(args.settings, Some(PathBuf::from("tool.ron")));
    }

    #[test]
    fn test_run_against_scene_file() {
        let dir = std::env::temp_dir().join(format!("skinstack-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut scene = InMemoryScene::new("rig");
        scene.add_node("meshOrig", skinstack_graph::NodeKind::Mesh);
        scene.add_node("skinA", skinstack_graph::NodeKind::Deformer);
        scene.add_node("skinB", skinstack_graph::NodeKind::Deformer);
        scene.link("meshOrig.worldMesh[0]", "skinB.input[0].inputGeometry").unwrap();
        scene.link("meshOrig.outMesh", "skinB.originalGeometry[0]").unwrap();
        scene.save(&dir.join("rig.ron")).unwrap();
        std::fs::write(
            dir.join("stack.ron"),
            r#"(commands: [Merge(target: "skinA", source: "skinB")])"#,
        )
        .unwrap();

        let args = Args {
            scene: Some(dir.join("rig.ron")),
            save: Some(dir.join("out.ron")),
            script: dir.join("stack.ron"),
            ..Args::default()
        };
        run(args, &Settings::default()).unwrap();

        let saved = InMemoryScene::load(&dir.join("out.ron")).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();
        assert!(saved.has_link("skinA.outputGeometry[0]", "skinB.input[0].inputGeometry"));
    }

    #[test]
    fn test_failed_command_fails_run() {
        let dir = std::env::temp_dir().join(format!("skinstack-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        InMemoryScene::new("empty").save(&dir.join("rig.ron")).unwrap();
        std::fs::write(dir.join("stack.ron"), "(commands: [Combine])").unwrap();

        let args = Args {
            scene: Some(dir.join("rig.ron")),
            script: dir.join("stack.ron"),
            ..Args::default()
        };
        let result = run(args, &Settings::default());
        std::fs::remove_dir_all(&dir).unwrap();
        assert!(matches!(
            result,
            Err(AppError::CommandsFailed { failed: 1, executed: 1 })
        ));
    }
}
