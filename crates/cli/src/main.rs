use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Deserialize;

use facefriend_core::identity::domain::identity_registry::IdentityRegistry;
use facefriend_core::identity::infrastructure::distance_matcher::DistanceMatcher;
use facefriend_core::identity::infrastructure::json_roster_store::JsonRosterStore;
use facefriend_core::interaction::control_loop::ControlLoop;
use facefriend_core::interaction::logging_face_observer::LoggingFaceObserver;
use facefriend_core::shared::config::RobotConfig;
use facefriend_core::shared::frame::Frame;
use facefriend_core::shared::ids::ContactId;
use facefriend_core::speech::domain::speech_port::SpeechPort;
use facefriend_core::speech::infrastructure::console_speech::ConsoleSpeech;
use facefriend_core::speech::infrastructure::scripted_speech::ScriptedSpeech;
use facefriend_core::vision::domain::face_detector::Detection;
use facefriend_core::vision::infrastructure::frame_gate::FrameGate;
use facefriend_core::vision::infrastructure::replay_face_detector::ReplayFaceDetector;
use facefriend_core::vision::infrastructure::threaded_recognition_engine::ThreadedRecognitionEngine;

const CAPTURE_WIDTH: u32 = 640;
const CAPTURE_HEIGHT: u32 = 480;
const SCRIPTED_ANSWER_DELAY: Duration = Duration::from_millis(300);

/// Face-greeting robot: meet visitors, learn their names, manage contacts.
#[derive(Parser)]
#[command(name = "facefriend")]
struct Cli {
    /// Contact roster file (defaults to the config directory).
    #[arg(long, global = true)]
    roster: Option<PathBuf>,

    /// Settings file (defaults to the config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every known contact.
    List,

    /// Remove a contact from the roster.
    Delete {
        /// Contact id as shown by `list`.
        #[arg(allow_hyphen_values = true)]
        id: i64,
    },

    /// Run the robot loop against a recorded scenario.
    Run {
        /// Scenario JSON with per-frame detections and spoken answers.
        #[arg(long)]
        script: PathBuf,

        /// Stop after this many control-loop ticks.
        #[arg(long)]
        max_ticks: Option<u64>,

        /// Capture rate of the synthetic camera.
        #[arg(long, default_value = "10")]
        fps: u32,
    },
}

/// A recorded session: detections per frame index plus what visitors say.
///
/// With no answers the operator types them in on stdin instead.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Scenario {
    frames: Vec<Vec<Detection>>,
    answers: Vec<Option<String>>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let roster = JsonRosterStore::new(roster_path(cli.roster)?);

    match cli.command {
        Command::List => list_contacts(&roster),
        Command::Delete { id } => delete_contact(&roster, &config, ContactId(id)),
        Command::Run {
            script,
            max_ticks,
            fps,
        } => run_scenario(&roster, &config, &script, max_ticks, fps),
    }
}

fn list_contacts(roster: &JsonRosterStore) -> Result<(), Box<dyn std::error::Error>> {
    let contacts = roster.load()?;
    if contacts.is_empty() {
        println!("No contacts in {}", roster.path().display());
        return Ok(());
    }
    for contact in contacts {
        let encoding = if contact.enrollment_encoding.is_some() {
            "enrolled"
        } else {
            "no encoding"
        };
        println!(
            "{:>6}  {}  ({encoding})",
            contact.contact_id.0, contact.display_name
        );
    }
    Ok(())
}

fn delete_contact(
    roster: &JsonRosterStore,
    config: &RobotConfig,
    id: ContactId,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = new_registry(config);
    roster.load_into(&mut registry)?;
    let removed = registry.remove(id)?;
    roster.save_registry(&registry)?;
    println!("Deleted {} ({})", removed.display_name, removed.contact_id);
    Ok(())
}

fn run_scenario(
    roster: &JsonRosterStore,
    config: &RobotConfig,
    script: &Path,
    max_ticks: Option<u64>,
    fps: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    if fps == 0 {
        return Err("--fps must be at least 1".into());
    }
    let scenario = load_scenario(script)?;
    let mut registry = new_registry(config);
    roster.load_into(&mut registry)?;

    // Trailing empty frames let every track time out and hide.
    let frame_count = scenario.frames.len() + config.tracker_max_lost + 1;
    let speech: Box<dyn SpeechPort> = if scenario.answers.is_empty() {
        Box::new(ConsoleSpeech::new())
    } else {
        Box::new(ScriptedSpeech::new(scenario.answers, SCRIPTED_ANSWER_DELAY))
    };

    let mut engine = ThreadedRecognitionEngine::new(config);
    engine.start(Box::new(ReplayFaceDetector::from_frames(scenario.frames)))?;
    let gate = engine.frame_gate();

    let finished = Arc::new(AtomicBool::new(false));
    let capture = spawn_capture(
        gate,
        frame_count,
        Duration::from_secs(1) / fps,
        config.frame_wait() * 2,
        finished.clone(),
    );

    let mut control = ControlLoop::new(
        config,
        Box::new(engine),
        registry,
        speech,
        Box::new(LoggingFaceObserver::new()),
    );
    let stats = control.run(&finished, max_ticks);
    finished.store(true, Ordering::Relaxed);
    if capture.join().is_err() {
        log::warn!("Capture thread panicked");
    }

    let registry = control.into_registry();
    roster.save_registry(&registry)?;
    println!(
        "Ran {} ticks: {} events, {} interviews, {} contacts saved to {}",
        stats.ticks,
        stats.events,
        stats.interviews,
        registry.len(),
        roster.path().display()
    );
    Ok(())
}

/// Synthetic camera: submits blank frames at a fixed rate, then raises
/// `finished` once the engine has had `grace` to drain the last one.
fn spawn_capture(
    gate: Arc<FrameGate>,
    frame_count: usize,
    frame_interval: Duration,
    grace: Duration,
    finished: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for index in 0..frame_count {
            if finished.load(Ordering::Relaxed) {
                return;
            }
            gate.submit(Frame::blank(CAPTURE_WIDTH, CAPTURE_HEIGHT, index));
            thread::sleep(frame_interval);
        }
        thread::sleep(grace);
        finished.store(true, Ordering::Relaxed);
    })
}

fn load_config(path: Option<&Path>) -> Result<RobotConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => RobotConfig::load_from(path)?,
        None => RobotConfig::load(),
    };
    config.validate()?;
    Ok(config)
}

fn roster_path(explicit: Option<PathBuf>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    explicit
        .or_else(RobotConfig::default_roster_path)
        .ok_or_else(|| "No config directory available, pass --roster".into())
}

fn load_scenario(path: &Path) -> Result<Scenario, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read scenario {}: {e}", path.display()))?;
    let scenario: Scenario = serde_json::from_str(&text)
        .map_err(|e| format!("Failed to parse scenario {}: {e}", path.display()))?;
    Ok(scenario)
}

fn new_registry(config: &RobotConfig) -> IdentityRegistry {
    IdentityRegistry::new(Box::new(DistanceMatcher::new(config.match_tolerance)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use facefriend_core::identity::domain::contact::Contact;

    #[test]
    fn test_scenario_parses_detections_and_answers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.json");
        fs::write(
            &path,
            r#"{
                "frames": [[{"bounds": [10, 10, 50, 50], "encoding": [0.1, 0.2]}], []],
                "answers": ["Sam", null]
            }"#,
        )
        .unwrap();

        let scenario = load_scenario(&path).unwrap();
        assert_eq!(scenario.frames.len(), 2);
        assert_eq!(scenario.frames[0][0].bounds.right(), 50);
        assert!(scenario.frames[1].is_empty());
        assert_eq!(scenario.answers, vec![Some("Sam".to_string()), None]);
    }

    #[test]
    fn test_scenario_without_answers_is_interactive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.json");
        fs::write(&path, r#"{"frames": []}"#).unwrap();
        assert!(load_scenario(&path).unwrap().answers.is_empty());
    }

    #[test]
    fn test_invalid_scenario_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "not json").unwrap();
        let err = load_scenario(&path).unwrap_err().to_string();
        assert!(err.contains("broken.json"));
    }

    #[test]
    fn test_delete_removes_contact_from_roster() {
        let dir = tempfile::tempdir().unwrap();
        let roster = JsonRosterStore::new(dir.path().join("contacts.json"));
        let config = RobotConfig::default();
        let mut registry = new_registry(&config);
        registry.insert(Contact::new(ContactId(1), "Ada", None)).unwrap();
        registry.insert(Contact::new(ContactId(2), "Sam", None)).unwrap();
        roster.save_registry(&registry).unwrap();

        delete_contact(&roster, &config, ContactId(1)).unwrap();

        let names: Vec<String> = roster
            .load()
            .unwrap()
            .into_iter()
            .map(|c| c.display_name)
            .collect();
        assert_eq!(names, vec!["Sam".to_string()]);
        assert!(delete_contact(&roster, &config, ContactId(1)).is_err());
    }

    #[test]
    fn test_explicit_roster_path_wins() {
        let path = roster_path(Some(PathBuf::from("/tmp/roster.json"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/roster.json"));
    }

    #[test]
    fn test_cli_parses_run_options() {
        let cli = Cli::try_parse_from([
            "facefriend",
            "--roster",
            "r.json",
            "run",
            "--script",
            "s.json",
            "--max-ticks",
            "50",
        ])
        .unwrap();
        assert_eq!(cli.roster, Some(PathBuf::from("r.json")));
        match cli.command {
            Command::Run {
                script,
                max_ticks,
                fps,
            } => {
                assert_eq!(script, PathBuf::from("s.json"));
                assert_eq!(max_ticks, Some(50));
                assert_eq!(fps, 10);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_cli_accepts_provisional_ids() {
        let cli = Cli::try_parse_from(["facefriend", "delete", "-3"]).unwrap();
        assert!(matches!(cli.command, Command::Delete { id: -3 }));
    }
}
