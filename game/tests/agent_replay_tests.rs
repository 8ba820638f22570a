use std::{
    fs,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use cryptris::agent::{CryptrisAction, CryptrisGame};
use cryptris::session::GameSession;
use cryptris::settings::GameConfig;
use engine::agent::{AgentCommand, AgentHost, AgentResponse};
use engine::regression::{record_then_replay_and_compare, state_sha256_hex};
use engine::{GameLogic, HeadlessRunner, TimeMachine};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!("cryptris_{tag}_{nanos}"))
}

fn game(seed: u64) -> CryptrisGame {
    CryptrisGame::new(10, seed, &GameConfig::default()).expect("length 10 is authorized")
}

fn scripted_moves() -> Vec<CryptrisAction> {
    let mut moves = CryptrisAction::parse_moves("<<^v").unwrap();
    moves.extend(std::iter::repeat_n(CryptrisAction::Tick, 40));
    moves.extend(CryptrisAction::parse_moves(">v").unwrap());
    moves.extend(std::iter::repeat_n(CryptrisAction::Tick, 40));
    moves
}

#[test]
fn initial_state_is_the_same_session_every_time() {
    let g = game(4);
    assert_eq!(g.initial_state(), g.initial_state());
    assert_eq!(g.initial_state(), GameSession::new(10, 4, &GameConfig::default()).unwrap());
}

#[test]
fn step_does_not_mutate_the_input_state() {
    let g = game(4);
    let initial = g.initial_state();
    let after = g.step(&initial, CryptrisAction::Tick);
    assert_eq!(initial.ticks(), 0);
    assert_eq!(after.ticks(), if initial.is_finished() { 0 } else { 1 });
}

#[test]
fn recorded_round_replays_frame_for_frame() {
    let out = unique_temp_dir("replay");
    let moves = scripted_moves();
    let artifacts = record_then_replay_and_compare("len10 seed3", &out, game(3), moves.clone())
        .expect("replay matches live run");

    assert_eq!(artifacts.hashes.len(), moves.len() + 1);
    assert!(artifacts.state_json.ends_with("len10_seed3.json"));

    let mut live = HeadlessRunner::new(game(3));
    live.run(moves);
    let last = state_sha256_hex(live.state()).unwrap();
    assert_eq!(artifacts.hashes.last(), Some(&last));

    let _ = fs::remove_dir_all(out);
}

#[test]
fn saved_recording_can_be_rewound_and_branched() {
    let path = unique_temp_dir("tm").join("round.json");
    let mut runner = HeadlessRunner::new(game(12));
    runner.run(scripted_moves());
    runner.timemachine().save_json_file(&path).expect("save");

    let tm = TimeMachine::<GameSession>::load_json_file(&path).expect("load");
    let mut replay = HeadlessRunner::from_timemachine(game(12), tm);
    assert_eq!(replay.state(), runner.state());

    replay.seek(4);
    let at_four = replay.state().clone();
    replay.step(CryptrisAction::Noop);
    assert_eq!(replay.frame(), 5);
    assert_eq!(replay.history().len(), 6);
    assert_eq!(replay.state(), &at_four);

    let _ = fs::remove_file(&path);
}

#[test]
fn agent_host_plays_until_round_ends() {
    let config = GameConfig {
        round_limit: Some(std::time::Duration::from_millis(160)),
        ..GameConfig::default()
    };
    let mut host = AgentHost::new(CryptrisGame::new(8, 1, &config).unwrap());

    let ticks = vec![CryptrisAction::Tick; 50];
    match host.handle(AgentCommand::Play(ticks)) {
        AgentResponse::State {
            frame,
            finished,
            state,
        } => {
            assert!(finished);
            assert!(frame <= 10);
            assert!(state.is_finished());
        }
        _ => panic!("expected state response"),
    }

    match host.handle(AgentCommand::Rewind { frames: 100 }) {
        AgentResponse::State { frame, state, .. } => {
            assert_eq!(frame, 0);
            assert_eq!(state.ticks(), 0);
        }
        _ => panic!("expected state response"),
    }
}
