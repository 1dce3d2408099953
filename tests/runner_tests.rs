mod common;

use std::time::{Duration, Instant};

use battlebots::{
    BattleshipsGame, BotError, FailureKind, GameOutcome, GameRunner, ProcessBot, MAX_RESPONSE_BYTES,
    TOTAL_SHIP_CELLS,
};
use common::{ship_indices, Always, Failing, Perfect, Sequential};

fn runner() -> GameRunner<BattleshipsGame> {
    GameRunner::new()
}

#[tokio::test]
async fn garbage_response_is_an_illegal_move() {
    let result = runner().play(&Always("abc"), Some(1)).await;
    let failure = result.failure().expect("should fail");
    assert_eq!(failure.kind, FailureKind::IllegalMove);
    assert_eq!(failure.bot_response.as_deref(), Some("abc"));
    assert!(failure.bot_request.as_deref().unwrap().split(',').all(|c| c == "0"));
    assert_eq!(result.history.len(), 1);
    assert!(result.history[0].request.is_none());
    assert_eq!(result.seed, 1);
}

#[tokio::test]
async fn repeating_a_cell_is_an_illegal_move() {
    let result = runner().play(&Always("0"), Some(2)).await;
    assert_eq!(result.failure().map(|f| f.kind), Some(FailureKind::IllegalMove));
    // the first shot at 0 was accepted
    assert_eq!(result.history.len(), 2);
    assert_eq!(result.history[1].response.as_deref(), Some("0"));
}

#[tokio::test]
async fn bot_errors_keep_their_kind() {
    let timeout = runner()
        .play(&Failing(BotError::Timeout(Duration::from_secs(10))), Some(3))
        .await;
    assert_eq!(timeout.failure().map(|f| f.kind), Some(FailureKind::Timeout));

    let crash = runner()
        .play(&Failing(BotError::Execution("segfault".into())), Some(3))
        .await;
    let failure = crash.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::ExecutionError);
    assert!(failure.message.contains("segfault"));
    assert!(failure.bot_response.is_none());
}

#[tokio::test]
async fn perfect_bot_scores_one() {
    let result = runner().play(&Perfect::for_seed(77), Some(77)).await;
    match result.outcome {
        GameOutcome::Success { score, moves } => {
            assert_eq!(moves, TOTAL_SHIP_CELLS);
            assert_eq!(score, 1.0);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(result.history.len(), TOTAL_SHIP_CELLS + 1);
}

#[tokio::test]
async fn sequential_bot_from_seed_42_is_reproducible() {
    let first = runner().play(&Sequential, Some(42)).await;
    let second = runner().play(&Sequential, Some(42)).await;
    assert_eq!(first, second);

    let expected_moves = ship_indices(&BattleshipsGame::new(42)).last().unwrap() + 1;
    match first.outcome {
        GameOutcome::Success { moves, score } => {
            assert_eq!(moves, expected_moves);
            let max_misses = (100 - TOTAL_SHIP_CELLS) as f64;
            let expected = (max_misses - (moves - TOTAL_SHIP_CELLS) as f64) / max_misses;
            assert!((score - expected).abs() < 1e-12);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn missing_seed_is_generated_and_recorded() {
    let result = runner().play(&Sequential, None).await;
    assert!(result.success());
    let replay = runner().play(&Sequential, Some(result.seed)).await;
    assert_eq!(result, replay);
}

#[tokio::test]
async fn nonexistent_executable_is_an_execution_error() {
    let bot = ProcessBot::new("/definitely/not/a/bot", Duration::from_secs(1));
    let result = runner().play(&bot, Some(4)).await;
    assert_eq!(result.failure().map(|f| f.kind), Some(FailureKind::ExecutionError));
}

#[tokio::test]
async fn sequential_bot_binary_matches_in_process_bot() {
    let bot = ProcessBot::new(env!("CARGO_BIN_EXE_sequential_bot"), Duration::from_secs(10));
    let from_process = runner().play(&bot, Some(42)).await;
    let in_process = runner().play(&Sequential, Some(42)).await;
    assert!(from_process.success());
    assert_eq!(from_process.score(), in_process.score());
    assert_eq!(from_process.history.len(), in_process.history.len());
}

#[cfg(unix)]
mod shell_bots {
    use super::*;

    fn sh(script: &str, timeout: Duration) -> ProcessBot {
        // the request lands in $1
        ProcessBot::with_args(
            "sh",
            vec!["-c".to_string(), script.to_string(), "bot".to_string()],
            timeout,
        )
    }

    #[tokio::test]
    async fn slow_bot_times_out() {
        let started = Instant::now();
        let result = runner()
            .play(&sh("sleep 5", Duration::from_millis(200)), Some(5))
            .await;
        assert_eq!(result.failure().map(|f| f.kind), Some(FailureKind::Timeout));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn printed_garbage_is_an_illegal_move() {
        let result = runner()
            .play(&sh("echo abc", Duration::from_secs(5)), Some(6))
            .await;
        let failure = result.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::IllegalMove);
        assert_eq!(failure.bot_response.as_deref(), Some("abc\n"));
    }

    #[tokio::test]
    async fn flood_of_output_is_cut_off_as_illegal() {
        let script = "head -c 20000000 /dev/zero | tr '\\0' a";
        let result = runner()
            .play(&sh(script, Duration::from_secs(20)), Some(8))
            .await;
        let failure = result.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::IllegalMove);
        assert_eq!(failure.bot_response, None);
        assert!(failure.message.contains(&MAX_RESPONSE_BYTES.to_string()));
        assert!(serde_json::to_string(&result).unwrap().len() < 64 * 1024);
    }

    #[tokio::test]
    async fn nonzero_exit_is_an_execution_error() {
        let result = runner()
            .play(&sh("echo 3; exit 3", Duration::from_secs(5)), Some(7))
            .await;
        assert_eq!(result.failure().map(|f| f.kind), Some(FailureKind::ExecutionError));
    }

    #[tokio::test]
    async fn request_is_the_last_argument() {
        // echoes back the index of the first unknown cell from $1
        let script = r#"echo "$1" | tr ',' '\n' | grep -n '^0$' | head -n 1 | cut -d: -f1 | awk '{print $1 - 1}'"#;
        let result = runner().play(&sh(script, Duration::from_secs(5)), Some(42)).await;
        let in_process = runner().play(&Sequential, Some(42)).await;
        assert!(result.success(), "{:?}", result.failure());
        assert_eq!(result.score(), in_process.score());
    }
}
