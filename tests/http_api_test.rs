//! Wire-level behaviour of `HttpApi` against the fake backend.

mod common;

use common::{ExhaustedBody, FakeBackend, FakePuzzle, FakeState, MATE_IN_ONE_FEN};
use woodpecker_client::{ClientError, PuzzleApi};

fn single_puzzle(exhausted_body: ExhaustedBody) -> FakeState {
    let mut state = FakeState::default();
    state.add_set(7, "Single", vec![FakePuzzle::new(70, MATE_IN_ONE_FEN, &["f3f7"])]);
    state.exhausted_body = exhausted_body;
    state
}

#[tokio::test]
async fn test_lists_puzzle_sets() {
    let backend = FakeBackend::spawn(single_puzzle(ExhaustedBody::NoContent)).await;
    let sets = backend.api().puzzle_sets().await.unwrap();

    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].id, 7);
    assert_eq!(sets[0].name, "Single");
    assert_eq!(sets[0].size, Some(1));
}

#[tokio::test]
async fn test_start_session_returns_first_puzzle() {
    let backend = FakeBackend::spawn(single_puzzle(ExhaustedBody::NoContent)).await;
    let start = backend.api().start_session(7).await.unwrap();

    assert_eq!(start.id, "s1");
    assert_eq!(start.puzzle.id, 70);
    assert_eq!(start.puzzle.fen, MATE_IN_ONE_FEN);
    assert!(start.puzzle.initial_move.is_none());
    assert_eq!(start.score, 0);
}

#[tokio::test]
async fn test_rejected_session_start_keeps_server_detail() {
    let backend = FakeBackend::spawn(single_puzzle(ExhaustedBody::NoContent)).await;
    let err = backend.api().start_session(8).await.unwrap_err();

    match err {
        ClientError::SessionCreate(detail) => assert_eq!(detail, "Puzzle set not found"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_every_empty_next_puzzle_body_means_exhausted() {
    for body in [ExhaustedBody::NoContent, ExhaustedBody::Null, ExhaustedBody::EmptyObject] {
        let backend = FakeBackend::spawn(single_puzzle(body)).await;
        let api = backend.api();
        let start = api.start_session(7).await.unwrap();

        let next = api.next_puzzle(&start.id).await.unwrap();
        assert!(next.is_none(), "{body:?}");
    }
}

#[tokio::test]
async fn test_move_is_sent_under_move_key() {
    let backend = FakeBackend::spawn(single_puzzle(ExhaustedBody::NoContent)).await;
    let api = backend.api();
    let start = api.start_session(7).await.unwrap();

    let verdict = api.submit_move(&start.id, "f3f7").await.unwrap();
    assert!(verdict.correct);
    assert!(verdict.puzzle_solved);
    assert_eq!(verdict.score, 1);
    assert_eq!(backend.state.lock().unwrap().moves, vec!["f3f7".to_string()]);
}

#[tokio::test]
async fn test_error_detail_is_surfaced() {
    let backend = FakeBackend::spawn(single_puzzle(ExhaustedBody::NoContent)).await;
    let api = backend.api();
    let start = api.start_session(7).await.unwrap();
    api.submit_move(&start.id, "f3f7").await.unwrap();

    // Nothing left to hint at once the line is finished
    let err = api.hint(&start.id).await.unwrap_err();
    match err {
        ClientError::Status { status, detail } => {
            assert_eq!(status, 400);
            assert_eq!(detail, "No hint available");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
