//! End-to-end lifecycle tests running the service layer against the
//! in-memory backend, with the event dispatcher task live so realtime
//! fan-out can be observed on the broadcast hubs.

use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};

use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::time::timeout;
use uuid::Uuid;

use podium_back::{
    config::AppConfig,
    dao::{
        contest_store::{ContestStore, memory::MemoryContestStore},
        models::{Badge, ChallengeEntity, ChallengeKind, ScoreStatus, TeamEntity},
    },
    dto::{
        auth::{Principal, Role},
        score::{RejectScoreRequest, SubmitScoreRequest, ValidateScoreRequest},
        sse::ServerEvent,
    },
    error::ServiceError,
    services::{events, leaderboard_service, score_service},
    state::{AppState, SharedState},
};

/// Build a ready state: memory backend installed, dispatcher running.
async fn setup() -> (SharedState, MemoryContestStore) {
    let (state, events_rx) = AppState::new(AppConfig::default());
    tokio::spawn(events::run_dispatcher(state.clone(), events_rx));

    let store = MemoryContestStore::new();
    state.set_contest_store(Arc::new(store.clone())).await;
    (state, store)
}

fn admin() -> Principal {
    Principal {
        user_id: Uuid::new_v4(),
        role: Role::Admin,
        team_id: None,
    }
}

fn member_of(team_id: Uuid) -> Principal {
    Principal {
        user_id: Uuid::new_v4(),
        role: Role::Member,
        team_id: Some(team_id),
    }
}

fn team(name: &str) -> TeamEntity {
    TeamEntity {
        id: Uuid::new_v4(),
        name: name.into(),
        logo: String::new(),
        leader_id: Uuid::new_v4(),
        members: vec![],
        score: 0,
        badges: vec![],
        created_at: SystemTime::now(),
    }
}

fn challenge(points: i64) -> ChallengeEntity {
    ChallengeEntity {
        id: Uuid::new_v4(),
        title: "capture the flag".into(),
        description: String::new(),
        kind: ChallengeKind::Principal,
        points,
        deadline: SystemTime::now() + Duration::from_secs(24 * 3600),
        is_active: true,
    }
}

async fn recv_event(receiver: &mut broadcast::Receiver<ServerEvent>) -> ServerEvent {
    timeout(Duration::from_secs(1), receiver.recv())
        .await
        .expect("timed out waiting for event")
        .expect("hub closed")
}

#[tokio::test]
async fn submit_creates_pending_score_and_blocks_duplicates() {
    let (state, store) = setup().await;
    let t = team("alpha");
    let c = challenge(250);
    store.put_team(t.clone());
    store.put_challenge(c.clone());

    let submitter = member_of(t.id);
    let request = SubmitScoreRequest {
        challenge_id: c.id,
        note: Some("proof attached".into()),
    };
    let score = score_service::submit(&state, &submitter, request)
        .await
        .unwrap();
    assert_eq!(score.status, ScoreStatus::Pending);
    assert_eq!(score.points_earned, 250);
    assert_eq!(score.team_id, t.id);

    // Second claim for the same pair, even from a teammate, must lose.
    let teammate = member_of(t.id);
    let err = score_service::submit(
        &state,
        &teammate,
        SubmitScoreRequest {
            challenge_id: c.id,
            note: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn submit_preconditions_are_enforced() {
    let (state, store) = setup().await;
    let t = team("alpha");
    store.put_team(t.clone());

    let submitter = member_of(t.id);

    // Unknown challenge.
    let err = score_service::submit(
        &state,
        &submitter,
        SubmitScoreRequest {
            challenge_id: Uuid::new_v4(),
            note: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    // Deactivated challenge.
    let mut inactive = challenge(100);
    inactive.is_active = false;
    store.put_challenge(inactive.clone());
    let err = score_service::submit(
        &state,
        &submitter,
        SubmitScoreRequest {
            challenge_id: inactive.id,
            note: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));

    // Deadline in the past.
    let mut expired = challenge(100);
    expired.deadline = SystemTime::now() - Duration::from_secs(60);
    store.put_challenge(expired.clone());
    let err = score_service::submit(
        &state,
        &submitter,
        SubmitScoreRequest {
            challenge_id: expired.id,
            note: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));

    // Caller without a team.
    let err = score_service::submit(
        &state,
        &admin(),
        SubmitScoreRequest {
            challenge_id: challenge(100).id,
            note: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

#[tokio::test]
async fn validate_credits_team_awards_first_badge_and_notifies() {
    let (state, store) = setup().await;
    let t = team("alpha");
    let c = challenge(500);
    store.put_team(t.clone());
    store.put_challenge(c.clone());

    let mut global = state.global_hub().subscribe();
    let mut team_channel = state.team_channels().hub(t.id).subscribe();

    let score = score_service::submit(
        &state,
        &member_of(t.id),
        SubmitScoreRequest {
            challenge_id: c.id,
            note: None,
        },
    )
    .await
    .unwrap();

    let event = recv_event(&mut global).await;
    assert_eq!(event.event.as_deref(), Some("score-submitted"));
    let payload: serde_json::Value = serde_json::from_str(&event.data).unwrap();
    assert_eq!(payload["challenge_id"], serde_json::json!(c.id));

    let validated = score_service::validate(
        &state,
        &admin(),
        score.id,
        ValidateScoreRequest { note: None },
    )
    .await
    .unwrap();
    assert_eq!(validated.status, ScoreStatus::Validated);
    assert!(validated.validated_by.is_some());

    let reloaded = store.find_team(t.id).await.unwrap().unwrap();
    assert_eq!(reloaded.score, 500);
    assert_eq!(reloaded.badges, vec![Badge::FirstChallenge]);

    let event = recv_event(&mut global).await;
    assert_eq!(event.event.as_deref(), Some("leaderboard-updated"));
    let payload: serde_json::Value = serde_json::from_str(&event.data).unwrap();
    assert_eq!(payload["team_id"], serde_json::json!(t.id));
    assert_eq!(payload["new_score"], serde_json::json!(500));

    let event = recv_event(&mut team_channel).await;
    assert_eq!(event.event.as_deref(), Some("score-updated"));
    let payload: serde_json::Value = serde_json::from_str(&event.data).unwrap();
    assert_eq!(payload["score_id"], serde_json::json!(score.id));
    assert_eq!(payload["status"], serde_json::json!("validated"));
}

#[tokio::test]
async fn concurrent_validations_credit_exactly_once() {
    let (state, store) = setup().await;
    let t = team("alpha");
    let c = challenge(500);
    store.put_team(t.clone());
    store.put_challenge(c.clone());

    let score = score_service::submit(
        &state,
        &member_of(t.id),
        SubmitScoreRequest {
            challenge_id: c.id,
            note: None,
        },
    )
    .await
    .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let state = state.clone();
        let score_id = score.id;
        handles.push(tokio::spawn(async move {
            score_service::validate(
                &state,
                &admin(),
                score_id,
                ValidateScoreRequest { note: None },
            )
            .await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(err) => assert!(matches!(err, ServiceError::InvalidState(_))),
        }
    }
    assert_eq!(successes, 1);

    // The credit went through exactly once.
    let reloaded = store.find_team(t.id).await.unwrap().unwrap();
    assert_eq!(reloaded.score, 500);
}

#[tokio::test]
async fn reject_requires_note_moves_no_points_and_stays_off_the_global_channel() {
    let (state, store) = setup().await;
    let t = team("alpha");
    let c = challenge(300);
    store.put_team(t.clone());
    store.put_challenge(c.clone());

    let mut global = state.global_hub().subscribe();
    let mut team_channel = state.team_channels().hub(t.id).subscribe();

    let score = score_service::submit(
        &state,
        &member_of(t.id),
        SubmitScoreRequest {
            challenge_id: c.id,
            note: None,
        },
    )
    .await
    .unwrap();

    let err = score_service::reject(
        &state,
        &admin(),
        score.id,
        RejectScoreRequest { note: "   ".into() },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));

    // Drain the submission announcement so the later silence check is
    // about the rejection only.
    let event = recv_event(&mut global).await;
    assert_eq!(event.event.as_deref(), Some("score-submitted"));

    let rejected = score_service::reject(
        &state,
        &admin(),
        score.id,
        RejectScoreRequest {
            note: "insufficient evidence".into(),
        },
    )
    .await
    .unwrap();
    assert_eq!(rejected.status, ScoreStatus::Rejected);
    assert_eq!(rejected.validation_note, "insufficient evidence");

    let reloaded = store.find_team(t.id).await.unwrap().unwrap();
    assert_eq!(reloaded.score, 0);
    assert!(reloaded.badges.is_empty());

    // Team channel gets the resolution; the global channel hears nothing.
    let event = recv_event(&mut team_channel).await;
    assert_eq!(event.event.as_deref(), Some("score-updated"));
    let payload: serde_json::Value = serde_json::from_str(&event.data).unwrap();
    assert_eq!(payload["status"], serde_json::json!("rejected"));
    assert!(matches!(global.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn resolving_twice_distinguishes_conflict_from_missing() {
    let (state, store) = setup().await;
    let t = team("alpha");
    let c = challenge(100);
    store.put_team(t.clone());
    store.put_challenge(c.clone());

    let score = score_service::submit(
        &state,
        &member_of(t.id),
        SubmitScoreRequest {
            challenge_id: c.id,
            note: None,
        },
    )
    .await
    .unwrap();
    score_service::validate(
        &state,
        &admin(),
        score.id,
        ValidateScoreRequest { note: None },
    )
    .await
    .unwrap();

    let err = score_service::reject(
        &state,
        &admin(),
        score.id,
        RejectScoreRequest {
            note: "changed my mind".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));

    let err = score_service::validate(
        &state,
        &admin(),
        Uuid::new_v4(),
        ValidateScoreRequest { note: None },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn deleting_a_validated_score_debits_the_team() {
    let (state, store) = setup().await;
    let t = team("alpha");
    let c = challenge(400);
    store.put_team(t.clone());
    store.put_challenge(c.clone());

    let score = score_service::submit(
        &state,
        &member_of(t.id),
        SubmitScoreRequest {
            challenge_id: c.id,
            note: None,
        },
    )
    .await
    .unwrap();
    score_service::validate(
        &state,
        &admin(),
        score.id,
        ValidateScoreRequest { note: None },
    )
    .await
    .unwrap();
    assert_eq!(store.find_team(t.id).await.unwrap().unwrap().score, 400);

    score_service::delete(&state, &admin(), score.id).await.unwrap();

    assert_eq!(store.find_team(t.id).await.unwrap().unwrap().score, 0);
    assert!(store.find_score(score.id).await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_deletes_debit_exactly_once() {
    let (state, store) = setup().await;
    let t = team("alpha");
    store.put_team(t.clone());

    // Two validated scores so the clamp at zero cannot mask a double debit.
    let keep = challenge(500);
    let doomed = challenge(400);
    store.put_challenge(keep.clone());
    store.put_challenge(doomed.clone());
    let mut doomed_score_id = None;
    for c in [&keep, &doomed] {
        let score = score_service::submit(
            &state,
            &member_of(t.id),
            SubmitScoreRequest {
                challenge_id: c.id,
                note: None,
            },
        )
        .await
        .unwrap();
        score_service::validate(
            &state,
            &admin(),
            score.id,
            ValidateScoreRequest { note: None },
        )
        .await
        .unwrap();
        if c.id == doomed.id {
            doomed_score_id = Some(score.id);
        }
    }
    let doomed_score_id = doomed_score_id.unwrap();
    assert_eq!(store.find_team(t.id).await.unwrap().unwrap().score, 900);

    let mut handles = Vec::new();
    for _ in 0..2 {
        let state = state.clone();
        handles.push(tokio::spawn(async move {
            score_service::delete(&state, &admin(), doomed_score_id).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => successes += 1,
            Err(err) => assert!(matches!(err, ServiceError::NotFound(_))),
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(store.find_team(t.id).await.unwrap().unwrap().score, 500);
}

#[tokio::test]
async fn score_lookup_is_gated_to_admins_and_the_owning_team() {
    let (state, store) = setup().await;
    let t = team("alpha");
    let c = challenge(250);
    store.put_team(t.clone());
    store.put_challenge(c.clone());

    let score = score_service::submit(
        &state,
        &member_of(t.id),
        SubmitScoreRequest {
            challenge_id: c.id,
            note: None,
        },
    )
    .await
    .unwrap();

    let own = score_service::get(&state, &member_of(t.id), score.id)
        .await
        .unwrap();
    assert_eq!(own.id, score.id);

    let as_admin = score_service::get(&state, &admin(), score.id).await.unwrap();
    assert_eq!(as_admin.id, score.id);

    let err = score_service::get(&state, &member_of(Uuid::new_v4()), score.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let err = score_service::get(&state, &admin(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn deleting_a_pending_score_moves_no_points() {
    let (state, store) = setup().await;
    let t = team("alpha");
    let c = challenge(400);
    store.put_team(t.clone());
    store.put_challenge(c.clone());

    let score = score_service::submit(
        &state,
        &member_of(t.id),
        SubmitScoreRequest {
            challenge_id: c.id,
            note: None,
        },
    )
    .await
    .unwrap();

    score_service::delete(&state, &admin(), score.id).await.unwrap();
    assert_eq!(store.find_team(t.id).await.unwrap().unwrap().score, 0);
}

#[tokio::test]
async fn first_challenge_badge_is_not_awarded_twice() {
    let (state, store) = setup().await;
    let t = team("alpha");
    store.put_team(t.clone());

    for points in [100, 200] {
        let c = challenge(points);
        store.put_challenge(c.clone());
        let score = score_service::submit(
            &state,
            &member_of(t.id),
            SubmitScoreRequest {
                challenge_id: c.id,
                note: None,
            },
        )
        .await
        .unwrap();
        score_service::validate(
            &state,
            &admin(),
            score.id,
            ValidateScoreRequest { note: None },
        )
        .await
        .unwrap();
    }

    let reloaded = store.find_team(t.id).await.unwrap().unwrap();
    assert_eq!(reloaded.score, 300);
    assert_eq!(reloaded.badges, vec![Badge::FirstChallenge]);
}

#[tokio::test]
async fn team_rank_counts_strictly_higher_scores() {
    let (state, store) = setup().await;
    let mut alpha = team("alpha");
    alpha.score = 500;
    let mut bravo = team("bravo");
    bravo.score = 500;
    let mut charlie = team("charlie");
    charlie.score = 300;
    store.put_team(alpha.clone());
    store.put_team(bravo.clone());
    store.put_team(charlie.clone());

    let rank = leaderboard_service::team_rank(&state, alpha.id).await.unwrap();
    assert_eq!(rank.rank, 1);
    let rank = leaderboard_service::team_rank(&state, bravo.id).await.unwrap();
    assert_eq!(rank.rank, 1);
    let rank = leaderboard_service::team_rank(&state, charlie.id).await.unwrap();
    assert_eq!(rank.rank, 3);

    let board = leaderboard_service::leaderboard(&state).await.unwrap();
    let ranks: Vec<u64> = board.entries.iter().map(|entry| entry.rank).collect();
    assert_eq!(ranks, vec![1, 1, 3]);

    let err = leaderboard_service::team_rank(&state, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn team_scores_listing_is_public_and_aggregates() {
    let (state, store) = setup().await;
    let t = team("alpha");
    store.put_team(t.clone());

    let validated = challenge(500);
    let rejected = challenge(100);
    store.put_challenge(validated.clone());
    store.put_challenge(rejected.clone());

    let first = score_service::submit(
        &state,
        &member_of(t.id),
        SubmitScoreRequest {
            challenge_id: validated.id,
            note: None,
        },
    )
    .await
    .unwrap();
    score_service::validate(
        &state,
        &admin(),
        first.id,
        ValidateScoreRequest { note: None },
    )
    .await
    .unwrap();

    let second = score_service::submit(
        &state,
        &member_of(t.id),
        SubmitScoreRequest {
            challenge_id: rejected.id,
            note: None,
        },
    )
    .await
    .unwrap();
    score_service::reject(
        &state,
        &admin(),
        second.id,
        RejectScoreRequest {
            note: "insufficient evidence".into(),
        },
    )
    .await
    .unwrap();

    // No principal involved; the listing serves public team pages.
    let response = score_service::team_scores(&state, t.id).await.unwrap();
    assert_eq!(response.stats.total, 2);
    assert_eq!(response.stats.validated, 1);
    assert_eq!(response.stats.rejected, 1);
    assert_eq!(response.stats.pending, 0);
    assert_eq!(response.stats.total_points, 500);
}

#[tokio::test]
async fn admin_listings_and_stats_require_the_role() {
    let (state, store) = setup().await;
    let t = team("alpha");
    let c = challenge(500);
    store.put_team(t.clone());
    store.put_challenge(c.clone());

    let submitter = member_of(t.id);
    score_service::submit(
        &state,
        &submitter,
        SubmitScoreRequest {
            challenge_id: c.id,
            note: None,
        },
    )
    .await
    .unwrap();

    let err = score_service::list_pending(&state, &submitter)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let pending = score_service::list_pending(&state, &admin()).await.unwrap();
    assert_eq!(pending.total, 1);

    let stats = score_service::stats(&state, &admin()).await.unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.validated, 0);
    assert_eq!(stats.total_points_distributed, 0);
}

#[tokio::test]
async fn degraded_mode_rejects_lifecycle_operations() {
    let (state, events_rx) = AppState::new(AppConfig::default());
    tokio::spawn(events::run_dispatcher(state.clone(), events_rx));

    let err = score_service::team_scores(&state, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Degraded));
    assert!(state.is_degraded().await);
}
