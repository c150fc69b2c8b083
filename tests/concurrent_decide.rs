//! Two staff sessions racing to accept the same referral must serialize:
//! exactly one wins, the loser observes the terminal state, and exactly one
//! participant/case pair exists afterwards.

use std::sync::Barrier;
use std::thread;

use circlekeeper::db::open_database;
use circlekeeper::error::ServiceError;
use circlekeeper::gate::{AccessGate, Actor};
use circlekeeper::intake::{self, Decision, ReferralSubmission};
use circlekeeper::models::enums::{ReferralStatus, Role};
use uuid::Uuid;

fn coordinator() -> Actor {
    Actor {
        user_id: Uuid::new_v4(),
        role: Role::Coordinator,
    }
}

#[test]
fn concurrent_accepts_produce_one_participant_and_one_case() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race.db");

    let referral_id = {
        let conn = open_database(&path).unwrap();
        intake::ingest(
            &conn,
            &ReferralSubmission {
                first_name: Some("Jordan".into()),
                last_name: Some("Reyes".into()),
                date_of_birth: Some("2009-04-12".into()),
                referrer_name: Some("Sam Okafor".into()),
                referrer_email: Some("sam@school.example.org".into()),
                ..Default::default()
            },
        )
        .unwrap()
    };

    let barrier = Barrier::new(2);
    let results: Vec<Result<(), ServiceError>> = thread::scope(|s| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let path = path.clone();
                let barrier = &barrier;
                s.spawn(move || {
                    let mut conn = open_database(&path).unwrap();
                    let mut gate = AccessGate::new(&mut conn);
                    barrier.wait();
                    gate.decide_referral(&coordinator(), &referral_id, Decision::Accept, None)
                        .map(|_| ())
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1, "exactly one accept must win: {results:?}");
    let loss = results.into_iter().find(Result::is_err).unwrap().unwrap_err();
    assert!(
        matches!(loss, ServiceError::InvalidState(_)),
        "loser must see the terminal state, got {loss:?}"
    );

    let conn = open_database(&path).unwrap();
    assert_eq!(
        circlekeeper::db::repository::participant::count_participants(&conn).unwrap(),
        1
    );
    assert_eq!(
        circlekeeper::db::repository::case::count_cases(&conn).unwrap(),
        1
    );
    let referral = circlekeeper::db::repository::referral::get_referral(&conn, &referral_id).unwrap();
    assert_eq!(referral.status, ReferralStatus::Accepted);
    assert!(referral.participant_id.is_some());
}
