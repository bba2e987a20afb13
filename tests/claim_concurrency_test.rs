//! Concurrency test for the atomic claim: parallel claimers over one queue
//! must partition the jobs with no overlap.

use std::collections::HashSet;
use std::sync::Arc;

use vp_core::{JobSource, Profile};
use vp_db::pool::init_pool;
use vp_db::queries::jobs::{claim_next, create_job, NewJob};

#[test]
fn parallel_claimers_never_share_a_job() {
    const JOBS: usize = 40;
    const CLAIMERS: usize = 4;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("queue.db");
    let pool = Arc::new(init_pool(&db_path.to_string_lossy()).unwrap());

    let mut queued = HashSet::new();
    {
        let conn = pool.get().unwrap();
        for i in 0..JOBS {
            let job = create_job(
                &conn,
                &NewJob {
                    source: JobSource::Web,
                    user_id: None,
                    chat_id: None,
                    input_path: format!("/in/{i}.mp4"),
                    profile: Profile::Small,
                    input_bytes: 1,
                },
            )
            .unwrap();
            queued.insert(job.id);
        }
    }

    let handles: Vec<_> = (0..CLAIMERS)
        .map(|_| {
            let pool = Arc::clone(&pool);
            std::thread::spawn(move || {
                let mut claimed = Vec::new();
                let conn = pool.get().unwrap();
                while let Some(job) = claim_next(&conn).unwrap() {
                    claimed.push(job.id);
                }
                claimed
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            // A duplicate here means two claimers got the same job.
            assert!(seen.insert(id), "job {id} was claimed twice");
        }
    }

    assert_eq!(seen, queued);
}
