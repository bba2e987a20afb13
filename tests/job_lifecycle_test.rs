//! End-to-end worker tests over an in-memory job store and stub tools.

#![cfg(unix)]

mod common;

use std::path::Path;

use common::{
    ffmpeg_body, ffprobe_body, stub_script, test_context, test_context_with_delivery, test_pool,
};
use vidpress::worker::process_next_job;
use vp_core::config::DeliveryConfig;
use vp_core::{JobSource, JobStatus, Profile};
use vp_db::models::Job;
use vp_db::queries::jobs::{create_job, get_job, NewJob};

fn queue_job(pool: &vp_db::pool::DbPool, input_path: &Path) -> Job {
    let conn = pool.get().unwrap();
    create_job(
        &conn,
        &NewJob {
            source: JobSource::Web,
            user_id: Some("u1".into()),
            chat_id: None,
            input_path: input_path.to_string_lossy().to_string(),
            profile: Profile::Balanced,
            input_bytes: 7,
        },
    )
    .unwrap()
}

fn queue_bot_job(pool: &vp_db::pool::DbPool, input_path: &Path) -> Job {
    let conn = pool.get().unwrap();
    create_job(
        &conn,
        &NewJob {
            source: JobSource::Bot,
            user_id: Some("u1".into()),
            chat_id: Some("c1".into()),
            input_path: input_path.to_string_lossy().to_string(),
            profile: Profile::Balanced,
            input_bytes: 7,
        },
    )
    .unwrap()
}

fn fetch(pool: &vp_db::pool::DbPool, id: vp_core::JobId) -> Job {
    let conn = pool.get().unwrap();
    get_job(&conn, id).unwrap().unwrap()
}

#[tokio::test]
async fn completes_job_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.mp4");
    std::fs::write(&input, b"raw").unwrap();

    let marker = dir.path().join("ffmpeg_ran");
    let ffprobe = stub_script(dir.path(), "ffprobe", &ffprobe_body("10.0", 1920, 1080));
    let ffmpeg = stub_script(dir.path(), "ffmpeg", &ffmpeg_body(&marker));

    let pool = test_pool();
    let job = queue_job(&pool, &input);
    let ctx = test_context(pool.clone(), dir.path(), 900, ffprobe, ffmpeg);

    assert!(process_next_job(&ctx).await.unwrap());

    let done = fetch(&pool, job.id);
    assert_eq!(done.status, JobStatus::Done);
    assert_eq!(done.progress, 100);
    assert_eq!(done.duration_seconds, 10);
    assert!(done.error_message.is_empty());

    let output = Path::new(done.output_path.as_deref().unwrap()).to_path_buf();
    assert_eq!(output, dir.path().join(format!("{}.mp4", job.id)));
    assert!(output.exists());
    assert_eq!(done.output_bytes, std::fs::metadata(&output).unwrap().len() as i64);
    assert!(marker.exists());
}

#[tokio::test]
async fn missing_input_fails_without_running_tools() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("ffmpeg_ran");
    let ffprobe = stub_script(dir.path(), "ffprobe", &ffprobe_body("10.0", 1280, 720));
    let ffmpeg = stub_script(dir.path(), "ffmpeg", &ffmpeg_body(&marker));

    let pool = test_pool();
    let job = queue_job(&pool, Path::new("/nonexistent/input.mp4"));
    let ctx = test_context(pool.clone(), dir.path(), 900, ffprobe, ffmpeg);

    assert!(process_next_job(&ctx).await.unwrap());

    let failed = fetch(&pool, job.id);
    assert_eq!(failed.status, JobStatus::Error);
    assert_eq!(failed.error_message, "Input file missing");
    assert!(!marker.exists());
}

#[tokio::test]
async fn unknown_duration_fails_before_encode() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.mp4");
    std::fs::write(&input, b"raw").unwrap();

    let marker = dir.path().join("ffmpeg_ran");
    let ffprobe = stub_script(dir.path(), "ffprobe", &ffprobe_body("N/A", 1280, 720));
    let ffmpeg = stub_script(dir.path(), "ffmpeg", &ffmpeg_body(&marker));

    let pool = test_pool();
    let job = queue_job(&pool, &input);
    let ctx = test_context(pool.clone(), dir.path(), 900, ffprobe, ffmpeg);

    assert!(process_next_job(&ctx).await.unwrap());

    let failed = fetch(&pool, job.id);
    assert_eq!(failed.status, JobStatus::Error);
    assert!(failed.error_message.contains("duration"));
    assert!(!marker.exists());
}

#[tokio::test]
async fn over_limit_records_measured_duration() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.mp4");
    std::fs::write(&input, b"raw").unwrap();

    let marker = dir.path().join("ffmpeg_ran");
    let ffprobe = stub_script(dir.path(), "ffprobe", &ffprobe_body("120.0", 1280, 720));
    let ffmpeg = stub_script(dir.path(), "ffmpeg", &ffmpeg_body(&marker));

    let pool = test_pool();
    let job = queue_job(&pool, &input);
    // Limit below the probed duration.
    let ctx = test_context(pool.clone(), dir.path(), 60, ffprobe, ffmpeg);

    assert!(process_next_job(&ctx).await.unwrap());

    let failed = fetch(&pool, job.id);
    assert_eq!(failed.status, JobStatus::Error);
    assert_eq!(failed.error_message, "Duration exceeds limit");
    assert_eq!(failed.duration_seconds, 120);
    assert!(!marker.exists());
}

#[tokio::test]
async fn failed_encode_removes_partial_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.mp4");
    std::fs::write(&input, b"raw").unwrap();

    let ffprobe = stub_script(dir.path(), "ffprobe", &ffprobe_body("10.0", 1280, 720));
    // Writes a partial output then dies.
    let ffmpeg = stub_script(
        dir.path(),
        "ffmpeg",
        "for last in \"$@\"; do :; done\n\
         printf 'partial' > \"$last\"\n\
         echo 'encoder exploded' >&2\n\
         exit 1",
    );

    let pool = test_pool();
    let job = queue_job(&pool, &input);
    let ctx = test_context(pool.clone(), dir.path(), 900, ffprobe, ffmpeg);

    assert!(process_next_job(&ctx).await.unwrap());

    let failed = fetch(&pool, job.id);
    assert_eq!(failed.status, JobStatus::Error);
    assert!(failed.error_message.contains("encoder exploded"));
    // Duration was measured before the encode failed.
    assert_eq!(failed.duration_seconds, 10);
    assert!(!dir.path().join(format!("{}.mp4", job.id)).exists());
}

#[tokio::test]
async fn failed_delivery_leaves_job_done() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.mp4");
    std::fs::write(&input, b"raw").unwrap();

    let marker = dir.path().join("ffmpeg_ran");
    let ffprobe = stub_script(dir.path(), "ffprobe", &ffprobe_body("10.0", 1280, 720));
    let ffmpeg = stub_script(dir.path(), "ffmpeg", &ffmpeg_body(&marker));

    // Token is set so delivery is attempted; the zero direct-send cap forces
    // the link fallback, and the bogus token guarantees it fails whether or
    // not the bot API is reachable.
    let delivery = DeliveryConfig {
        bot_token: Some("000000:invalid".into()),
        direct_send_limit_mb: 0,
        ..Default::default()
    };

    let pool = test_pool();
    let job = queue_bot_job(&pool, &input);
    let ctx = test_context_with_delivery(pool.clone(), dir.path(), 900, ffprobe, ffmpeg, delivery);

    assert!(process_next_job(&ctx).await.unwrap());

    // The delivery failure is logged only; the finished job is untouched.
    let done = fetch(&pool, job.id);
    assert_eq!(done.status, JobStatus::Done);
    assert_eq!(done.progress, 100);
    assert!(done.error_message.is_empty());
    assert!(done.output_path.is_some());
}

#[tokio::test]
async fn empty_queue_claims_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let ffprobe = stub_script(dir.path(), "ffprobe", &ffprobe_body("10.0", 1280, 720));
    let ffmpeg = stub_script(dir.path(), "ffmpeg", "exit 0");

    let pool = test_pool();
    let ctx = test_context(pool, dir.path(), 900, ffprobe, ffmpeg);

    assert!(!process_next_job(&ctx).await.unwrap());
}
