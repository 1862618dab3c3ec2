use anyhow::Result;
use serde_json::json;
use spool_tracker::adapters::{
    ChannelNotificationSink, LocalFileResolver, MemorySettingsStore, StaticAuthorizer,
};
use spool_tracker::{AccountingService, HostEvent, JobCompletion, StateChange, UsageExtractor};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

struct Harness {
    uploads: TempDir,
    store: Arc<MemorySettingsStore>,
    service: AccountingService,
    updates: UnboundedReceiver<StateChange>,
}

async fn harness() -> Result<Harness> {
    let uploads = TempDir::new()?;
    let store = Arc::new(MemorySettingsStore::new());
    let (sink, updates) = ChannelNotificationSink::new();

    let service = AccountingService::init(
        store.clone(),
        Arc::new(sink),
        Arc::new(StaticAuthorizer::admin()),
        Arc::new(LocalFileResolver::new(uploads.path())),
        UsageExtractor::default(),
    )
    .await?;

    Ok(Harness {
        uploads,
        store,
        service,
        updates,
    })
}

fn write_gcode(dir: &TempDir, name: &str, used_g: &str) -> Result<JobCompletion> {
    let mut body = String::from("G28\nG1 Z0.2 F3000\n");
    for i in 0..500 {
        body.push_str(&format!("G1 X{} Y{} E0.05\n", i % 200, i % 180));
    }
    body.push_str("M104 S0\nM140 S0\n");
    body.push_str("; filament used [mm] = 1234.5\n");
    body.push_str(&format!("; filament used [g] = {}\n", used_g));
    std::fs::write(dir.path().join(name), body)?;

    Ok(JobCompletion {
        origin: "local".to_string(),
        path: name.to_string(),
    })
}

#[tokio::test]
async fn test_end_to_end_consumption_and_floor() -> Result<()> {
    let mut h = harness().await?;

    h.service
        .load_new_spool(1000.0, "PLA", "#ff0000", "Prusament")
        .await?;
    match h.updates.recv().await {
        Some(StateChange::SpoolLoaded {
            remaining_g,
            spool_capacity_g,
            ..
        }) => {
            assert_eq!(remaining_g, 1000.0);
            assert_eq!(spool_capacity_g, 1000.0);
        }
        other => panic!("expected a spool-loaded update, got {:?}", other),
    }

    let job = write_gcode(&h.uploads, "benchy.gcode", "250.0")?;
    let step = h.service.on_job_completed(&job).await.expect("usage recorded");
    assert_eq!(step.new_g, 750.0);
    assert_eq!(h.service.snapshot().await.remaining_g, 750.0);

    let update = h.updates.recv().await.expect("consumption broadcast");
    assert_eq!(
        serde_json::to_value(&update)?,
        json!({"remaining_g": 750.0, "color": "#ff0000", "manufacturer": "Prusament"})
    );

    let job = write_gcode(&h.uploads, "vase.gcode", "900.0")?;
    h.service.on_job_completed(&job).await;
    assert_eq!(h.service.snapshot().await.remaining_g, 0.0);
    assert_eq!(h.updates.recv().await.map(|u| u.remaining_g()), Some(0.0));

    let persisted = h.store.current().expect("settings persisted");
    assert_eq!(persisted.remaining_g, 0.0);
    assert_eq!(persisted.spool_capacity_g, 1000.0);

    Ok(())
}

#[tokio::test]
async fn test_missing_file_leaves_state_untouched() -> Result<()> {
    let mut h = harness().await?;
    h.service.load_new_spool(500.0, "PETG", "#00ff00", "").await?;
    h.updates.recv().await;
    let saves = h.store.save_count();

    let job = JobCompletion {
        origin: "local".to_string(),
        path: "never-uploaded.gcode".to_string(),
    };
    assert!(h.service.on_job_completed(&job).await.is_none());

    assert_eq!(h.service.snapshot().await.remaining_g, 500.0);
    assert_eq!(h.store.save_count(), saves);
    assert!(h.updates.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn test_unannotated_and_zero_usage_are_ignored() -> Result<()> {
    let mut h = harness().await?;
    h.service.load_new_spool(500.0, "PLA", "#000000", "").await?;
    h.updates.recv().await;

    std::fs::write(h.uploads.path().join("plain.gcode"), "G28\nM84\n")?;
    let plain = JobCompletion {
        origin: "local".to_string(),
        path: "plain.gcode".to_string(),
    };
    assert!(h.service.on_job_completed(&plain).await.is_none());

    let zero = write_gcode(&h.uploads, "zero.gcode", "0.00")?;
    assert!(h.service.on_job_completed(&zero).await.is_none());

    let malformed = write_gcode(&h.uploads, "broken.gcode", "1.2.3")?;
    assert!(h.service.on_job_completed(&malformed).await.is_none());

    assert_eq!(h.service.snapshot().await.remaining_g, 500.0);
    assert!(h.updates.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn test_unknown_origin_is_absorbed() -> Result<()> {
    let h = harness().await?;
    h.service.load_new_spool(500.0, "PLA", "#000000", "").await?;

    let job = JobCompletion {
        origin: "sdcard".to_string(),
        path: "benchy.gco".to_string(),
    };
    assert!(h.service.on_job_completed(&job).await.is_none());
    assert_eq!(h.service.snapshot().await.remaining_g, 500.0);
    Ok(())
}

#[tokio::test]
async fn test_host_events_only_account_print_done() -> Result<()> {
    let h = harness().await?;
    h.service.load_new_spool(1000.0, "PLA", "#000000", "").await?;
    write_gcode(&h.uploads, "part.gcode", "40.5")?;

    let failed: HostEvent = serde_json::from_value(json!({
        "event": "PrintFailed",
        "payload": {"origin": "local", "path": "part.gcode"}
    }))?;
    assert!(h.service.handle_host_event(&failed).await.is_none());

    let malformed: HostEvent = serde_json::from_value(json!({
        "event": "PrintDone",
        "payload": {"name": "part.gcode"}
    }))?;
    assert!(h.service.handle_host_event(&malformed).await.is_none());

    let done: HostEvent = serde_json::from_value(json!({
        "event": "PrintDone",
        "payload": {"origin": "local", "path": "part.gcode", "time": 812.4}
    }))?;
    let step = h.service.handle_host_event(&done).await.expect("usage recorded");
    assert_eq!(step.used_g, 40.5);
    assert_eq!(h.service.snapshot().await.remaining_g, 959.5);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_jobs_are_serialized() -> Result<()> {
    let h = harness().await?;
    h.service.load_new_spool(1000.0, "PLA", "#000000", "").await?;

    let mut jobs = Vec::new();
    for i in 0..8 {
        jobs.push(write_gcode(&h.uploads, &format!("part{}.gcode", i), "10")?);
    }

    let service = Arc::new(h.service);
    let handles: Vec<_> = jobs
        .into_iter()
        .map(|job| {
            let service = service.clone();
            tokio::spawn(async move { service.on_job_completed(&job).await })
        })
        .collect();
    for handle in handles {
        assert!(handle.await?.is_some());
    }

    assert_eq!(service.snapshot().await.remaining_g, 920.0);
    assert_eq!(h.store.current().map(|s| s.remaining_g), Some(920.0));
    Ok(())
}
