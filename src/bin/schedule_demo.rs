// Runs a short booking session against the in-memory store and prints the list.
// Usage: schedule_demo [config.yaml]

use std::sync::Arc;

use anyhow::{Context, Result};
use bath_schedule::{
    tracing_init::init_tracing, BookingForm, InMemoryStore, ResourceType, Schedule,
    ScheduleConfig, ScheduleError, SystemClock, TracingNotifier,
};
use chrono::{Duration, Local};

fn local_start(from_now: Duration) -> String {
    (Local::now() + from_now).format("%Y-%m-%dT%H:%M").to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => ScheduleConfig::from_yaml_file(&path)
            .with_context(|| format!("loading config from {path}"))?,
        None => ScheduleConfig::default(),
    };
    init_tracing(&config.log_filter, config.log_json);

    let store = Arc::new(InMemoryStore::new());
    let schedule = Arc::new(Schedule::new(
        store.clone(),
        Arc::new(TracingNotifier),
        Arc::new(SystemClock),
        config,
    ));
    let live = schedule.clone().listen().await?;

    let t = Duration::minutes(30);
    let mut requests = vec![
        BookingForm::new("Andriy", "10", local_start(t), ResourceType::Toilet),
        BookingForm::new("Bohdana", "10", local_start(t + Duration::minutes(5)), ResourceType::Toilet),
        BookingForm::new("Viktor", "10", local_start(t + Duration::minutes(5)), ResourceType::Bath),
        BookingForm::new("Halyna", "10", local_start(t + Duration::minutes(10)), ResourceType::Toilet),
        BookingForm::new("Dmytro", "26", local_start(t + Duration::hours(1)), ResourceType::Bath),
        BookingForm::new("Yevhen", "5", local_start(-Duration::minutes(60)), ResourceType::Bath),
    ];

    for form in requests.iter_mut() {
        let name = form.name.clone();
        match schedule.submit(form).await {
            Ok(id) => println!("booked   {name:<8} -> {id}"),
            Err(ScheduleError::Store(e)) => return Err(e).context("store failure"),
            Err(e) => println!("rejected {name:<8} -> {e}"),
        }
        // let the listener catch up before the next request
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    println!();
    for view in schedule.bookings() {
        let b = &view.booking;
        println!(
            "{:<8} {:<6} {} {:>2} min  [{}]",
            b.name,
            b.resource,
            b.start.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            b.duration_minutes,
            view.status
        );
    }

    live.stop().await;
    Ok(())
}
