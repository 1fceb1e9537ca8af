//! Hydra Booking Demo
//!
//! Walks through the booking flow against in-memory persistence and an
//! in-memory cache:
//! - Availability for an empty day
//! - A booking request, its confirmation and the refreshed availability
//! - An overlapping request being refused
//! - A double confirm being refused
//! - A Redis outage, served from the database
//!
//! # Usage
//!
//! ```bash
//! cargo run -p hydra-booking --bin demo --features demo
//! ```

use hydra_booking::{Config, HydraApp};
use hydra_cache::InMemoryStore;
use hydra_core::{Cancellation, Decision};
use hydra_testing::{InMemoryRepository, fixtures, test_clock};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hydra_booking=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("\n============================================");
    println!("   Hydra Booking - Demo");
    println!("============================================\n");

    let config = Config::from_env()?;
    let repo = InMemoryRepository::new();
    let store = InMemoryStore::new();
    let app = HydraApp::new(repo.clone(), store.clone(), &config, Arc::new(test_clock()));
    let cancel = Cancellation::none();

    let venue = fixtures::venue(12);
    let customer = fixtures::customer();
    repo.seed_venue(venue.clone())?;
    repo.seed_customer(customer.clone())?;
    let date = fixtures::test_date();

    // 1. Empty day
    let availability = app.bookings.check_availability(venue.id, date, 4, &cancel).await?;
    println!("1. {} on {date}: {}", venue.name, availability.reason);

    // 2. Request and confirm 14:00-15:00
    let booking = app
        .bookings
        .create_booking(
            fixtures::new_booking(venue.id, customer.id, fixtures::at(14, 0), fixtures::at(15, 0), 4),
            &cancel,
        )
        .await?;
    println!("2. Requested {} ({})", booking.id, booking.status);

    let host = Decision::by("host@boathouse.example").with_note("Window table");
    let booking = app.bookings.confirm_booking(booking.id, &host, &cancel).await?;
    println!("   Confirmed by {:?}", booking.decided_by.as_deref().unwrap_or("-"));

    let availability = app.bookings.check_availability(venue.id, date, 4, &cancel).await?;
    println!("   Now: {}", availability.reason);

    // 3. Overlapping request
    let clash = app
        .bookings
        .create_booking(
            fixtures::new_booking(venue.id, customer.id, fixtures::at(14, 30), fixtures::at(15, 30), 2),
            &cancel,
        )
        .await;
    match clash {
        Err(e) => println!("3. 14:30-15:30 refused: {e}"),
        Ok(b) => println!("3. 14:30-15:30 unexpectedly accepted as {}", b.id),
    }

    // 4. Double confirm
    if let Err(e) = app.bookings.confirm_booking(booking.id, &host, &cancel).await {
        println!("4. Second confirm refused: {e}");
    }

    // 5. Cache outage
    store.set_offline(true);
    let fetched = app.bookings.get_booking(booking.id, &cancel).await?;
    println!(
        "5. Cache offline (healthy: {}), booking still readable: {}",
        app.cache_healthy().await,
        fetched.status
    );

    println!("\nDone.\n");
    Ok(())
}
