//! Axum boundary for the Hydra booking services.
//!
//! Maps [`hydra_core::BookingError`] onto HTTP responses and exposes the
//! health probes. Routing for the booking endpoints lives with the
//! deploying application.
//!
//! | error | status | code |
//! |---|---|---|
//! | `InvalidArgument` | 400 | `BAD_REQUEST` |
//! | `NotFound` | 404 | `NOT_FOUND` |
//! | `CapacityExceeded` | 422 | `CAPACITY_EXCEEDED` |
//! | `SlotConflict` | 409 | `SLOT_CONFLICT` |
//! | `InvalidState` | 409 | `INVALID_STATE` |
//! | `Cancelled` | 408 | `TIMEOUT` |
//! | `Storage` | 503 | `SERVICE_UNAVAILABLE` |
//!
//! # Example
//!
//! ```ignore
//! async fn get_booking(
//!     State(app): State<Arc<HydraApp<PgRepository, RedisStore>>>,
//!     Path(id): Path<Uuid>,
//! ) -> WebResult<Json<BookingDto>> {
//!     let booking = app
//!         .bookings
//!         .get_booking(BookingId::from_uuid(id), &Cancellation::none())
//!         .await?;
//!     Ok(Json(booking))
//! }
//! ```

pub mod error;
pub mod handlers;

pub use error::{AppError, ErrorBody};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
