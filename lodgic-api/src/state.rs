use lodgic_core::availability::AvailabilityChecker;
use lodgic_core::booking::BookingService;
use lodgic_core::repository::ReservationStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub checker: AvailabilityChecker,
    pub booking: Arc<BookingService>,
    pub reservations: Arc<dyn ReservationStore>,
}
