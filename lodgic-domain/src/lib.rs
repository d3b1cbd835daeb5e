pub mod range;
pub mod reservation;
pub mod room;

pub use range::{RangeError, StayRange};
pub use reservation::{NewReservation, Reservation, ReservationStatus};
pub use room::Room;
