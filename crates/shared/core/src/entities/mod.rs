mod kill_switch;
mod order;
mod order_status;
mod position;
mod side;
mod signal;

pub use kill_switch::KillSwitchState;
pub use order::{Order, OrderId, ParseOrderIdError};
pub use order_status::OrderStatus;
pub use position::Position;
pub use side::{ParseSideError, Side};
pub use signal::Signal;
