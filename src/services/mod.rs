pub mod balance;
pub mod calendar;
pub mod conflicts;
pub mod hierarchy;
pub mod lifecycle;
pub mod notifier;
pub mod validator;

pub use balance::{BalanceCalculator, BalanceSummary};
pub use calendar::{DateRange, count_business_days};
pub use conflicts::{Conflict, ConflictDetector};
pub use hierarchy::Hierarchy;
pub use lifecycle::{LeaveService, PendingReview};
pub use notifier::{LogNotifier, Notifier};
pub use validator::{LeaveValidator, Rejection, ValidationOutcome};
