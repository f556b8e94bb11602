/// Selected address and checkout readiness
pub mod checkout;
/// Wall-clock abstraction
pub mod clock;
/// Cart and wishlist mutation requests
pub mod mutations;
/// User-facing notices
pub mod notice;
/// Identity and session state
pub mod session;
/// Cart and wishlist mirrors
pub mod shop;
/// Persistent key/value storage
pub mod storage;
/// Session budget enforcement
pub mod timer;
