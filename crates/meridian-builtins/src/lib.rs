//! Built-in "native" contracts: Params, Authority, Prototype, Energy, and
//! Executor, plus the native dispatch registry and event log shared by
//! all of them.

pub mod addresses;
pub mod authority;
pub mod dispatch;
pub mod energy;
pub mod error;
pub mod events;
pub mod executor;
pub mod params;
pub mod prototype;

pub use authority::Authority;
pub use dispatch::NativeRegistry;
pub use energy::Energy;
pub use error::{ContractError, Result};
pub use events::{Event, EventLog};
pub use executor::Executor;
pub use params::Params;
pub use prototype::Prototype;
