pub mod cache;
pub mod card;
pub mod context;
pub mod dialog;
pub mod error;
pub mod events;
pub mod gateway;
pub mod i18n;
pub mod oven;
pub mod persistence;
pub mod screen;
pub mod selection;
pub mod session;
pub mod validation;

pub use cache::{QueryCache, QueryOptions, QueryState, Subscription};
pub use card::{CardFlow, CardOptions};
pub use context::{FloorContext, RefreshPolicy};
pub use dialog::{ConfirmDialog, FinishFaultDialog, ReportFaultDialog};
pub use error::{ClientError, ClientResult, ErrorKind, ValidationError};
pub use events::FloorEvent;
pub use gateway::{ActionGateway, HttpActionGateway};
pub use i18n::Dictionary;
pub use oven::OvenFlow;
pub use persistence::{DurableStorage, JsonFileStorage, MemoryStorage};
pub use screen::{CardScreen, CardState, OvenScreen, OvenState};
pub use selection::SelectionStore;
pub use session::{OperatorSlot, SessionState, SessionStore};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
