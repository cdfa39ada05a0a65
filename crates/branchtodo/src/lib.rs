#![doc = include_str!("../README.md")]

pub mod clock;
pub mod codec;
pub mod error;
pub mod protocol;
pub mod session;
pub mod store;
pub mod task;
pub mod view;

pub use clock::{Clock, FixedClock, SystemClock};
pub use codec::{decode, decode_at, encode, sanitize_text};
pub use error::{ConfirmError, DecodeError, EncodeError, MutationError, OpenError, StoreError};
pub use protocol::{AutoConfirm, Confirm, Inbound, Outbound};
pub use session::{SaveError, Session, WriteStatus};
pub use store::DescriptionStore;
pub use task::{BranchName, Task};
pub use view::{ErrorView, PanelState, PanelView, Stats, TaskView};
