// ndeftag/src/prelude.rs

pub use crate::engine::events::{EventSink, Operation, RwEvent};
pub use crate::engine::Engine;
pub use crate::transport::Transport;
pub use crate::{
    CardType, Error, FileId, NdefFlags, PresenceCheckOption, Result, StatusWord, Technology,
};

pub use crate::utils::{bytes_to_hex, default_response_timeout};
