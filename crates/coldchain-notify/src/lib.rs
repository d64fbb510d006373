pub mod cancel;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod transport;
pub mod worker;

pub use cancel::{CancelToken, Pacer};
pub use dispatch::{
    poll_until_terminal, CallHistoryView, DispatchState, Dispatcher, FollowOutcome, FollowReport,
    HistorySource, PollPolicy,
};
pub use error::{NotifyError, TransportError};
pub use http::HttpCallTransport;
pub use transport::{CallRequest, CallStatusUpdate, CallTransport};
pub use worker::FollowHandle;
