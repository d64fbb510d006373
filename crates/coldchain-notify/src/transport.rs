use crate::error::TransportError;
use coldchain_core::{CallId, CallRecord, CallStatus, ShipmentDetails};

#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    pub to: String,
    pub message: String,
    pub shipment_details: Option<ShipmentDetails>,
}

/// Provider view of a call between polls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallStatusUpdate {
    pub status: CallStatus,
    pub duration: Option<u32>,
}

/// Remote side of the call pipeline.
pub trait CallTransport {
    fn place_call(&self, request: &CallRequest) -> Result<CallRecord, TransportError>;

    fn call_status(&self, id: &CallId) -> Result<CallStatusUpdate, TransportError>;

    fn list_calls(&self) -> Result<Vec<CallRecord>, TransportError>;
}
