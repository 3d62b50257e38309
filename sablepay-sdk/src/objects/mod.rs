//! Request, response, and state-model types for the SablePay API.

pub mod payment;
pub mod status;

pub use payment::{
    CreatePaymentResponse, Metadata, PaymentItem, PaymentRecord, PaymentRequest, RequestError,
    StatusSnapshot,
};
pub use status::{PaymentStatus, StatusClass, format_amount};
