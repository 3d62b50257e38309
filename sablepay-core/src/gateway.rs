//! The seam between the polling core and the SablePay HTTP client.

use async_trait::async_trait;
use sablepay_sdk::client::{ClientError, PaymentClient};
use sablepay_sdk::objects::{PaymentRecord, PaymentRequest, StatusSnapshot};

/// Remote operations the flow and the poller depend on.
///
/// [`PaymentClient`] is the production implementation; tests substitute a
/// scripted gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment(&self, request: &PaymentRequest) -> Result<PaymentRecord, ClientError>;

    async fn get_payment_status(&self, payment_id: &str) -> Result<StatusSnapshot, ClientError>;
}

#[async_trait]
impl PaymentGateway for PaymentClient {
    async fn create_payment(&self, request: &PaymentRequest) -> Result<PaymentRecord, ClientError> {
        PaymentClient::create_payment(self, request).await
    }

    async fn get_payment_status(&self, payment_id: &str) -> Result<StatusSnapshot, ClientError> {
        PaymentClient::get_payment_status(self, payment_id).await
    }
}
