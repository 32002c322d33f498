use serde::Deserialize;
use uuid::Uuid;

use super::repo_types::PaymentStatus;

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub order_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePaymentRequest {
    pub status: PaymentStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_must_be_known() {
        let ok: UpdatePaymentRequest = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert_eq!(ok.status, PaymentStatus::Success);
        assert!(serde_json::from_str::<UpdatePaymentRequest>(r#"{"status":"refunded"}"#).is_err());
    }
}
