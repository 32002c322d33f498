use rand::Rng;
use time::OffsetDateTime;

use super::repo_types::PaymentStatus;

/// `PAYhhmmssXXXXXX`: the local placeholder handed to the customer.
pub fn generate_payment_code(now: OffsetDateTime) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..0x100_0000);
    format!(
        "PAY{:02}{:02}{:02}{:06X}",
        now.hour(),
        now.minute(),
        now.second(),
        suffix
    )
}

/// Only a successful payment carries a settlement time.
pub fn paid_at_for(status: PaymentStatus, now: OffsetDateTime) -> Option<OffsetDateTime> {
    (status == PaymentStatus::Success).then_some(now)
}

#[cfg(test)]
mod tests {
    use regex::Regex;
    use time::macros::datetime;

    use super::*;

    #[test]
    fn payment_code_is_time_stamped() {
        let re = Regex::new(r"^PAY093005[0-9A-F]{6}$").unwrap();
        for _ in 0..20 {
            let code = generate_payment_code(datetime!(2024-06-01 09:30:05 UTC));
            assert!(re.is_match(&code), "{code}");
        }
    }

    #[test]
    fn only_success_sets_paid_at() {
        let now = datetime!(2024-06-01 09:30:05 UTC);
        assert_eq!(paid_at_for(PaymentStatus::Success, now), Some(now));
        assert_eq!(paid_at_for(PaymentStatus::Failed, now), None);
        assert_eq!(paid_at_for(PaymentStatus::Pending, now), None);
    }
}
