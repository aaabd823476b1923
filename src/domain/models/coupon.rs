use serde::{Deserialize, Serialize};

pub const INVALID_COUPON_MESSAGE: &str = "Invalid coupon code";

/// The single known code and what it is worth, plus the undiscounted fee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingPolicy {
    pub base_amount: u32,
    pub coupon_code: String,
    pub discount_amount: u32,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            base_amount: 1499,
            coupon_code: "LPUUPGRAD".to_string(),
            discount_amount: 500,
        }
    }
}

impl PricingPolicy {
    pub fn quote(&self, coupon: &CouponState) -> PriceQuote {
        let discount_amount = if coupon.applied() {
            self.discount_amount.min(self.base_amount)
        } else {
            0
        };
        PriceQuote {
            base_amount: self.base_amount,
            discount_amount,
            final_amount: self.base_amount - discount_amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub base_amount: u32,
    pub discount_amount: u32,
    pub final_amount: u32,
}

/// One-shot notices the UI shows as toasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponNotice {
    Applied,
    Removed,
}

/// Coupon field plus everything derived from it.
///
/// `applied` is only ever true while `code` equals the known code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CouponState {
    code: String,
    applied: bool,
    validation_error: Option<String>,
}

impl CouponState {
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn applied(&self) -> bool {
        self.applied
    }

    pub fn validation_error(&self) -> Option<&str> {
        self.validation_error.as_deref()
    }

    /// The code to store on the record, empty when no coupon is applied.
    pub fn applied_code(&self) -> &str {
        if self.applied { &self.code } else { "" }
    }

    /// Recomputes on every keystroke. Only the false -> true edge yields a notice.
    pub fn edit(&mut self, raw: &str, known_code: &str) -> Option<CouponNotice> {
        let was_applied = self.applied;
        self.code = raw.to_uppercase();

        if self.code.is_empty() {
            self.applied = false;
            self.validation_error = None;
            None
        } else if self.code == known_code.to_uppercase() {
            self.applied = true;
            self.validation_error = None;
            (!was_applied).then_some(CouponNotice::Applied)
        } else {
            self.applied = false;
            self.validation_error = Some(INVALID_COUPON_MESSAGE.to_string());
            None
        }
    }

    pub fn remove(&mut self) -> CouponNotice {
        *self = Self::default();
        CouponNotice::Removed
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const KNOWN: &str = "LPUUPGRAD";

    #[rstest]
    #[case("lpuupgrad", true)]
    #[case("LpuUpgrad", true)]
    #[case("LPUUPGRAD", true)]
    #[case("LPUUPGRAD ", false)]
    #[case("LPU", false)]
    #[case("", false)]
    fn applied_iff_normalized_code_matches(#[case] typed: &str, #[case] applied: bool) {
        let mut coupon = CouponState::default();
        coupon.edit(typed, KNOWN);
        assert_eq!(coupon.applied(), applied);
        assert_eq!(coupon.applied(), coupon.code() == KNOWN);
    }

    #[test]
    fn notice_only_on_first_match() {
        let mut coupon = CouponState::default();
        let mut notices = Vec::new();
        for typed in ["L", "LP", "LPUUPGRA", "LPUUPGRAD"] {
            notices.push(coupon.edit(typed, KNOWN));
        }
        // retyping the same value while applied stays quiet
        notices.push(coupon.edit("lpuupgrad", KNOWN));

        assert_eq!(notices, vec![None, None, None, Some(CouponNotice::Applied), None]);
    }

    #[test]
    fn editing_away_clears_applied_and_sets_error() {
        let mut coupon = CouponState::default();
        coupon.edit(KNOWN, KNOWN);
        coupon.edit("LPUUPGRA", KNOWN);

        assert!(!coupon.applied());
        assert_eq!(coupon.validation_error(), Some(INVALID_COUPON_MESSAGE));
        assert_eq!(coupon.applied_code(), "");
    }

    #[test]
    fn empty_code_clears_error_silently() {
        let mut coupon = CouponState::default();
        coupon.edit("WRONG", KNOWN);
        assert_eq!(coupon.edit("", KNOWN), None);
        assert_eq!(coupon.validation_error(), None);
        assert!(!coupon.applied());
    }

    #[test]
    fn reapplying_after_edit_away_notifies_again() {
        let mut coupon = CouponState::default();
        assert_eq!(coupon.edit(KNOWN, KNOWN), Some(CouponNotice::Applied));
        coupon.edit("X", KNOWN);
        assert_eq!(coupon.edit(KNOWN, KNOWN), Some(CouponNotice::Applied));
    }

    #[test]
    fn remove_resets_everything() {
        let mut coupon = CouponState::default();
        coupon.edit("WRONG", KNOWN);
        assert_eq!(coupon.remove(), CouponNotice::Removed);
        assert_eq!(coupon, CouponState::default());
    }

    #[test]
    fn quote_discounts_once_when_applied() {
        let policy = PricingPolicy::default();
        let mut coupon = CouponState::default();
        assert_eq!(policy.quote(&coupon).final_amount, 1499);

        coupon.edit(KNOWN, KNOWN);
        coupon.edit(KNOWN, KNOWN);
        let quote = policy.quote(&coupon);
        assert_eq!(quote.base_amount, 1499);
        assert_eq!(quote.discount_amount, 500);
        assert_eq!(quote.final_amount, 999);
    }
}
