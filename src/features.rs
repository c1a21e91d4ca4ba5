//! Feature derivation.
//!
//! Maps the raw form answers onto the 35-column record the churn model was
//! trained on. Everything here is pure: identical answers always produce an
//! identical record.

use crate::models::{
    CustomerForm, FeatureRecord, FormOption, InternetService, MultipleLines, PaymentMethod,
    TenureGroup,
};

/// Customers below this tenure (in months) are flagged as new.
pub const NEW_CUSTOMER_TENURE_MONTHS: u32 = 6;

/// More than this many active services counts as having add-ons.
pub const ADDON_SERVICE_THRESHOLD: u8 = 2;

/// Inclusive upper bound of each tenure bucket, ascending. Anything above the
/// last bound falls into [`TenureGroup::Over60`].
const TENURE_BUCKETS: [(u32, TenureGroup); 6] = [
    (6, TenureGroup::UpTo6),
    (12, TenureGroup::UpTo12),
    (24, TenureGroup::UpTo24),
    (36, TenureGroup::UpTo36),
    (48, TenureGroup::UpTo48),
    (60, TenureGroup::UpTo60),
];

fn flag(set: bool) -> u8 {
    u8::from(set)
}

/// Buckets a tenure; the first bucket whose bound is not exceeded wins.
pub fn tenure_group(tenure_months: u32) -> TenureGroup {
    TENURE_BUCKETS
        .iter()
        .find(|(upper, _)| tenure_months <= *upper)
        .map(|(_, group)| *group)
        .unwrap_or(TenureGroup::Over60)
}

/// Average charge per month of tenure, or the monthly charge for customers
/// with no completed month.
pub fn avg_charge(tenure_months: u32, monthly_charges: f64, total_charges: f64) -> f64 {
    if tenure_months > 0 {
        total_charges / f64::from(tenure_months)
    } else {
        monthly_charges
    }
}

/// 1 when the payment method is one of the automatic ones.
pub fn has_autopay(payment_method: PaymentMethod) -> u8 {
    flag(payment_method.as_str().contains("automatic"))
}

/// Counts active services out of phone, multiple lines and the six add-ons.
///
/// Multiple lines only counts on a literal "Yes"; "No phone service" is 0.
pub fn total_services(form: &CustomerForm) -> u8 {
    let addons = [
        form.online_security,
        form.online_backup,
        form.device_protection,
        form.tech_support,
        form.streaming_tv,
        form.streaming_movies,
    ];

    flag(form.phone_service.is_yes())
        + flag(form.multiple_lines == MultipleLines::Yes)
        + addons.iter().map(|addon| flag(addon.is_yes())).sum::<u8>()
}

/// Builds the complete feature record for one customer.
pub fn derive_features(form: &CustomerForm) -> FeatureRecord {
    let total_services = total_services(form);

    FeatureRecord {
        gender: form.gender,
        senior_citizen: form.senior_citizen,
        partner: form.partner,
        dependents: form.dependents,
        tenure_months: form.tenure_months,
        phone_service: form.phone_service,
        multiple_lines: form.multiple_lines,
        internet_service: form.internet_service,
        online_security: form.online_security,
        online_backup: form.online_backup,
        device_protection: form.device_protection,
        tech_support: form.tech_support,
        streaming_tv: form.streaming_tv,
        streaming_movies: form.streaming_movies,
        contract: form.contract,
        paperless_billing: form.paperless_billing,
        payment_method: form.payment_method,
        monthly_charges: form.monthly_charges,
        total_charges: form.total_charges,
        cltv: form.cltv,

        tenure_group: tenure_group(form.tenure_months),
        online_security_flag: flag(form.online_security.is_yes()),
        online_backup_flag: flag(form.online_backup.is_yes()),
        device_protection_flag: flag(form.device_protection.is_yes()),
        tech_support_flag: flag(form.tech_support.is_yes()),
        streaming_tv_flag: flag(form.streaming_tv.is_yes()),
        streaming_movies_flag: flag(form.streaming_movies.is_yes()),
        total_services,
        has_addons: flag(total_services > ADDON_SERVICE_THRESHOLD),
        has_fiber: flag(form.internet_service == InternetService::FiberOptic),
        has_autopay: has_autopay(form.payment_method),
        is_senior: flag(form.senior_citizen.is_yes()),
        is_family: flag(form.partner.is_yes() || form.dependents.is_yes()),
        is_new_customer: flag(form.tenure_months < NEW_CUSTOMER_TENURE_MONTHS),
        avg_charge: avg_charge(form.tenure_months, form.monthly_charges, form.total_charges),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AddonService, YesNo};

    #[test]
    fn test_tenure_group_boundaries() {
        assert_eq!(tenure_group(0), TenureGroup::UpTo6);
        assert_eq!(tenure_group(6), TenureGroup::UpTo6);
        assert_eq!(tenure_group(7), TenureGroup::UpTo12);
        assert_eq!(tenure_group(12), TenureGroup::UpTo12);
        assert_eq!(tenure_group(13), TenureGroup::UpTo24);
        assert_eq!(tenure_group(60), TenureGroup::UpTo60);
        assert_eq!(tenure_group(61), TenureGroup::Over60);
        assert_eq!(tenure_group(72), TenureGroup::Over60);
        assert_eq!(tenure_group(100), TenureGroup::Over60);
    }

    #[test]
    fn test_avg_charge_guards_zero_tenure() {
        assert_eq!(avg_charge(0, 70.0, 12345.0), 70.0);
        assert_eq!(avg_charge(10, 70.0, 800.0), 80.0);
    }

    #[test]
    fn test_has_autopay() {
        assert_eq!(has_autopay(PaymentMethod::BankTransferAutomatic), 1);
        assert_eq!(has_autopay(PaymentMethod::CreditCardAutomatic), 1);
        assert_eq!(has_autopay(PaymentMethod::MailedCheck), 0);
        assert_eq!(has_autopay(PaymentMethod::ElectronicCheck), 0);
    }

    #[test]
    fn test_no_phone_service_does_not_count() {
        let form = CustomerForm {
            phone_service: YesNo::No,
            multiple_lines: MultipleLines::NoPhoneService,
            online_security: AddonService::No,
            online_backup: AddonService::No,
            device_protection: AddonService::No,
            tech_support: AddonService::No,
            streaming_tv: AddonService::No,
            streaming_movies: AddonService::No,
            ..CustomerForm::default()
        };
        assert_eq!(total_services(&form), 0);
    }

    #[test]
    fn test_default_form_counts_every_service() {
        let record = derive_features(&CustomerForm::default());
        assert_eq!(record.total_services, 8);
        assert_eq!(record.has_addons, 1);
        assert_eq!(record.tenure_group, TenureGroup::UpTo12);
        assert_eq!(record.is_new_customer, 0);
    }
}
