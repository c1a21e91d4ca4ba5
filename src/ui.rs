//! Server-rendered customer form and result view.

use crate::models::{
    AddonService, Contract, CustomerForm, FormOption, Gender, InternetService, ModelInfo,
    MultipleLines, PaymentMethod, PredictionResponse, RiskLevel, YesNo, MONTHLY_CHARGES_MAX,
    MONTHLY_CHARGES_MIN, TENURE_MAX_MONTHS,
};

/// What to show under the form after a submission.
#[derive(Debug)]
pub enum Outcome<'a> {
    Prediction(&'a PredictionResponse),
    Error(&'a str),
}

/// Escapes text for safe inclusion in HTML content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn select<T: FormOption>(name: &str, label: &str, options: &[T], selected: T) -> String {
    let options: String = options
        .iter()
        .map(|option| {
            let value = escape_html(option.as_str());
            let marker = if *option == selected { " selected" } else { "" };
            format!(r#"<option value="{value}"{marker}>{value}</option>"#)
        })
        .collect();

    format!(
        r#"<label for="{name}">{label}</label>
<select id="{name}" name="{name}">{options}</select>
"#
    )
}

fn number(name: &str, label: &str, bounds: (f64, Option<f64>), step: f64, value: f64) -> String {
    let (min, max) = bounds;
    let max = max.map(|m| format!(r#" max="{m}""#)).unwrap_or_default();

    format!(
        r#"<label for="{name}">{label}</label>
<input type="number" id="{name}" name="{name}" min="{min}"{max} step="{step}" value="{value}" required>
"#
    )
}

fn render_form(form: &CustomerForm) -> String {
    let left = [
        select("gender", "Gender", Gender::OPTIONS, form.gender),
        number(
            "tenure_months",
            "Tenure (months)",
            (0.0, Some(f64::from(TENURE_MAX_MONTHS))),
            1.0,
            f64::from(form.tenure_months),
        ),
        select("phone_service", "Phone Service", YesNo::OPTIONS, form.phone_service),
        select("multiple_lines", "Multiple Lines", MultipleLines::OPTIONS, form.multiple_lines),
        select(
            "internet_service",
            "Internet Service",
            InternetService::OPTIONS,
            form.internet_service,
        ),
        select("online_security", "Online Security", AddonService::OPTIONS, form.online_security),
        select("online_backup", "Online Backup", AddonService::OPTIONS, form.online_backup),
        select(
            "device_protection",
            "Device Protection",
            AddonService::OPTIONS,
            form.device_protection,
        ),
        select("tech_support", "Tech Support", AddonService::OPTIONS, form.tech_support),
        select("streaming_tv", "Streaming TV", AddonService::OPTIONS, form.streaming_tv),
        select(
            "streaming_movies",
            "Streaming Movies",
            AddonService::OPTIONS,
            form.streaming_movies,
        ),
        select("contract", "Contract Type", Contract::OPTIONS, form.contract),
        select("payment_method", "Payment Method", PaymentMethod::OPTIONS, form.payment_method),
        number(
            "monthly_charges",
            "Monthly Charges ($)",
            (MONTHLY_CHARGES_MIN, Some(MONTHLY_CHARGES_MAX)),
            0.5,
            form.monthly_charges,
        ),
        number(
            "total_charges",
            "Total Charges ($)",
            (0.0, None),
            10.0,
            form.total_charges,
        ),
        number("cltv", "CLTV", (0.0, None), 1.0, f64::from(form.cltv)),
    ]
    .concat();

    let right = [
        select("senior_citizen", "Senior Citizen", YesNo::NO_FIRST, form.senior_citizen),
        select("partner", "Partner", YesNo::NO_FIRST, form.partner),
        select("dependents", "Dependents", YesNo::NO_FIRST, form.dependents),
        select(
            "paperless_billing",
            "Paperless Billing",
            YesNo::NO_FIRST,
            form.paperless_billing,
        ),
    ]
    .concat();

    format!(
        r#"<form method="post" action="/predict">
<div class="columns">
<div class="column">
{left}</div>
<div class="column">
{right}</div>
</div>
<button type="submit">Predict Churn Risk</button>
</form>
"#
    )
}

fn render_outcome(outcome: &Outcome<'_>) -> String {
    match outcome {
        Outcome::Prediction(result) => {
            let class = match result.risk {
                RiskLevel::High => "result high",
                RiskLevel::Low => "result low",
            };
            let percent = (result.churn_probability * 100.0).clamp(0.0, 100.0) as u32;

            format!(
                r#"<section class="{class}">
<h2>Prediction Result</h2>
<p><strong>{message}</strong> - Probability: <strong>{percentage}</strong></p>
<progress value="{percent}" max="100">{percentage}</progress>
<p class="caption">Churn Probability: {percentage}</p>
</section>
"#,
                message = escape_html(&result.message),
                percentage = escape_html(&result.churn_percentage),
            )
        }
        Outcome::Error(message) => format!(
            r#"<section class="result error"><p>{}</p></section>
"#,
            escape_html(message)
        ),
    }
}

/// Renders the full page: model banner, form, and an optional result.
pub fn render_page(model: &ModelInfo, form: &CustomerForm, outcome: Option<Outcome<'_>>) -> String {
    let outcome = outcome.as_ref().map(render_outcome).unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Telco Churn Predictor</title>
<style>
body {{ font-family: sans-serif; max-width: 760px; margin: 2rem auto; }}
.columns {{ display: flex; gap: 2rem; }}
.column {{ flex: 1; display: flex; flex-direction: column; }}
label {{ margin-top: .6rem; }}
button {{ margin-top: 1.2rem; }}
.banner {{ color: #1b5e20; }}
.result {{ margin-top: 1.5rem; padding: 1rem; border-radius: 6px; }}
.high, .error {{ background: #fdecea; }}
.low {{ background: #e8f5e9; }}
progress {{ width: 100%; }}
</style>
</head>
<body>
<p class="banner">Model loaded: {model}</p>
<h1>Telco Customer Churn Predictor</h1>
<p>Predict whether a customer is likely to <strong>churn</strong> (leave) based on their profile and services.
Enter the details below and click <strong>Predict</strong>.</p>
{form}{outcome}</body>
</html>
"#,
        model = escape_html(&model.label()),
        form = render_form(form),
    )
}
