//! Metric identifiers and the dated-window request shared by metric streams

use super::StreamSettings;
use crate::config::parse_start_date;
use crate::error::{Error, Result};
use crate::pagination::{DateWindowPaginator, PageToken};
use crate::schema::{JsonSchema, Property};
use crate::types::{Context, StringMap};
use chrono::NaiveDate;
use tracing::warn;

/// Ratio and rate metrics
pub const MATH_METRICS: &[&str] = &[
    "sign_up_percentage",
    "advocate_pages_shown",
    "advocate_impressions",
    "widget_click_percentage",
    "advocacy_percentage",
    "sharing_rate",
    "click_rate",
    "total_sales_aov",
    "visit_percentage",
    "refunded_sales_percentage",
    "refunded_sales_aov",
    "average_order_value",
    "revenue_percentage",
    "total_first_time_sales_aov",
    "conversion_percentage",
];

/// Referred friend purchase metrics
pub const FRIEND_SALES_METRICS: &[&str] = &[
    "total_referred_sales_count",
    "total_referred_sales_sum",
    "talkable_sales_count",
    "talkable_sales_sum",
    "talkable_sales_with_talkable_coupon_count",
    "talkable_sales_with_talkable_coupon_sum",
    "talkable_sales_with_talkable_coupon_and_new_count",
    "talkable_sales_with_talkable_coupon_and_new_sum",
    "talkable_sales_with_talkable_coupon_and_not_new_count",
    "talkable_sales_with_talkable_coupon_and_not_new_sum",
    "referred_sales_new_count",
    "referred_sales_new_sum",
    "talkable_qualified_sales_count",
    "talkable_qualified_sales_sum",
    "ideal_friend_sales_count",
    "ideal_friend_sales_sum",
];

/// Advocate purchase metrics
pub const ADVOCATE_SALES_METRICS: &[&str] = &[
    "ideal_advocate_sales_new_customers_count",
    "ideal_advocate_sales_new_customers_sum",
    "ideal_advocate_sales_existing_customers_count",
    "ideal_advocate_sales_existing_customers_sum",
    "ideal_advocate_sales_count",
    "ideal_advocate_sales_sum",
];

/// Claiming, customer and email capture metrics
pub const PREDEFINED_METRICS: &[&str] = &[
    "offers",
    // Claiming
    "clicks",
    "clicks_unique",
    "first_time_clicks",
    "visits",
    "visits_unique",
    "first_time_visits",
    "email_gated",
    "emails_collected_on_claim",
    "email_gated_and_opted_in",
    "email_gated_and_opted_in_new",
    // Customers
    "customers",
    "new_customers",
    "visited_referrals",
    // Email capture
    "total_first_time_sales_count",
    "total_first_time_sales_sum",
];

/// Metric groups in request order
pub const METRIC_GROUPS: [&[&str]; 4] = [
    MATH_METRICS,
    FRIEND_SALES_METRICS,
    ADVOCATE_SALES_METRICS,
    PREDEFINED_METRICS,
];

/// Every metric identifier, in request order
pub fn metrics() -> impl Iterator<Item = &'static str> {
    METRIC_GROUPS.into_iter().flatten().copied()
}

/// `/metrics/{metric}/{action}` for the metric in `context`
pub(crate) fn metric_path(stream: &str, context: &Context, action: &str) -> Result<String> {
    let metric = context
        .get_str("metric")
        .ok_or_else(|| Error::missing_context(stream, "metric"))?;
    Ok(format!("/metrics/{metric}/{action}"))
}

/// First day of the next window
///
/// A date token wins; otherwise the partition bookmark, then the configured
/// start date.
pub(crate) fn window_start(
    stream: &str,
    settings: &StreamSettings,
    token: Option<&PageToken>,
    starting_value: Option<&str>,
) -> NaiveDate {
    if let Some(day) = token.and_then(PageToken::as_date) {
        return day;
    }
    match starting_value.map(parse_start_date) {
        Some(Ok(dt)) => dt.date_naive(),
        Some(Err(e)) => {
            warn!("Ignoring unreadable bookmark for {stream}: {e}");
            settings.start_date
        }
        None => settings.start_date,
    }
}

/// Query for one campaign metric over one dated window
pub(crate) fn window_params(
    stream: &str,
    settings: &StreamSettings,
    context: &Context,
    token: Option<&PageToken>,
    starting_value: Option<&str>,
    period_param: &str,
) -> Result<StringMap> {
    let campaign_id = context
        .get_param("campaign_id")
        .ok_or_else(|| Error::missing_context(stream, "campaign_id"))?;
    let window = DateWindowPaginator::new(settings.today).window(window_start(
        stream,
        settings,
        token,
        starting_value,
    ));

    let mut params = StringMap::new();
    params.insert("site_slug".to_string(), settings.site_slug.clone());
    params.insert("campaign_ids".to_string(), campaign_id);
    params.insert("start_date".to_string(), window.start_param());
    params.insert("end_date".to_string(), window.end_param());
    params.insert(period_param.to_string(), "day".to_string());
    Ok(params)
}

/// Properties common to both metric record shapes
pub(crate) fn metric_schema() -> JsonSchema {
    JsonSchema::new()
        .property("campaign_id", Property::number())
        .property("metric", Property::string())
        .property("plain", Property::number())
        .property("formatted", Property::string())
        .property("result_type", Property::string())
        .property("period", Property::string())
}
