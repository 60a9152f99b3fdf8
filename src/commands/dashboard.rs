use crate::api::{self, Mode};
use crate::args::DashboardArgs;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::model::Overview;
use crate::render;
use crate::{Config, Result};

pub(crate) const NO_DASHBOARD_DATA: &str = "No data found for the selected filters";

/// Shows the headline figures for the records matching the filters.
pub async fn dashboard(config: &Config, mode: Mode, args: &DashboardArgs) -> Result<Out<Overview>> {
    let analyzer = api::analyzer(config, mode).pub_result(ErrorType::Fetch)?;
    let filters = args.filters().filters();
    let dashboard = analyzer
        .fetch_dashboard(&filters)
        .await
        .pub_result(ErrorType::Fetch)?;
    Ok(match dashboard {
        Some(dashboard) => Out::new(render::overview(&dashboard.overall), dashboard.overall),
        None => NO_DASHBOARD_DATA.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::FilterArgs;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_dashboard() {
        let env = TestEnv::new().await;
        let filters = FilterArgs::new(Some(1), Some(1), Some(1), None, None);
        let out = dashboard(&env.config(), Mode::Test, &DashboardArgs::new(filters))
            .await
            .unwrap();
        let lines: Vec<&str> = out.message().lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Total Collected: Ksh 11,652.00 (all-time collections)");
        assert_eq!(lines[1], "Avg Weekly Attendance: 83 (last 12 months average)");
        assert_eq!(lines[2], "Growth Rate: 0.0% (quarterly attendance trend)");
        assert_eq!(lines[3], "Banked Percentage: 82.5% (of total collections)");
        assert!(out.structure().is_some());
    }

    #[tokio::test]
    async fn test_dashboard_without_data() {
        let env = TestEnv::new().await;
        let filters = FilterArgs::new(Some(99), None, None, None, None);
        let out = dashboard(&env.config(), Mode::Test, &DashboardArgs::new(filters))
            .await
            .unwrap();
        assert_eq!(out.message(), NO_DASHBOARD_DATA);
        assert!(out.structure().is_none());
    }
}
