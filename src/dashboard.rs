//! Refresh pipeline: client provider → loaders → views.
//!
//! All shared state (client handle, two caches, roster) lives in one
//! [`Dashboard`] that callers hold as `Arc<Dashboard>`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::activity::{ActivityLoader, ActivityRecord};
use crate::aggregate::{self, AreaView, BUILDING, CURING};
use crate::cache::{LoadOutcome, OutcomeStatus};
use crate::clock::{Clock, SystemClock};
use crate::config::{DashboardConfig, ServiceCredential};
use crate::kpi::{KpiLoader, KpiRecord};
use crate::recent::recent;
use crate::roster::OperatorRoster;
use crate::sheets::client::{ClientProvider, Connector};
use crate::sheets::google::ServiceAccountConnector;

/// Everything one refresh cycle produced.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub refreshed_at: DateTime<Utc>,
    /// Distinct Areas from the KPI table, first-seen order.
    pub areas: Vec<String>,
    pub kpi: LoadOutcome<KpiRecord>,
    pub activity: LoadOutcome<ActivityRecord>,
}

/// What the front-end needs to draw one selected Area.
#[derive(Debug, Clone, Serialize)]
pub struct AreaPanel {
    #[serde(flatten)]
    pub view: AreaView,
    pub recent_building: Vec<ActivityRecord>,
    pub recent_curing: Vec<ActivityRecord>,
    pub kpi_status: OutcomeStatus,
    pub activity_status: OutcomeStatus,
    /// Human-readable load problems, empty when both tables loaded.
    pub warnings: Vec<String>,
}

pub struct Dashboard {
    kpi: KpiLoader,
    activity: ActivityLoader,
    roster: OperatorRoster,
    recent_count: usize,
}

impl Dashboard {
    pub fn new(cfg: &DashboardConfig, connector: Arc<dyn Connector>, clock: Arc<dyn Clock>) -> Self {
        let client = Arc::new(ClientProvider::new(
            connector,
            Arc::clone(&clock),
            cfg.client_validity(),
        ));
        Self {
            kpi: KpiLoader::new(Arc::clone(&client), Arc::clone(&clock), cfg),
            activity: ActivityLoader::new(client, clock, cfg),
            roster: OperatorRoster::from_entries(&cfg.operators),
            recent_count: cfg.recent_count,
        }
    }

    /// Production wiring: Google Sheets via service account, wall clock.
    pub fn from_config(cfg: &DashboardConfig, credential: Option<ServiceCredential>) -> Self {
        let connector = ServiceAccountConnector::new(credential, cfg.http_timeout());
        Self::new(cfg, Arc::new(connector), Arc::new(SystemClock))
    }

    pub async fn load_kpi_table(&self) -> LoadOutcome<KpiRecord> {
        self.kpi.load().await
    }

    pub async fn load_activity_log(&self) -> LoadOutcome<ActivityRecord> {
        self.activity.load().await
    }

    pub async fn refresh(&self) -> DashboardSnapshot {
        let kpi = self.load_kpi_table().await;
        let activity = self.load_activity_log().await;
        DashboardSnapshot {
            refreshed_at: Utc::now(),
            areas: aggregate::areas(kpi.records()),
            kpi,
            activity,
        }
    }

    /// Aggregation view for `area` plus its recent Building/Curing scans.
    ///
    /// The activity log names its line column after the Area.
    pub async fn area_panel(&self, area: &str, count: Option<usize>) -> AreaPanel {
        let snap = self.refresh().await;
        let count = count.unwrap_or(self.recent_count);

        let mut view = aggregate::aggregate(snap.kpi.records(), area);
        view.attach_operators(&self.roster);

        let pick = |process: &str| -> Vec<ActivityRecord> {
            recent(snap.activity.records(), area, process, count)
                .into_iter()
                .cloned()
                .collect()
        };

        let warnings = [snap.kpi.error(), snap.activity.error()]
            .into_iter()
            .flatten()
            .map(ToString::to_string)
            .collect();

        AreaPanel {
            recent_building: pick(BUILDING),
            recent_curing: pick(CURING),
            view,
            kpi_status: snap.kpi.status(),
            activity_status: snap.activity.status(),
            warnings,
        }
    }

    pub async fn recent_activity(
        &self,
        line_name: &str,
        process: &str,
        count: Option<usize>,
    ) -> Vec<ActivityRecord> {
        let log = self.load_activity_log().await;
        recent(
            log.records(),
            line_name,
            process,
            count.unwrap_or(self.recent_count),
        )
        .into_iter()
        .cloned()
        .collect()
    }
}
