//! Read-only aggregate counter queries, plus the inserts used by tests and
//! the demo seeder. The ingest pipeline that populates these tables in
//! production lives outside this repository.

use super::SimStore;
use crate::action::NotificationChannel;
use crate::error::SimResult;
use crate::metrics::SeverityCounts;
use chrono::NaiveDate;
use rusqlite::params;
use std::collections::BTreeMap;

/// Windowed totals over `monitoring_rollup`.
#[derive(Debug, Clone, PartialEq)]
pub struct RollupTotals {
    pub alerts: SeverityCounts,
    pub incidents: u64,
    pub correlations: u64,
    pub notifications: u64,
    /// Mean of the per-day averages over days that have data; 0 otherwise.
    pub risk_score_avg: f64,
}

impl SimStore {
    pub fn monitoring_totals_since(
        &self,
        tenant_id: &str,
        since: NaiveDate,
    ) -> SimResult<RollupTotals> {
        let totals = self.conn().query_row(
            "SELECT COALESCE(SUM(alerts_critical), 0),
                    COALESCE(SUM(alerts_high), 0),
                    COALESCE(SUM(alerts_medium), 0),
                    COALESCE(SUM(alerts_low), 0),
                    COALESCE(SUM(incidents), 0),
                    COALESCE(SUM(correlations), 0),
                    COALESCE(SUM(notifications), 0),
                    COALESCE(AVG(risk_score_avg), 0)
             FROM monitoring_rollup WHERE tenant_id = ?1 AND day >= ?2",
            params![tenant_id, since.to_string()],
            |row| {
                Ok(RollupTotals {
                    alerts: SeverityCounts {
                        critical: row.get::<_, i64>(0)? as u64,
                        high: row.get::<_, i64>(1)? as u64,
                        medium: row.get::<_, i64>(2)? as u64,
                        low: row.get::<_, i64>(3)? as u64,
                    },
                    incidents: row.get::<_, i64>(4)? as u64,
                    correlations: row.get::<_, i64>(5)? as u64,
                    notifications: row.get::<_, i64>(6)? as u64,
                    risk_score_avg: row.get(7)?,
                })
            },
        )?;
        Ok(totals)
    }

    /// Per-channel notification totals. Empty when the tenant's exporter
    /// provides no channel breakdown.
    pub fn notification_totals_since(
        &self,
        tenant_id: &str,
        since: NaiveDate,
    ) -> SimResult<BTreeMap<NotificationChannel, u64>> {
        let mut stmt = self.conn().prepare(
            "SELECT channel, COALESCE(SUM(sent), 0)
             FROM notification_rollup WHERE tenant_id = ?1 AND day >= ?2
             GROUP BY channel ORDER BY channel",
        )?;
        let mut totals = BTreeMap::new();
        let rows = stmt.query_map(params![tenant_id, since.to_string()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?;
        for row in rows {
            let (channel, sent) = row?;
            // The schema CHECK constraint limits channel values; anything
            // else would be a hand-edited database and is skipped.
            if let Some(channel) = NotificationChannel::parse(&channel) {
                totals.insert(channel, sent);
            }
        }
        Ok(totals)
    }

    // ── Seeding (tests and the demo seeder only) ───────────────

    pub fn insert_monitoring_rollup(
        &self,
        tenant_id: &str,
        day: NaiveDate,
        alerts: SeverityCounts,
        incidents: u64,
        correlations: u64,
        notifications: u64,
        risk_score_avg: f64,
    ) -> SimResult<()> {
        self.conn().execute(
            "INSERT INTO monitoring_rollup (tenant_id, day, alerts_critical, alerts_high,
                                            alerts_medium, alerts_low, incidents,
                                            correlations, notifications, risk_score_avg)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(tenant_id, day) DO UPDATE SET
                 alerts_critical = excluded.alerts_critical,
                 alerts_high     = excluded.alerts_high,
                 alerts_medium   = excluded.alerts_medium,
                 alerts_low      = excluded.alerts_low,
                 incidents       = excluded.incidents,
                 correlations    = excluded.correlations,
                 notifications   = excluded.notifications,
                 risk_score_avg  = excluded.risk_score_avg",
            params![
                tenant_id,
                day.to_string(),
                alerts.critical as i64,
                alerts.high as i64,
                alerts.medium as i64,
                alerts.low as i64,
                incidents as i64,
                correlations as i64,
                notifications as i64,
                risk_score_avg,
            ],
        )?;
        Ok(())
    }

    pub fn insert_notification_rollup(
        &self,
        tenant_id: &str,
        day: NaiveDate,
        channel: NotificationChannel,
        sent: u64,
    ) -> SimResult<()> {
        self.conn().execute(
            "INSERT INTO notification_rollup (tenant_id, day, channel, sent)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(tenant_id, day, channel) DO UPDATE SET sent = excluded.sent",
            params![tenant_id, day.to_string(), channel.as_str(), sent as i64],
        )?;
        Ok(())
    }
}
